mod deployments;
pub mod error;
mod platforms;
mod projects;

pub use deployments::DeployRequest;
pub use error::{ApiError, ErrorCode};
pub use platforms::PlatformInfo;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Projects
        .route("/projects/validate", post(projects::validate_project))
        .route("/projects/generate", post(projects::create_project))
        // Platforms
        .route("/platforms", get(platforms::list_platforms))
        .route("/platforms/:platform/validate", post(platforms::validate_platform_config))
        // Deployments
        .route(
            "/deployments",
            get(deployments::list_deployments).post(deployments::create_deployment),
        )
        .route(
            "/deployments/:id",
            get(deployments::get_deployment).delete(deployments::delete_deployment),
        )
        .route("/deployments/:id/logs", get(deployments::get_logs))
        .route("/deployments/:id/cancel", post(deployments::cancel_deployment));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
