use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::deploy::{DeploymentOptions, DeploymentStatus, LogEntry};
use crate::generator::{generate_project, ProjectRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DeployRequest {
    pub project: ProjectRequest,
    pub deployment: DeploymentOptions,
}

/// Generate the project and start a simulated rollout. Answers 202 with the
/// initial `pending` status.
pub async fn create_deployment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeployRequest>,
) -> Result<(StatusCode, Json<DeploymentStatus>), ApiError> {
    let input = request.project.into_input(&state.config.generation);
    let project = generate_project(&input)?;
    let status = state.orchestrator.deploy(&project, request.deployment)?;
    Ok((StatusCode::ACCEPTED, Json(status)))
}

pub async fn list_deployments(State(state): State<Arc<AppState>>) -> Json<Vec<DeploymentStatus>> {
    Json(state.orchestrator.list())
}

pub async fn get_deployment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeploymentStatus>, ApiError> {
    Ok(Json(state.orchestrator.get_status(&id)?))
}

pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    Ok(Json(state.orchestrator.get_logs(&id)?))
}

pub async fn cancel_deployment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeploymentStatus>, ApiError> {
    Ok(Json(state.orchestrator.cancel(&id)?))
}

pub async fn delete_deployment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
