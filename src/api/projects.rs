use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::error::ApiError;
use crate::generator::{generate_project, ProjectRequest, ValidationResult};
use crate::ir::GeneratedProject;
use crate::AppState;

/// Validate a project without generating it. Always 200; the body says
/// whether the models are valid.
pub async fn validate_project(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProjectRequest>,
) -> Json<ValidationResult> {
    let input = request.into_input(&state.config.generation);
    Json(input.validate())
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProjectRequest>,
) -> Result<(StatusCode, Json<GeneratedProject>), ApiError> {
    let input = request.into_input(&state.config.generation);
    let project = generate_project(&input)?;
    tracing::info!(
        project_id = %project.id,
        files = project.files.len(),
        endpoints = project.endpoints.len(),
        "Project generated"
    );
    Ok((StatusCode::CREATED, Json(project)))
}
