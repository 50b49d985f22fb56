use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::deploy::{DeploymentOptions, Platform};
use crate::generator::ValidationResult;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub platform: Platform,
    pub display_name: &'static str,
    pub regions: &'static [&'static str],
    pub default_region: &'static str,
    pub required_env: Vec<&'static str>,
    pub optional_env: Vec<&'static str>,
}

pub async fn list_platforms(State(state): State<Arc<AppState>>) -> Json<Vec<PlatformInfo>> {
    let platforms = state
        .orchestrator
        .registry()
        .list()
        .into_iter()
        .map(|adapter| PlatformInfo {
            platform: adapter.platform(),
            display_name: adapter.display_name(),
            regions: adapter.regions(),
            default_region: adapter.default_region(),
            required_env: crate::deploy::adapter::COMMON_REQUIRED_ENV
                .iter()
                .chain(adapter.required_env())
                .copied()
                .collect(),
            optional_env: std::iter::once("JWT_SECRET")
                .chain(adapter.optional_env().iter().copied())
                .collect(),
        })
        .collect();
    Json(platforms)
}

/// Check deployment options for `platform`. The body is a deployment options
/// object; its own `platform` field, if any, is replaced by the path.
pub async fn validate_platform_config(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Json(mut body): Json<serde_json::Value>,
) -> Result<Json<ValidationResult>, ApiError> {
    let platform: Platform = platform.parse()?;
    let object = body
        .as_object_mut()
        .ok_or_else(|| ApiError::bad_request("Request body must be a JSON object"))?;
    object.insert("platform".to_string(), serde_json::json!(platform));
    let options: DeploymentOptions = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid deployment options: {}", e)))?;

    Ok(Json(state.orchestrator.validate_config(&options)?))
}
