//! HTTP surface exercised in-process through the router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use stackforge::api::create_router;
use stackforge::config::Config;
use stackforge::AppState;

fn app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.deploy.time_scale = 0.0;
    let state = Arc::new(AppState::new(config));
    (create_router(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

fn todo_project() -> Value {
    json!({
        "name": "Todo API",
        "models": [{
            "name": "Todo",
            "fields": [
                { "name": "title", "type": "string", "required": true },
                { "name": "done", "type": "boolean" }
            ]
        }]
    })
}

#[tokio::test]
async fn health() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn validate_reports_issues_without_failing() {
    let (app, _) = app();
    let body = json!({ "name": "Bad", "models": [{ "name": "", "fields": [] }] });
    let (status, result) = send(&app, "POST", "/api/projects/validate", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["isValid"], false);
    assert!(!result["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn generate_returns_project() {
    let (app, _) = app();
    let (status, project) = send(&app, "POST", "/api/projects/generate", Some(todo_project())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["name"], "Todo API");
    assert!(project["files"].as_array().unwrap().len() > 10);
    assert_eq!(project["openapi"]["openapi"], "3.0.3");
}

#[tokio::test]
async fn generate_invalid_models_uses_error_envelope() {
    let (app, _) = app();
    let body = json!({ "name": "Bad", "models": [{ "name": "", "fields": [] }] });
    let (status, error) = send(&app, "POST", "/api/projects/generate", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "validation_error");
    assert!(error["error"]["details"].is_object());
}

#[tokio::test]
async fn platforms_are_listed() {
    let (app, _) = app();
    let (status, platforms) = send(&app, "GET", "/api/platforms", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = platforms
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["platform"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["vercel", "railway", "render", "fly", "heroku", "aws"]);
    assert_eq!(platforms[0]["requiredEnv"][0], "DATABASE_URL");
}

#[tokio::test]
async fn platform_config_validation() {
    let (app, _) = app();
    let body = json!({ "region": "nowhere", "environmentVariables": {} });
    let (status, result) = send(&app, "POST", "/api/platforms/fly/validate", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["isValid"], false);

    let (status, error) = send(&app, "POST", "/api/platforms/netlify/validate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "bad_request");
}

#[tokio::test]
async fn deployment_lifecycle() {
    let (app, state) = app();
    let body = json!({
        "project": todo_project(),
        "deployment": {
            "platform": "vercel",
            "environmentVariables": { "DATABASE_URL": "postgres://db/todo" }
        }
    });
    let (status, initial) = send(&app, "POST", "/api/deployments", Some(body)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(initial["status"], "pending");
    assert_eq!(initial["progress"], 0);
    let id = initial["id"].as_str().unwrap().to_string();

    state.orchestrator.wait_for_completion(&id).await.unwrap();

    let (status, done) = send(&app, "GET", &format!("/api/deployments/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "success");
    assert_eq!(done["progress"], 100);
    assert_eq!(done["url"], "https://todo-api.vercel.app");

    let (status, logs) = send(&app, "GET", &format!("/api/deployments/{}/logs", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!logs.as_array().unwrap().is_empty());

    let (status, listed) = send(&app, "GET", "/api/deployments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, cancelled) = send(&app, "POST", &format!("/api/deployments/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "success");

    let (status, _) = send(&app, "DELETE", &format!("/api/deployments/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, error) = send(&app, "GET", &format!("/api/deployments/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["code"], "not_found");
}

#[tokio::test]
async fn deployment_with_invalid_config_is_rejected() {
    let (app, _) = app();
    let body = json!({
        "project": todo_project(),
        "deployment": { "platform": "heroku" }
    });
    let (status, error) = send(&app, "POST", "/api/deployments", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], "validation_error");
    assert!(error["error"]["details"]["environmentVariables.DATABASE_URL"].is_array());
}
