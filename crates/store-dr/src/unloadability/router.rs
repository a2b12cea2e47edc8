use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::json;
use tracing::warn;

use super::domain::{EvaluationRequest, EvaluationResponse};
use super::policy::PolicyConfig;
use super::UnloadabilityEngine;
use crate::error::AppError;

pub const APP_NAME: &str = "store-dr-unloadability";
pub const MODEL_VERSION: &str = "demo-heuristic-001";

/// Router builder exposing the evaluation API under `/api/v1`.
pub fn unloadability_router(engine: Arc<UnloadabilityEngine>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/version", get(version_handler))
        .route("/api/v1/evaluate", post(evaluate_handler))
        .route("/api/v1/policy", get(policy_handler))
        .route("/api/v1/policy/validate", post(validate_policy_handler))
        .with_state(engine)
}

pub(crate) async fn health_handler() -> Json<serde_json::Value> {
    let ts = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
    Json(json!({ "ok": true, "ts": ts }))
}

pub(crate) async fn version_handler() -> Json<serde_json::Value> {
    Json(json!({
        "app": APP_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "model_version": MODEL_VERSION,
    }))
}

pub(crate) async fn evaluate_handler(
    State(engine): State<Arc<UnloadabilityEngine>>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluationResponse>, AppError> {
    let store_id = request.store_id.clone();
    let response = engine.evaluate(request).map_err(|error| {
        warn!(%store_id, %error, "evaluation rejected");
        AppError::from(error)
    })?;
    Ok(Json(response))
}

pub(crate) async fn policy_handler(State(engine): State<Arc<UnloadabilityEngine>>) -> Response {
    (StatusCode::OK, Json(engine.policy().clone())).into_response()
}

/// Dry-run validation of a YAML policy document posted as the raw body.
pub(crate) async fn validate_policy_handler(body: String) -> Json<serde_json::Value> {
    match PolicyConfig::from_yaml_str(&body) {
        Ok(_) => Json(json!({ "ok": true, "message": "YAML OK" })),
        Err(error) => Json(json!({ "ok": false, "message": format!("Invalid YAML: {error}") })),
    }
}
