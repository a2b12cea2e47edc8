use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::unloadability::{CabinetImportError, EvaluationError, PolicyError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Policy(PolicyError),
    Evaluation(EvaluationError),
    Import(CabinetImportError),
    Serialization(serde_json::Error),
    Submission { url: String, message: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Policy(err) => write!(f, "policy error: {}", err),
            AppError::Evaluation(err) => write!(f, "evaluation rejected: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Serialization(err) => write!(f, "serialization error: {}", err),
            AppError::Submission { url, message } => {
                write!(f, "submission to {} failed: {}", url, message)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Policy(err) => Some(err),
            AppError::Evaluation(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Serialization(err) => Some(err),
            AppError::Submission { .. } => None,
        }
    }
}

impl AppError {
    /// Which half of the evaluation contract was violated, if any.
    fn kind(&self) -> Option<&'static str> {
        match self {
            AppError::Evaluation(EvaluationError::Input(_)) => Some("input"),
            AppError::Evaluation(EvaluationError::Policy(_)) => Some("configuration"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Import(_) | AppError::Serialization(_) | AppError::Policy(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Submission { .. } => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut body = json!({ "error": self.to_string() });
        if let Some(kind) = self.kind() {
            body["kind"] = json!(kind);
        }
        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<PolicyError> for AppError {
    fn from(value: PolicyError) -> Self {
        Self::Policy(value)
    }
}

impl From<EvaluationError> for AppError {
    fn from(value: EvaluationError) -> Self {
        Self::Evaluation(value)
    }
}

impl From<CabinetImportError> for AppError {
    fn from(value: CabinetImportError) -> Self {
        Self::Import(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
