use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Balance oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Swap failed on all venues. primary: {primary}; fallback: {fallback}")]
    SwapFailed { primary: String, fallback: String },

    #[error("Swap venue error: {0}")]
    Venue(String),

    #[error("Burn failed: {0}")]
    BurnFailed(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Webhook registrar error: {0}")]
    Registrar(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            PipelineError::ProjectNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            PipelineError::AlreadyRegistered(_) => (StatusCode::CONFLICT, self.to_string()),
            PipelineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            PipelineError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            PipelineError::OracleUnavailable(_) | PipelineError::LedgerUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
