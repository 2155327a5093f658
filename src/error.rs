use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::llm::LlmError;
use crate::pdf::ExtractError;

/// Failure of a request, as reported to the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing request data.
    #[error("{0}")]
    Input(String),

    /// The referenced collection does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request body exceeded the configured upload limit.
    #[error("{0}")]
    TooLarge(String),

    /// The vector store or the LLM API failed.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn upstream(err: anyhow::Error) -> Self {
        AppError::Upstream(format!("{err:#}"))
    }

    pub fn internal(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::Input(err.to_string())
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), %detail, "request failed");
        } else {
            warn!(status = status.as_u16(), %detail, "request rejected");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
