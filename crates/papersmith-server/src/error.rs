//! Error handling for the API server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use papersmith::{RenderError, TemplateError};
use papersmith_registry::RegistryError;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;
use crate::models::ErrorBody;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to render document: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status and stable error code reported to clients
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Registry(e) => match e {
                RegistryError::TemplateAlreadyExists(_) => (StatusCode::BAD_REQUEST, "01"),
                RegistryError::TemplateNotFound(_) => (StatusCode::BAD_REQUEST, "02"),
                RegistryError::InvalidContent { .. } => (StatusCode::BAD_REQUEST, "03"),
                RegistryError::InvalidName { .. } => (StatusCode::BAD_REQUEST, "04"),
                RegistryError::BackendUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "05"),
            },
            ApiError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "04"),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "04"),
            ApiError::Template(_) | ApiError::Render(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "06")
            }
            ApiError::Config(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "99")
            }
        }
    }
}

/// Fallback for a known path requested with the wrong method
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Server-side details stay in the logs.
        let message = if status.is_server_error() {
            error!(code, error = %self, "Request failed");
            match &self {
                ApiError::Registry(_) => "template store unavailable".to_string(),
                ApiError::Template(_) | ApiError::Render(_) => "failed to render document".to_string(),
                _ => "internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                code: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}
