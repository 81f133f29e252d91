//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use quill_core::error::QuillError;

/// API error type.
#[derive(Debug, Error)]
#[error("[{status}] {code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    // Common error constructors
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

fn suggestion_details(err: &QuillError) -> Option<serde_json::Value> {
    err.suggestion()
        .map(|s| serde_json::json!({ "suggestion": s }))
}

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        let code = err.code().as_str();
        let details = suggestion_details(&err);

        let api = match err {
            QuillError::NotFound { message, .. } => {
                ApiError::new(StatusCode::NOT_FOUND, code, message)
            }
            QuillError::Validation { message, .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, code, message)
            }
            QuillError::Authentication { message, .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, code, message)
            }
            QuillError::Llm { message, .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, code, format!("LLM error: {}", message))
            }
            QuillError::Trends { message, .. } => ApiError::new(
                StatusCode::BAD_GATEWAY,
                code,
                format!("Trends error: {}", message),
            ),
            QuillError::Database { message, .. } => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                format!("Database error: {}", message),
            ),
            QuillError::Configuration(msg) => ApiError::internal(msg),
            QuillError::Io(e) => ApiError::internal(format!("IO error: {}", e)),
            QuillError::Serialization(e) => {
                ApiError::internal(format!("Serialization error: {}", e))
            }
            QuillError::Internal(msg) => ApiError::internal(msg),
        };

        match details {
            Some(details) => api.with_details(details),
            None => api,
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
