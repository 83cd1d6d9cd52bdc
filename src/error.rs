//! Common error types for the render gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Payload serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Render service request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Task queue is full ({0} pending tasks)")]
    QueueFull(usize),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Render service error: {0}")]
    BackendError(String),

    #[error("Failed to retrieve progress: {0}")]
    ProgressUnavailable(String),

    #[error("Render attempt timed out: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status, error type and optional machine-readable code
    fn classify(&self) -> (StatusCode, &'static str, Option<&'static str>) {
        match self {
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None)
            }
            AppError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                Some("serialization_failed"),
            ),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", None),
            AppError::QueueFull(_) => (StatusCode::SERVICE_UNAVAILABLE, "server_error", Some("queue_full")),
            AppError::TaskNotFound(_) => (StatusCode::NOT_FOUND, "not_found_error", Some("task_not_found")),
            AppError::HttpClient(_) | AppError::BackendError(_) => (
                StatusCode::BAD_GATEWAY,
                "render_service_error",
                Some("render_failed"),
            ),
            AppError::ProgressUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                "render_service_error",
                Some("progress_unavailable"),
            ),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error", None),
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_error",
                Some("rate_limit_exceeded"),
            ),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

/// JSON error body: `{"error": {"message", "type", "code"}}`
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code) = self.classify();
        let body = ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: error_type,
                code,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
