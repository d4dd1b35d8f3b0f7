//! Application error type mapped to structured JSON responses.
//!
//! Every failure crossing the HTTP boundary is one of these variants; nothing
//! panics past a handler. The body shape is
//! `{"error": "<kind>", "message": "<human text>"}` with the class carried by
//! the status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Caller error: missing or malformed parameter (400).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown resource id (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Write rejected by current state, e.g. double booking (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Data source unreachable or errored (500). The message is the public
    /// wording; the underlying cause is logged at the call site.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        AppError::Upstream(msg.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::InvalidRequest(m) => (StatusCode::BAD_REQUEST, "invalid_request", m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m),
            AppError::Upstream(m) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream_failure", m),
        };
        (status, Json(ErrorBody { error: kind, message })).into_response()
    }
}
