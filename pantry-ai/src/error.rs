//! HTTP boundary errors for pantry-ai
//!
//! Every layer below returns a typed error. This module maps each kind to a
//! status code so clients can tell malformed input, provider outages and
//! persistence failures apart.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pantry_common::auth::AuthError;
use serde_json::json;
use thiserror::Error;

use crate::orchestrator::OrchestrationError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or rejected credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upstream inference or auth provider failed (502)
    #[error("Upstream service error: {0}")]
    BadGateway(String),

    /// pantry-common error
    #[error("Common error: {0}")]
    Common(#[from] pantry_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Common(err) => match err {
                pantry_common::Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
                pantry_common::Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
                err @ pantry_common::Error::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    err.to_string(),
                ),
                err => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    err.to_string(),
                ),
            },
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::InvalidInput(msg) => ApiError::BadRequest(msg),
            OrchestrationError::Resource(e) => ApiError::BadRequest(e.to_string()),
            OrchestrationError::Inference(e) => ApiError::BadGateway(e.to_string()),
            e @ OrchestrationError::IterationLimit(_) => ApiError::BadGateway(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unavailable(msg) => ApiError::BadGateway(msg),
            e => ApiError::Unauthorized(e.to_string()),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
