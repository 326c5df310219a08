//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use identity_bridge::{ConfigurationError, DenialReason};

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// The caller is not a verified dual-registered identity
    #[error("Unauthorized: {0}")]
    Unauthorized(DenialReason),

    /// The gateway itself is broken
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Body sent with server errors; never carries the underlying detail
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // Bare 401 regardless of reason: the caller must not learn which stage failed
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED.into_response(),
            ApiError::Internal(_) => {
                let body = ErrorResponse {
                    error: "Internal server error".into(),
                    code: "INTERNAL_ERROR".into(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl From<ConfigurationError> for ApiError {
    fn from(err: ConfigurationError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
