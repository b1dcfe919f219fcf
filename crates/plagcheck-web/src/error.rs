use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use plagcheck_core::{CheckError, ConfigError};

use crate::models::ErrorResponse;

/// Handler error rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request body.
    BadRequest(String),
    Check(CheckError),
}

impl From<CheckError> for ApiError {
    fn from(e: CheckError) -> Self {
        ApiError::Check(e)
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        ApiError::Check(CheckError::Config(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Check(e) if e.is_input_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Check(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
