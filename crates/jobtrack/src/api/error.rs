//! Errors produced behind the gate, rendered as JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// Failure while serving a request the gate allowed through.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No upstream is configured and no local route matched.
    #[error("No route for {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// The upstream application could not be reached.
    #[error("Upstream unavailable: {0}")]
    BadGateway(String),
}

impl ApiError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::BadGateway(msg.into())
    }

    /// HTTP status and machine-readable code.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::BadGateway(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        }
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        if status.is_server_error() {
            error!(error_code = code, "{}", self);
        } else {
            debug!(error_code = code, "{}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for handlers behind the gate.
pub type ApiResult<T> = Result<T, ApiError>;
