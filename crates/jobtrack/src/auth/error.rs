//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Authentication errors.
///
/// An absent or expired session is not an error: it resolves to
/// [`Session::Anonymous`](super::Session::Anonymous).
#[derive(Debug, Error)]
pub enum AuthError {
    /// No gated session attached to the request.
    #[error("no session attached to request")]
    MissingSession,

    /// Invalid token.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token expired.
    #[error("token expired")]
    TokenExpired,

    /// The identity provider could not be consulted.
    #[error("session resolution failed: {0}")]
    ResolutionFailed(String),

    /// Internal error.
    #[error("internal auth error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AuthError::MissingSession => (StatusCode::UNAUTHORIZED, "missing_session"),
            AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired"),
            AuthError::ResolutionFailed(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "resolution_failed")
            }
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(AuthErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::MissingSession;
        assert_eq!(err.to_string(), "no session attached to request");

        let err = AuthError::ResolutionFailed("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "session resolution failed: connection refused"
        );
    }

    #[test]
    fn test_auth_error_status() {
        let response = AuthError::MissingSession.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::ResolutionFailed("down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
