//! S3O gate error types.
//!
//! `AuthError` is the single taxonomy the gate translates into responses.
//! Every variant maps to a fixed HTTP status via `status_code()` and to a
//! one-line plain-text body via its `Display` impl. Internal details are
//! logged server-side, never returned to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure to verify an identity assertion.
///
/// Maps to HTTP status codes:
/// - BadToken, KeyUnavailable, VerificationFailed: 403 Forbidden
/// - Internal: 500 Internal Server Error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is not valid base64.
    #[error("failed to decode auth token")]
    BadToken,

    /// No public key has been fetched from the authority yet.
    #[error("public s3o key unavailable")]
    KeyUnavailable,

    /// The signature does not match the username and host.
    #[error("failed to authenticate")]
    VerificationFailed,

    /// A local failure unrelated to the untrusted input.
    #[error("internal error")]
    Internal(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::BadToken | AuthError::KeyUnavailable | AuthError::VerificationFailed => {
                StatusCode::FORBIDDEN
            }
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Bounded label used for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::BadToken => "bad_token",
            AuthError::KeyUnavailable => "key_unavailable",
            AuthError::VerificationFailed => "verification_failed",
            AuthError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            // Log actual error server-side, return generic message to client
            tracing::error!(target: "s3o.errors", error = %detail, "Internal gate failure");
        }

        (self.status_code(), self.to_string()).into_response()
    }
}

/// Failure to obtain the authority's public key.
///
/// The refresh loop treats every variant the same way: the previous key
/// stays in place and the next attempt happens after the usual period.
#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("failed to read s3o public key: {0}")]
    Request(String),

    #[error("failed to read s3o public key: status {0}")]
    Status(u16),

    #[error("failed to base64 decode s3o public key: {0}")]
    Decode(String),

    #[error("failed to parse s3o public key: {0}")]
    Parse(String),
}

impl KeyFetchError {
    /// Bounded label used for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            KeyFetchError::Request(_) => "request",
            KeyFetchError::Status(_) => "status",
            KeyFetchError::Decode(_) => "decode",
            KeyFetchError::Parse(_) => "parse",
        }
    }
}
