//! Client error types

use practicum_domain::DomainError;
use serde_json::Value;
use thiserror::Error;

use crate::ports::{TokenStoreError, TransportError};

/// Why a call ended in an authentication failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// The refresh call failed or returned an unusable body.
    #[error("token refresh failed: {message}")]
    RefreshFailed {
        /// What went wrong with the refresh call
        message: String,
    },

    /// A 401 was received and no refresh token was stored.
    #[error("session expired and no refresh token is available")]
    MissingRefreshToken,

    /// The retry after a successful refresh was rejected again.
    #[error("request rejected after token refresh")]
    RejectedAfterRefresh,

    /// The session was ended while the request waited for a refresh.
    #[error("session ended while waiting for token refresh")]
    SessionEnded,
}

/// Errors surfaced by the authenticated client.
///
/// Every failure the client cannot resolve itself reaches the caller as one
/// of these variants.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure or timeout. Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Non-2xx response, passed through unchanged.
    #[error("HTTP {status}: {}", message_or_status(body, *status))]
    Http {
        /// Response status code
        status: u16,
        /// Parsed response body
        body: Value,
    },

    /// Authentication could not be recovered; the session was logged out.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthFailure),

    /// The request descriptor or base URL was invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] DomainError),

    /// The token store failed.
    #[error("token store error: {0}")]
    Storage(#[from] TokenStoreError),

    /// A JSON body could not be encoded or did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(String),
}

impl ApiError {
    /// Returns the HTTP status for `Http` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `body.message` of an `Http` error when the backend sent one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } => body_message(body),
            _ => None,
        }
    }

    /// Returns true if this is an authentication failure.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns true if this is a transport failure.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

fn body_message(body: &Value) -> Option<&str> {
    match body {
        Value::Object(map) => map.get("message").and_then(Value::as_str),
        Value::String(text) if !text.is_empty() => Some(text.as_str()),
        _ => None,
    }
}

fn message_or_status(body: &Value, status: u16) -> String {
    body_message(body).map_or_else(|| format!("status {status}"), str::to_string)
}

/// Result type alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_http_error_exposes_backend_message() {
        let error = ApiError::Http {
            status: 409,
            body: json!({"message": "Team is full"}),
        };
        assert_eq!(error.status(), Some(409));
        assert_eq!(error.message(), Some("Team is full"));
        assert_eq!(error.to_string(), "HTTP 409: Team is full");
    }

    #[test]
    fn test_http_error_without_message() {
        let error = ApiError::Http {
            status: 500,
            body: Value::Null,
        };
        assert_eq!(error.message(), None);
        assert_eq!(error.to_string(), "HTTP 500: status 500");
    }

    #[test]
    fn test_auth_failure_classification() {
        let error = ApiError::from(AuthFailure::MissingRefreshToken);
        assert!(error.is_auth());
        assert!(!error.is_transport());
        assert_eq!(error.status(), None);
    }
}
