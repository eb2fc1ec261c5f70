//! Domain error types

use thiserror::Error;

/// Raised when a request descriptor or the client settings are unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A base URL or joined request URL does not parse, or is not http(s).
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The per-call timeout is zero.
    #[error("timeout must be at least one second")]
    ZeroTimeout,

    /// A caller-supplied header name is not a valid HTTP token.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// A caller-supplied header value contains control characters.
    #[error("invalid value for header {0}")]
    InvalidHeaderValue(String),

    /// The method is not one the API uses.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
