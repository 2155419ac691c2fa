//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when interacting with the GitHub API
//! through the github_client crate. Every error can be classified into an [`ErrorKind`] so
//! that callers can decide whether to treat it as an absent resource, retry it, or surface it.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Broad classification of a client error.
///
/// The reconciliation layer uses this to decide how a failed call is handled:
/// absent resources become empty collections, transient failures are retried
/// and permanent failures end the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The resource or sub-resource does not exist (HTTP 404).
    NotFound,
    /// Network failures, rate limiting, timeouts and server errors.
    Transient,
    /// Validation, permission and conflict failures. Retrying will not help.
    Permanent,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not-found"),
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust
/// use github_client::{Error, ErrorKind};
///
/// let err = Error::from_status(404, "Not Found");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
///
/// let err = Error::from_status(502, "Bad Gateway");
/// assert!(err.is_transient());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A GitHub API request failed with a status that has no more specific variant.
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Authentication or GitHub client initialization failure.
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// The request was rejected because the caller lacks the necessary permissions.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The request conflicts with the current state of the resource (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// GitHub rejected the request payload (HTTP 422).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The GitHub API returned a response the client could not interpret.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The request could not be constructed (bad URI, header or body).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The requested resource was not found.
    #[error("Resource not found")]
    NotFound,

    /// GitHub API rate limit has been exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// GitHub answered with a 5xx status.
    #[error("GitHub server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The request timed out before GitHub answered.
    #[error("Request timed out")]
    Timeout,

    /// The connection to GitHub failed.
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl Error {
    /// Builds an error from an HTTP status code and the message GitHub returned.
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            404 => Self::NotFound,
            408 => Self::Timeout,
            429 => Self::RateLimitExceeded,
            403 if message.to_ascii_lowercase().contains("rate limit") => Self::RateLimitExceeded,
            401 | 403 => Self::PermissionDenied(message.to_string()),
            409 => Self::Conflict(message.to_string()),
            422 => Self::ValidationFailed(message.to_string()),
            500..=599 => Self::ServerError {
                status,
                message: message.to_string(),
            },
            _ => Self::ApiError(format!("{status}: {message}")),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::RateLimitExceeded
            | Self::ServerError { .. }
            | Self::Timeout
            | Self::Transport(_) => ErrorKind::Transient,
            Self::ApiError(_)
            | Self::AuthError(_)
            | Self::PermissionDenied(_)
            | Self::Conflict(_)
            | Self::ValidationFailed(_)
            | Self::InvalidResponse(_)
            | Self::InvalidRequest(_) => ErrorKind::Permanent,
        }
    }

    /// Returns true if the error means the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns true if the failed call may succeed when retried.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}
