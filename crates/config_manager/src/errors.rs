//! Errors raised while turning a document into a [`RepositorySpec`].
//!
//! [`RepositorySpec`]: crate::RepositorySpec

use thiserror::Error;

use crate::validator::ValidationError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("No repository spec at {path}")]
    FileNotFound { path: String },

    #[error("Cannot read repository spec at {path}: {reason}")]
    FileAccessError { path: String, reason: String },

    #[error("Repository spec is not valid TOML: {reason}")]
    ParseError { reason: String },

    #[error("Cannot generate the repository spec schema: {reason}")]
    SchemaGeneration { reason: String },

    /// The document parsed but describes an impossible repository.
    #[error("Repository spec has {error_count} validation error(s)")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<ValidationError>,
    },
}

impl ConfigurationError {
    pub fn validation_failed(errors: Vec<ValidationError>) -> Self {
        Self::ValidationFailed {
            error_count: errors.len(),
            errors,
        }
    }

    /// The individual findings behind a `ValidationFailed`; empty otherwise.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::ValidationFailed { errors, .. } => errors,
            _ => &[],
        }
    }
}

pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
