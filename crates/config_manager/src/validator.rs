//! Validation findings for repository specifications.
//!
//! A validator walks the whole document and collects every finding instead of
//! stopping at the first one, so a user can fix a spec in one go. Errors make a
//! spec malformed; warnings are only reported.
//!
//! ```rust
//! use config_manager::{ValidationError, ValidationErrorType, ValidationResult};
//!
//! let mut result = ValidationResult::new();
//! result.push_error(ValidationError {
//!     error_type: ValidationErrorType::DuplicateIdentity,
//!     field_path: "permissions.users[1].user".to_string(),
//!     message: "User 'octocat' is listed more than once".to_string(),
//!     suggestion: None,
//! });
//!
//! assert!(!result.is_valid());
//! assert_eq!(
//!     result.summary(),
//!     "permissions.users[1].user: User 'octocat' is listed more than once (DuplicateIdentity)"
//! );
//! ```

use std::fmt;

use crate::settings::RepositorySpec;

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

/// Findings of one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A spec is valid when nothing blocks it; warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn push_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn extend_errors(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = ValidationWarning>) {
        self.warnings.extend(warnings);
    }

    /// All errors on one line, separated by `; `.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A finding that makes a spec malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub error_type: ValidationErrorType,
    /// Location in the document, e.g. `webhooks[0].url`.
    pub field_path: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field_path, self.message, self.error_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorType {
    /// A value has the wrong shape for its field, such as an unparsable URL.
    SchemaViolation,
    /// A name or identity is missing or blank.
    RequiredFieldMissing,
    /// A value is outside the accepted set, such as an unknown enforcement level.
    InvalidValue,
    /// Two entries of a keyed collection fold to the same identity.
    DuplicateIdentity,
}

impl ValidationErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaViolation => "SchemaViolation",
            Self::RequiredFieldMissing => "RequiredFieldMissing",
            Self::InvalidValue => "InvalidValue",
            Self::DuplicateIdentity => "DuplicateIdentity",
        }
    }
}

impl fmt::Display for ValidationErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finding worth reporting that does not block reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub field_path: String,
    pub message: String,
    pub recommendation: Option<String>,
}

/// Checks a repository specification before it is reconciled.
pub trait ConfigurationValidator: Send + Sync {
    fn validate_repository_spec(&self, spec: &RepositorySpec) -> ValidationResult;
}
