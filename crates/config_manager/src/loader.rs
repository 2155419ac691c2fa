//! Loading repository specifications from TOML.
//!
//! A specification is parsed, then validated with [`BasicConfigurationValidator`]. Any
//! validation error rejects the whole document before it can reach the reconciler.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    BasicConfigurationValidator, ConfigurationError, ConfigurationResult, ConfigurationValidator,
    RepositorySpec,
};

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

/// Parses and validates a repository specification from TOML text.
///
/// Validation warnings are logged; validation errors are returned as
/// [`ConfigurationError::ValidationFailed`].
///
/// # Examples
///
/// ```rust
/// use config_manager::loader::load_repository_spec;
///
/// let spec = load_repository_spec(r#"
///     name = "my-repo"
///     private = true
/// "#).unwrap();
///
/// assert_eq!(spec.private, Some(true));
/// ```
pub fn load_repository_spec(content: &str) -> ConfigurationResult<RepositorySpec> {
    let spec: RepositorySpec =
        toml::from_str(content).map_err(|e| ConfigurationError::ParseError {
            reason: e.to_string(),
        })?;

    let result = BasicConfigurationValidator::new().validate_repository_spec(&spec);

    for warning in &result.warnings {
        warn!(
            field = %warning.field_path,
            message = %warning.message,
            "Repository specification warning"
        );
    }

    if !result.is_valid() {
        for error in &result.errors {
            debug!(error = %error, "Repository specification error");
        }
        return Err(ConfigurationError::validation_failed(result.errors));
    }

    Ok(spec)
}

/// Reads, parses and validates a repository specification file.
///
/// # Errors
///
/// Returns `FileNotFound` when the file does not exist, `FileAccessError` when it
/// cannot be read, and the errors of [`load_repository_spec`] otherwise.
pub fn load_repository_spec_from_file(path: &Path) -> ConfigurationResult<RepositorySpec> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigurationError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => ConfigurationError::FileAccessError {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })?;

    let spec = load_repository_spec(&content)?;
    info!(
        path = %path.display(),
        repo = %spec.name,
        "Loaded repository specification"
    );
    Ok(spec)
}
