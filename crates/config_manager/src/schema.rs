//! JSON Schema generation for repository specification documents.
//!
//! The schema is derived from the [`RepositorySpec`] types with `schemars`, so it
//! always matches what the loader accepts. Editors and the outer schema layer use it
//! to validate documents before they are handed to the reconciler.
//!
//! # Examples
//!
//! ```rust
//! use config_manager::schema::repository_spec_schema;
//!
//! let schema = repository_spec_schema().unwrap();
//! assert!(schema["properties"]["webhooks"].is_object());
//! ```

use schemars::schema_for;
use serde_json::Value;

use crate::{ConfigurationError, ConfigurationResult, RepositorySpec};

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

/// Generates the JSON schema of a repository specification document.
pub fn repository_spec_schema() -> ConfigurationResult<Value> {
    let schema = schema_for!(RepositorySpec);
    serde_json::to_value(&schema).map_err(|e| ConfigurationError::SchemaGeneration {
        reason: e.to_string(),
    })
}
