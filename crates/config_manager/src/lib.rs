//! Desired-state configuration for repository reconciliation.
//!
//! This crate defines the [`RepositorySpec`] document that declares how a repository
//! should look (scalar fields, permissions, webhooks, branch protection and rulesets),
//! loads it from TOML, validates it and generates its JSON schema.
//!
//! Optional fields are `Option`s throughout: a field left out of the document is not
//! managed, which is different from a field set to `false`.

// Configuration errors
pub mod errors;

// Specification types
pub mod settings;

// Loading and schema
pub mod loader;
pub mod schema;

// Configuration validation
pub mod basic_validator;
pub mod identity;
pub mod validator;

// Re-export for convenient access
pub use basic_validator::BasicConfigurationValidator;
pub use errors::{ConfigurationError, ConfigurationResult};
pub use identity::fold_identity;
pub use loader::{load_repository_spec, load_repository_spec_from_file};
pub use settings::{RepositorySpec, Role};
pub use validator::{
    ConfigurationValidator, ValidationError, ValidationErrorType, ValidationResult,
    ValidationWarning,
};
