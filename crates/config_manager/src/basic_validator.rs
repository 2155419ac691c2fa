//! Basic implementation of repository specification validation.
//!
//! Provides validation including:
//! - Required fields and identity keys
//! - Duplicate identities within keyed collections (compared case-insensitively)
//! - Allowed values for enumerated string fields
//! - Webhook URL format, with a warning for plain HTTP
//!
//! # Examples
//!
//! ```rust
//! use config_manager::{BasicConfigurationValidator, ConfigurationValidator, RepositorySpec};
//!
//! let validator = BasicConfigurationValidator::new();
//! let spec = RepositorySpec {
//!     name: "my-repo".to_string(),
//!     ..Default::default()
//! };
//!
//! let result = validator.validate_repository_spec(&spec);
//!
//! if !result.is_valid() {
//!     for error in &result.errors {
//!         eprintln!("Validation error: {} - {}", error.field_path, error.message);
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use github_client::{BypassActorType, BypassMode, RulesetEnforcement, RulesetTarget};
use tracing::debug;

use crate::{
    identity::fold_identity,
    settings::{
        BranchProtectionRuleConfig, PermissionsConfig, RepositorySpec, RulesetConfig,
        WebhookConfig,
    },
    validator::{
        ConfigurationValidator, ValidationError, ValidationErrorType, ValidationResult,
        ValidationWarning,
    },
};

#[cfg(test)]
#[path = "basic_validator_tests.rs"]
mod tests;

/// Highest review count GitHub accepts for classic branch protection.
const MAX_APPROVING_REVIEW_COUNT: u32 = 6;

/// Basic implementation of repository specification validation.
///
/// # Examples
///
/// ```rust
/// use config_manager::BasicConfigurationValidator;
///
/// let validator = BasicConfigurationValidator::new();
/// // Use validator to validate specifications...
/// ```
pub struct BasicConfigurationValidator;

impl BasicConfigurationValidator {
    /// Create a new basic configuration validator.
    pub fn new() -> Self {
        Self
    }

    // ========================================================================
    // Identity Helpers
    // ========================================================================

    /// Reports every entry whose identity key repeats an earlier entry's key, or is empty.
    ///
    /// Keys are compared by [`fold_identity`], the same fold the reconciler matches by.
    fn validate_identities<'a, I>(
        &self,
        keys: I,
        path: &str,
        field: &str,
        what: &str,
    ) -> Vec<ValidationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut errors = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (index, key) in keys.into_iter().enumerate() {
            let normalized = fold_identity(key);
            let field_path = format!("{}[{}].{}", path, index, field);

            if normalized.is_empty() {
                errors.push(ValidationError {
                    error_type: ValidationErrorType::RequiredFieldMissing,
                    field_path,
                    message: format!("{} {} cannot be empty", what, field),
                    suggestion: None,
                });
                continue;
            }

            if let Some(first) = seen.get(&normalized) {
                errors.push(ValidationError {
                    error_type: ValidationErrorType::DuplicateIdentity,
                    field_path,
                    message: format!(
                        "{} '{}' is already declared at {}[{}]",
                        what,
                        key.trim(),
                        path,
                        first
                    ),
                    suggestion: Some(format!("Keep a single entry per {}", what.to_lowercase())),
                });
            } else {
                seen.insert(normalized, index);
            }
        }

        errors
    }

    // ========================================================================
    // Schema Validation Helpers
    // ========================================================================

    /// Validate repository scalar fields.
    fn validate_repository_fields(&self, spec: &RepositorySpec) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if spec.name.trim().is_empty() {
            errors.push(ValidationError {
                error_type: ValidationErrorType::RequiredFieldMissing,
                field_path: "name".to_string(),
                message: "Repository name cannot be empty".to_string(),
                suggestion: Some("Set name to the repository name".to_string()),
            });
        } else if !spec
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            errors.push(ValidationError {
                error_type: ValidationErrorType::InvalidValue,
                field_path: "name".to_string(),
                message: format!("Invalid repository name: {}", spec.name),
                suggestion: Some(
                    "Use only ASCII letters, digits, '-', '_' and '.'".to_string(),
                ),
            });
        }

        errors
    }

    /// Validate user and team permissions.
    fn validate_permissions(&self, permissions: &PermissionsConfig) -> Vec<ValidationError> {
        let mut errors = self.validate_identities(
            permissions.users.iter().map(|u| u.user.as_str()),
            "permissions.users",
            "user",
            "User",
        );
        errors.extend(self.validate_identities(
            permissions.teams.iter().map(|t| t.team.as_str()),
            "permissions.teams",
            "team",
            "Team",
        ));
        errors
    }

    /// Validate webhook configurations.
    fn validate_webhooks(&self, webhooks: &[WebhookConfig]) -> Vec<ValidationError> {
        let mut errors = self.validate_identities(
            webhooks.iter().map(|w| w.url.as_str()),
            "webhooks",
            "url",
            "Webhook",
        );

        for (index, webhook) in webhooks.iter().enumerate() {
            if !webhook.url.trim().is_empty() {
                let valid = url::Url::parse(webhook.url.trim())
                    .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
                    .unwrap_or(false);
                if !valid {
                    errors.push(ValidationError {
                        error_type: ValidationErrorType::InvalidValue,
                        field_path: format!("webhooks[{}].url", index),
                        message: format!("Invalid webhook URL format: {}", webhook.url),
                        suggestion: Some("URL must start with http:// or https://".to_string()),
                    });
                }
            }

            if let Some(content_type) = &webhook.content_type {
                if !matches!(content_type.as_str(), "json" | "form") {
                    errors.push(ValidationError {
                        error_type: ValidationErrorType::InvalidValue,
                        field_path: format!("webhooks[{}].content_type", index),
                        message: format!("Unsupported content type: {}", content_type),
                        suggestion: Some("Use 'json' or 'form'".to_string()),
                    });
                }
            }

            if let Some(events) = &webhook.events {
                if events.is_empty() {
                    errors.push(ValidationError {
                        error_type: ValidationErrorType::SchemaViolation,
                        field_path: format!("webhooks[{}].events", index),
                        message: "Webhook must have at least one event".to_string(),
                        suggestion: Some(
                            "Add at least one event like 'push', or leave events out".to_string(),
                        ),
                    });
                }
            }
        }

        errors
    }

    /// Validate branch protection rules.
    fn validate_branch_protection(
        &self,
        rules: &[BranchProtectionRuleConfig],
    ) -> Vec<ValidationError> {
        let mut errors = self.validate_identities(
            rules.iter().map(|r| r.branch.as_str()),
            "branch_protection_rules",
            "branch",
            "Branch",
        );

        for (index, rule) in rules.iter().enumerate() {
            if let Some(checks) = &rule.required_status_checks {
                errors.extend(self.validate_identities(
                    checks.checks.iter().map(|c| c.context.as_str()),
                    &format!("branch_protection_rules[{}].required_status_checks.checks", index),
                    "context",
                    "Status check",
                ));
            }

            if let Some(reviews) = &rule.required_pull_request_reviews {
                if let Some(count) = reviews.required_approving_review_count {
                    if count > MAX_APPROVING_REVIEW_COUNT {
                        errors.push(ValidationError {
                            error_type: ValidationErrorType::InvalidValue,
                            field_path: format!(
                                "branch_protection_rules[{}].required_pull_request_reviews.required_approving_review_count",
                                index
                            ),
                            message: format!(
                                "Review count must be between 0 and {}, got: {}",
                                MAX_APPROVING_REVIEW_COUNT, count
                            ),
                            suggestion: None,
                        });
                    }
                }
            }
        }

        errors
    }

    /// Validate rulesets.
    fn validate_rulesets(&self, rulesets: &[RulesetConfig]) -> Vec<ValidationError> {
        let mut errors = self.validate_identities(
            rulesets.iter().map(|r| r.name.as_str()),
            "rulesets",
            "name",
            "Ruleset",
        );

        for (index, ruleset) in rulesets.iter().enumerate() {
            if let Some(target) = &ruleset.target {
                if let Err(message) = RulesetTarget::from_str(target) {
                    errors.push(invalid_value(
                        format!("rulesets[{}].target", index),
                        message,
                        "Use 'branch', 'tag' or 'push'",
                    ));
                }
            }

            if let Some(enforcement) = &ruleset.enforcement {
                if let Err(message) = RulesetEnforcement::from_str(enforcement) {
                    errors.push(invalid_value(
                        format!("rulesets[{}].enforcement", index),
                        message,
                        "Use 'active', 'disabled' or 'evaluate'",
                    ));
                }
            }

            for (actor_index, actor) in ruleset.bypass_actors.iter().flatten().enumerate() {
                let path = format!("rulesets[{}].bypass_actors[{}]", index, actor_index);

                match BypassActorType::from_str(&actor.actor_type) {
                    Ok(actor_type) => {
                        let needs_id = !matches!(
                            actor_type,
                            BypassActorType::OrganizationAdmin | BypassActorType::DeployKey
                        );
                        if needs_id && actor.actor_id.is_none() {
                            errors.push(ValidationError {
                                error_type: ValidationErrorType::RequiredFieldMissing,
                                field_path: format!("{}.actor_id", path),
                                message: format!(
                                    "Bypass actors of type {} need an actor_id",
                                    actor_type.as_str()
                                ),
                                suggestion: None,
                            });
                        }
                    }
                    Err(message) => errors.push(invalid_value(
                        format!("{}.actor_type", path),
                        message,
                        "Use OrganizationAdmin, RepositoryRole, Team, Integration or DeployKey",
                    )),
                }

                if let Some(mode) = &actor.bypass_mode {
                    if let Err(message) = BypassMode::from_str(mode) {
                        errors.push(invalid_value(
                            format!("{}.bypass_mode", path),
                            message,
                            "Use 'always', 'pull_request' or 'exempt'",
                        ));
                    }
                }
            }
        }

        errors
    }

    /// Generate warnings for webhook URLs using HTTP instead of HTTPS.
    fn validate_webhook_urls(&self, webhooks: &[WebhookConfig]) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (index, webhook) in webhooks.iter().enumerate() {
            if webhook.url.trim().to_lowercase().starts_with("http://") {
                warnings.push(ValidationWarning {
                    field_path: format!("webhooks[{}].url", index),
                    message: "Webhook URL uses HTTP instead of HTTPS".to_string(),
                    recommendation: Some(
                        "Use HTTPS for secure webhook delivery to prevent data interception"
                            .to_string(),
                    ),
                });
            }

            if webhook.insecure_ssl == Some(true) {
                warnings.push(ValidationWarning {
                    field_path: format!("webhooks[{}].insecure_ssl", index),
                    message: "Webhook deliveries skip TLS certificate verification".to_string(),
                    recommendation: None,
                });
            }
        }

        warnings
    }
}

fn invalid_value(field_path: String, message: String, suggestion: &str) -> ValidationError {
    ValidationError {
        error_type: ValidationErrorType::InvalidValue,
        field_path,
        message,
        suggestion: Some(suggestion.to_string()),
    }
}

impl Default for BasicConfigurationValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationValidator for BasicConfigurationValidator {
    fn validate_repository_spec(&self, spec: &RepositorySpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.extend_errors(self.validate_repository_fields(spec));
        result.extend_errors(self.validate_permissions(&spec.permissions));
        result.extend_errors(self.validate_webhooks(&spec.webhooks));
        result.extend_errors(self.validate_branch_protection(&spec.branch_protection_rules));
        result.extend_errors(self.validate_rulesets(&spec.rulesets));
        result.extend_warnings(self.validate_webhook_urls(&spec.webhooks));

        debug!(
            repo = %spec.name,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated repository specification"
        );

        result
    }
}
