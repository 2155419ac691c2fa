//! Desired-state setting types for a managed repository.
//!
//! This module contains the repository specification root and the types of its
//! sub-resource collections, as they appear in a TOML specification document.

pub mod branch_protection;
pub mod repository;
pub mod ruleset;
pub mod webhook;

// Re-export all types for convenient access
pub use branch_protection::{
    AccessListConfig, BranchProtectionRuleConfig, PullRequestReviewsConfig, StatusCheckConfig,
    StatusChecksConfig,
};
pub use repository::{
    PermissionsConfig, RepositorySpec, Role, TeamPermissionConfig, UserPermissionConfig,
};
pub use ruleset::{
    BypassActorConfig, RefNameConditionConfig, RulesConfig, RulesetConditionsConfig,
    RulesetConfig,
};
pub use webhook::WebhookConfig;
