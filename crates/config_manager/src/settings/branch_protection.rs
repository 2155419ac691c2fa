//! Branch protection settings.
//!
//! Classic branch protection, one rule per branch. Every toggle is optional: a toggle
//! left out is not managed, which is different from setting it to `false`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Protection rule for a single branch.
///
/// # Examples
///
/// ```toml
/// [[branch_protection_rules]]
/// branch = "main"
/// enforce_admins = true
/// required_linear_history = true
/// allow_force_pushes = false
///
/// [branch_protection_rules.required_status_checks]
/// strict = true
/// checks = [{ context = "terraform_validate" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BranchProtectionRuleConfig {
    /// Name of the protected branch
    pub branch: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_admins: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_linear_history: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_force_pushes: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_deletions: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_conversation_resolution: Option<bool>,

    /// Make the branch read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_branch: Option<bool>,

    /// Allow forks to sync a locked branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_fork_syncing: Option<bool>,

    /// Require signed commits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_signatures: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status_checks: Option<StatusChecksConfig>,

    /// Who may push to the branch. An empty list set removes the restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<AccessListConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_pull_request_reviews: Option<PullRequestReviewsConfig>,
}

/// Required status checks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct StatusChecksConfig {
    /// Require branches to be up to date before merging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,

    #[serde(default)]
    pub checks: Vec<StatusCheckConfig>,
}

/// A required status check, identified by its context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusCheckConfig {
    pub context: String,

    /// App that must provide the check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i64>,
}

/// Users, teams and apps, by login or slug.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct AccessListConfig {
    #[serde(default)]
    pub users: Vec<String>,

    #[serde(default)]
    pub teams: Vec<String>,

    #[serde(default)]
    pub apps: Vec<String>,
}

impl AccessListConfig {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.teams.is_empty() && self.apps.is_empty()
    }
}

/// Pull request review enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PullRequestReviewsConfig {
    /// Who may dismiss reviews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissal_restrictions: Option<AccessListConfig>,

    /// Who may merge without the required reviews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_pull_request_allowances: Option<AccessListConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_stale_reviews: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_code_owner_reviews: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_approving_review_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_last_push_approval: Option<bool>,
}

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;
