//! Repository specification root and permission settings.
//!
//! The [`RepositorySpec`] is the desired state of a single repository: its scalar
//! fields plus the permission, webhook, branch protection and ruleset collections.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{BranchProtectionRuleConfig, RulesetConfig, WebhookConfig};

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// Desired state of a repository.
///
/// Scalar fields left out of the document stay `None` and are not managed: whatever
/// the platform reports for them is accepted.
///
/// # Examples
///
/// ```toml
/// name = "my-repo"
/// description = "Managed repository"
/// private = true
///
/// [[permissions.teams]]
/// team = "platform"
/// role = "admin"
///
/// [[webhooks]]
/// url = "https://example.org/webhook"
/// content_type = "json"
/// events = ["push"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RepositorySpec {
    /// Repository name within the owning organization
    pub name: String,

    /// Repository description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the repository is archived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,

    /// Whether the repository is private
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    /// Whether the repository is a template repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,

    /// User and team access grants
    #[serde(default)]
    pub permissions: PermissionsConfig,

    /// Repository webhooks
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,

    /// Classic branch protection rules, one per branch
    #[serde(default)]
    pub branch_protection_rules: Vec<BranchProtectionRuleConfig>,

    /// Repository rulesets
    #[serde(default)]
    pub rulesets: Vec<RulesetConfig>,
}

/// User and team access grants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PermissionsConfig {
    #[serde(default)]
    pub users: Vec<UserPermissionConfig>,

    #[serde(default)]
    pub teams: Vec<TeamPermissionConfig>,
}

/// Access granted to a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserPermissionConfig {
    /// User login
    pub user: String,
    pub role: Role,
}

/// Access granted to a team of the owning organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TeamPermissionConfig {
    /// Team slug
    pub team: String,
    pub role: Role,
}

/// Repository role, ordered from least to most privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pull,
    Triage,
    Push,
    Maintain,
    Admin,
}

impl Role {
    /// The permission name GitHub uses for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Triage => "triage",
            Self::Push => "push",
            Self::Maintain => "maintain",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Parses a permission name. `read` and `write` are the names GitHub reports
    /// in `role_name` for `pull` and `push`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pull" | "read" => Ok(Self::Pull),
            "triage" => Ok(Self::Triage),
            "push" | "write" => Ok(Self::Push),
            "maintain" => Ok(Self::Maintain),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("unknown repository role '{s}'")),
        }
    }
}
