//! Repository ruleset configuration settings.
//!
//! Rules are expressed as named toggles rather than GitHub's list of typed rule
//! entries, which keeps the TOML flat and makes "not managed" expressible per rule.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "ruleset_tests.rs"]
mod tests;

/// Repository ruleset configuration.
///
/// A ruleset is identified by its name; the numeric id GitHub assigns is never part
/// of the configuration.
///
/// # Examples
///
/// ```toml
/// [[rulesets]]
/// name = "main-protection"
/// target = "branch"
/// enforcement = "active"
///
/// [rulesets.conditions.ref_name]
/// include = ["~DEFAULT_BRANCH"]
/// exclude = []
///
/// [[rulesets.bypass_actors]]
/// actor_id = 123
/// actor_type = "Team"
/// bypass_mode = "always"
///
/// [rulesets.rules]
/// deletion = true
/// non_fast_forward = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RulesetConfig {
    /// Ruleset name
    pub name: String,

    /// Target type: "branch", "tag" or "push"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Enforcement level: "active", "disabled", or "evaluate"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<String>,

    /// Conditions for when this ruleset applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RulesetConditionsConfig>,

    /// Actors who can bypass this ruleset. An empty list removes every bypass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_actors: Option<Vec<BypassActorConfig>>,

    /// Rules in this ruleset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RulesConfig>,
}

/// Actor who can bypass a ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BypassActorConfig {
    /// Actor ID. Left out for organization admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<u64>,

    /// Actor type: "OrganizationAdmin", "RepositoryRole", "Team", "Integration" or "DeployKey"
    pub actor_type: String,

    /// Bypass mode: "always", "pull_request" or "exempt". Defaults to "always".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_mode: Option<String>,
}

/// Conditions for when a ruleset applies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RulesetConditionsConfig {
    /// Reference name patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<RefNameConditionConfig>,
}

/// Reference name condition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RefNameConditionConfig {
    /// Patterns to include
    #[serde(default)]
    pub include: Vec<String>,

    /// Patterns to exclude
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Rule toggles.
///
/// `true` means the rule is part of the ruleset, `false` means it must not be, and a
/// rule left out is not managed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RulesConfig {
    /// Only allow users with bypass permission to create matching refs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<bool>,

    /// Only allow users with bypass permission to delete matching refs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion: Option<bool>,

    /// Only allow users with bypass permission to update matching refs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,

    /// Prevent merge commits from being pushed to matching refs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_linear_history: Option<bool>,

    /// Require signed commits on matching refs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_signatures: Option<bool>,

    /// Prevent force pushes to matching refs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_fast_forward: Option<bool>,
}
