//! Repository rulesets and their rules, shaped like the `/rulesets` endpoints.
//!
//! Rule kinds this crate does not model are kept as raw JSON so that updating a
//! ruleset never silently drops them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[cfg(test)]
#[path = "ruleset_tests.rs"]
mod tests;

/// A ruleset, either read back from GitHub or about to be sent to it.
///
/// ```rust
/// use github_client::{RepositoryRuleset, RulesetEnforcement, RulesetTarget};
///
/// let draft = RepositoryRuleset {
///     id: None,
///     name: "release-tags".to_string(),
///     target: Some(RulesetTarget::Tag),
///     enforcement: RulesetEnforcement::Evaluate,
///     bypass_actors: Vec::new(),
///     conditions: None,
///     rules: Vec::new(),
///     source_type: None,
/// };
/// assert!(serde_json::to_value(&draft).unwrap().get("id").is_none());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RepositoryRuleset {
    /// Absent until GitHub has stored the ruleset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<RulesetTarget>,

    pub enforcement: RulesetEnforcement,

    #[serde(default)]
    pub bypass_actors: Vec<BypassActor>,

    /// Ref name patterns the ruleset covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RulesetConditions>,

    /// Empty in list responses; only the single-ruleset GET returns rules.
    #[serde(default)]
    pub rules: Vec<RulesetRule>,

    /// `Repository` or `Organization`. Never sent.
    #[serde(default, skip_serializing)]
    pub source_type: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RulesetTarget {
    Branch,
    Tag,
    Push,
}

impl RulesetTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Tag => "tag",
            Self::Push => "push",
        }
    }
}

impl FromStr for RulesetTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "branch" => Ok(Self::Branch),
            "tag" => Ok(Self::Tag),
            "push" => Ok(Self::Push),
            other => Err(format!("unknown ruleset target '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RulesetEnforcement {
    Disabled,
    Active,
    /// Violations are recorded but not blocked.
    Evaluate,
}

impl RulesetEnforcement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Active => "active",
            Self::Evaluate => "evaluate",
        }
    }
}

impl FromStr for RulesetEnforcement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "active" => Ok(Self::Active),
            "evaluate" => Ok(Self::Evaluate),
            other => Err(format!("unknown ruleset enforcement '{other}'")),
        }
    }
}

/// Someone allowed past a ruleset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BypassActor {
    /// Actor ID. GitHub reports `null` for organization admins.
    #[serde(default)]
    pub actor_id: Option<u64>,

    pub actor_type: BypassActorType,

    #[serde(default)]
    pub bypass_mode: BypassMode,
}

/// Kinds of bypass actor. For `RepositoryRole` the `actor_id` selects the role.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum BypassActorType {
    OrganizationAdmin,
    RepositoryRole,
    /// `actor_id` is the team id.
    Team,
    /// A GitHub App.
    Integration,
    DeployKey,
}

impl BypassActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrganizationAdmin => "OrganizationAdmin",
            Self::RepositoryRole => "RepositoryRole",
            Self::Team => "Team",
            Self::Integration => "Integration",
            Self::DeployKey => "DeployKey",
        }
    }
}

impl FromStr for BypassActorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "organizationadmin" => Ok(Self::OrganizationAdmin),
            "repositoryrole" => Ok(Self::RepositoryRole),
            "team" => Ok(Self::Team),
            "integration" => Ok(Self::Integration),
            "deploykey" => Ok(Self::DeployKey),
            _ => Err(format!("unknown bypass actor type '{s}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BypassMode {
    #[default]
    Always,
    /// Only through a pull request.
    PullRequest,
    /// Not evaluated at all, nothing is logged.
    Exempt,
}

impl BypassMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::PullRequest => "pull_request",
            Self::Exempt => "exempt",
        }
    }
}

impl FromStr for BypassMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "pull_request" => Ok(Self::PullRequest),
            "exempt" => Ok(Self::Exempt),
            other => Err(format!("unknown bypass mode '{other}'")),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulesetConditions {
    #[serde(default)]
    pub ref_name: RefNameCondition,
}

/// `fnmatch`-style ref patterns, plus `~DEFAULT_BRANCH` and `~ALL`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefNameCondition {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// An entry of a ruleset's rule list.
///
/// GitHub keeps adding rule types. Types this client does not model are kept
/// verbatim as [`RulesetRule::Other`] so they survive a read-modify-write cycle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RulesetRule {
    Known(Rule),
    Other(OtherRule),
}

impl RulesetRule {
    /// The rule's `type` discriminator as GitHub spells it.
    pub fn rule_type(&self) -> &str {
        match self {
            Self::Known(rule) => rule.rule_type(),
            Self::Other(other) => &other.rule_type,
        }
    }
}

/// A rule of a type this client does not model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OtherRule {
    #[serde(rename = "type")]
    pub rule_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// The rule types this client models.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    Creation,

    Update,

    Deletion,

    RequiredLinearHistory,

    RequiredSignatures,

    PullRequest {
        parameters: PullRequestParameters,
    },

    RequiredStatusChecks {
        parameters: RequiredStatusChecksParameters,
    },

    /// Blocks force pushes.
    NonFastForward,
}

impl Rule {
    pub fn rule_type(&self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Update => "update",
            Self::Deletion => "deletion",
            Self::RequiredLinearHistory => "required_linear_history",
            Self::RequiredSignatures => "required_signatures",
            Self::PullRequest { .. } => "pull_request",
            Self::RequiredStatusChecks { .. } => "required_status_checks",
            Self::NonFastForward => "non_fast_forward",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_stale_reviews_on_push: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_code_owner_review: Option<bool>,

    /// The last pusher cannot approve their own push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_last_push_approval: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_approving_review_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_review_thread_resolution: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequiredStatusChecksParameters {
    #[serde(default)]
    pub required_status_checks: Vec<RulesetStatusCheck>,

    /// Branches must be up to date with the base before merging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_required_status_checks_policy: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulesetStatusCheck {
    pub context: String,

    /// Pins the check to one GitHub App.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<u64>,
}
