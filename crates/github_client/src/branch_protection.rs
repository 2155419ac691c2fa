//! Branch and branch protection domain types.
//!
//! GitHub reads and writes branch protection in two different shapes: the
//! `GET .../protection` response wraps each toggle in an `{ "enabled": bool }`
//! object and lists principals as full user/team/app objects, while the
//! `PUT .../protection` request takes bare booleans and login/slug strings.
//! [`BranchProtection`] models the former, [`BranchProtectionRequest`] the latter.
//!
//! See: https://docs.github.com/en/rest/branches/branch-protection

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;

/// A branch as returned by `GET /repos/{owner}/{repo}/branches`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Branch {
    /// Branch name
    pub name: String,

    /// Whether the branch has protection configured
    #[serde(default)]
    pub protected: bool,
}

/// A toggle reported as `{ "enabled": bool }`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnabledSetting {
    #[serde(default)]
    pub enabled: bool,
}

/// A user reference inside a protection response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRef {
    pub login: String,
}

/// A team or app reference inside a protection response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SlugRef {
    pub slug: String,
}

/// Users, teams and apps named by a restriction or allowance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrincipalRefs {
    #[serde(default)]
    pub users: Vec<UserRef>,
    #[serde(default)]
    pub teams: Vec<SlugRef>,
    #[serde(default)]
    pub apps: Vec<SlugRef>,
}

/// A single required status check.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusCheck {
    /// Status check context
    pub context: String,

    /// App that must provide the check, if pinned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i64>,
}

/// Required status checks as reported by GitHub.
///
/// `contexts` is the legacy form of `checks`; GitHub fills both.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequiredStatusChecks {
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub contexts: Vec<String>,
    #[serde(default)]
    pub checks: Vec<StatusCheck>,
}

/// Pull request review enforcement as reported by GitHub.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PullRequestReviewEnforcement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissal_restrictions: Option<PrincipalRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_pull_request_allowances: Option<PrincipalRefs>,
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
    #[serde(default)]
    pub require_code_owner_reviews: bool,
    #[serde(default)]
    pub required_approving_review_count: u32,
    #[serde(default)]
    pub require_last_push_approval: bool,
}

/// Branch protection for a single branch, from `GET .../branches/{branch}/protection`.
///
/// # Examples
///
/// ```rust
/// use github_client::BranchProtection;
///
/// let protection: BranchProtection = serde_json::from_str(r#"{
///     "enforce_admins": { "enabled": true },
///     "required_linear_history": { "enabled": false }
/// }"#).unwrap();
///
/// assert!(protection.enforce_admins.unwrap().enabled);
/// assert!(protection.restrictions.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchProtection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_status_checks: Option<RequiredStatusChecks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_admins: Option<EnabledSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_pull_request_reviews: Option<PullRequestReviewEnforcement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<PrincipalRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_linear_history: Option<EnabledSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_force_pushes: Option<EnabledSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_deletions: Option<EnabledSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_conversation_resolution: Option<EnabledSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_branch: Option<EnabledSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_fork_syncing: Option<EnabledSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_signatures: Option<EnabledSetting>,
}

/// Users, teams and apps named in a protection request, by login or slug.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PrincipalNames {
    pub users: Vec<String>,
    pub teams: Vec<String>,
    pub apps: Vec<String>,
}

/// Required status checks in a protection request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RequiredStatusChecksRequest {
    pub strict: bool,
    pub checks: Vec<StatusCheck>,
}

/// Pull request review enforcement in a protection request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PullRequestReviewsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissal_restrictions: Option<PrincipalNames>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_pull_request_allowances: Option<PrincipalNames>,
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub required_approving_review_count: u32,
    pub require_last_push_approval: bool,
}

/// Request body for `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// GitHub replaces the whole protection with this body, and requires
/// `required_status_checks`, `enforce_admins`, `required_pull_request_reviews`
/// and `restrictions` to be present (possibly `null`). Signed commits are not
/// part of this body; [`RepositoryClient::update_branch_protection`] applies
/// `required_signatures` through its dedicated endpoint.
///
/// [`RepositoryClient::update_branch_protection`]: crate::RepositoryClient::update_branch_protection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BranchProtectionRequest {
    pub required_status_checks: Option<RequiredStatusChecksRequest>,
    pub enforce_admins: Option<bool>,
    pub required_pull_request_reviews: Option<PullRequestReviewsRequest>,
    pub restrictions: Option<PrincipalNames>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_linear_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_force_pushes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_deletions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_conversation_resolution: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_branch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_fork_syncing: Option<bool>,
    #[serde(skip)]
    pub required_signatures: Option<bool>,
}
