//! Normalized repository state.
//!
//! Desired and observed repositories are both converted into the types of this
//! module before they are compared. Identity fields are folded into an
//! [`IdentityKey`], collections that are sets on the platform are stored as sets,
//! and every optional setting is a [`Setting`], which keeps "not managed" apart
//! from an explicit `false`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use config_manager::{fold_identity, Role};
use github_client::{BypassActorType, BypassMode, RulesetEnforcement, RulesetRule, RulesetTarget};

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

/// A setting that is either left to the platform or explicitly managed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Setting<T> {
    /// Not managed. Any observed value is accepted.
    #[default]
    Unset,
    /// Managed with this value.
    Explicit(T),
}

impl<T> Setting<T> {
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Unset => None,
            Self::Explicit(value) => Some(value),
        }
    }

    /// Returns whether the observed setting satisfies this desired one, using
    /// `same` to compare two explicit values.
    pub fn accepts_with(&self, observed: &Self, same: impl Fn(&T, &T) -> bool) -> bool {
        match (self, observed) {
            (Self::Unset, _) => true,
            (Self::Explicit(_), Self::Unset) => false,
            (Self::Explicit(desired), Self::Explicit(observed)) => same(desired, observed),
        }
    }

    /// The desired value when managed, otherwise the observed one.
    pub fn or_observed<'a>(&'a self, observed: Option<&'a Self>) -> Option<&'a T> {
        self.as_option()
            .or_else(|| observed.and_then(Setting::as_option))
    }
}

impl<T: PartialEq> Setting<T> {
    pub fn accepts(&self, observed: &Self) -> bool {
        self.accepts_with(observed, |d, o| d == o)
    }
}

impl<T> From<Option<T>> for Setting<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Explicit(value),
            None => Self::Unset,
        }
    }
}

/// The case-folded identity of an entry in a keyed collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(identity: &str) -> Self {
        Self(fold_identity(identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An entry of a collection that is matched by identity.
pub trait Keyed {
    fn key(&self) -> &IdentityKey;
}

/// A set of principal names compared by identity key.
///
/// The spelling of the first occurrence is kept for requests; equality ignores
/// case and order.
#[derive(Debug, Clone, Default)]
pub struct NameSet(BTreeMap<IdentityKey, String>);

impl NameSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The names as spelled in the source, ordered by identity key.
    pub fn names(&self) -> Vec<String> {
        self.0.values().cloned().collect()
    }
}

impl PartialEq for NameSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.keys().eq(other.0.keys())
    }
}

impl Eq for NameSet {}

impl<S: AsRef<str>> FromIterator<S> for NameSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names = BTreeMap::new();
        for name in iter {
            let name = name.as_ref();
            names
                .entry(IdentityKey::new(name))
                .or_insert_with(|| name.to_string());
        }
        Self(names)
    }
}

/// Users, teams and apps named by a restriction or allowance list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalSet {
    pub users: NameSet,
    pub teams: NameSet,
    pub apps: NameSet,
}

impl PrincipalSet {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.teams.is_empty() && self.apps.is_empty()
    }

    /// Collapses an empty list to `None`, the form the platform reports for
    /// "no restriction".
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// The sub-resource categories, in the order they are compared and planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Repository,
    Users,
    Teams,
    Webhooks,
    BranchProtection,
    Rulesets,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::Users => "user permissions",
            Self::Teams => "team permissions",
            Self::Webhooks => "webhooks",
            Self::BranchProtection => "branch protection",
            Self::Rulesets => "rulesets",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scalar fields of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryFields {
    pub description: Setting<String>,
    pub archived: Setting<bool>,
    pub private: Setting<bool>,
    pub is_template: Setting<bool>,
}

/// The role a grant carries.
///
/// Desired grants always name a base role. The platform can also report custom
/// organization roles, or no usable role at all; those are kept so that a
/// desired grant for the same principal diffs as a role change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantedRole {
    Base(Role),
    /// The platform's role name, if it reported one.
    Unrecognized(Option<String>),
}

impl GrantedRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Base(role) => role.as_str(),
            Self::Unrecognized(Some(name)) => name,
            Self::Unrecognized(None) => "unknown",
        }
    }
}

impl From<Role> for GrantedRole {
    fn from(role: Role) -> Self {
        Self::Base(role)
    }
}

impl PartialEq<Role> for GrantedRole {
    fn eq(&self, other: &Role) -> bool {
        matches!(self, Self::Base(role) if role == other)
    }
}

impl fmt::Display for GrantedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user or team grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEntry {
    pub key: IdentityKey,
    /// Login or slug as spelled in the source.
    pub name: String,
    pub role: GrantedRole,
}

impl PermissionEntry {
    pub fn new(name: &str, role: Role) -> Self {
        Self::with_role(name, GrantedRole::Base(role))
    }

    pub fn with_role(name: &str, role: GrantedRole) -> Self {
        Self {
            key: IdentityKey::new(name),
            name: name.to_string(),
            role,
        }
    }
}

impl Keyed for PermissionEntry {
    fn key(&self) -> &IdentityKey {
        &self.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedWebhook {
    pub key: IdentityKey,
    pub url: String,
    /// Assigned by the platform; `None` on the desired side.
    pub id: Option<u64>,
    pub content_type: Setting<String>,
    pub active: Setting<bool>,
    pub insecure_ssl: Setting<bool>,
    pub events: Setting<BTreeSet<String>>,
    /// Sent on writes, never compared. The platform masks it on reads.
    pub secret: Option<String>,
}

impl Keyed for NormalizedWebhook {
    fn key(&self) -> &IdentityKey {
        &self.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChecks {
    pub strict: Setting<bool>,
    /// Check context to the app that must report it.
    pub checks: BTreeMap<String, Setting<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestReviews {
    pub dismissal_restrictions: Setting<Option<PrincipalSet>>,
    pub bypass_pull_request_allowances: Setting<Option<PrincipalSet>>,
    pub dismiss_stale_reviews: Setting<bool>,
    pub require_code_owner_reviews: Setting<bool>,
    pub required_approving_review_count: Setting<u32>,
    pub require_last_push_approval: Setting<bool>,
}

/// Branch protection, keyed by branch name.
///
/// The nested objects are `Setting<Option<_>>`: unset, explicitly absent, or
/// explicitly present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBranchProtection {
    pub key: IdentityKey,
    pub branch: String,
    pub enforce_admins: Setting<bool>,
    pub required_linear_history: Setting<bool>,
    pub allow_force_pushes: Setting<bool>,
    pub allow_deletions: Setting<bool>,
    pub required_conversation_resolution: Setting<bool>,
    pub lock_branch: Setting<bool>,
    pub allow_fork_syncing: Setting<bool>,
    pub required_signatures: Setting<bool>,
    pub required_status_checks: Setting<Option<StatusChecks>>,
    pub restrictions: Setting<Option<PrincipalSet>>,
    pub required_pull_request_reviews: Setting<Option<PullRequestReviews>>,
}

impl NormalizedBranchProtection {
    /// A rule for `branch` that manages nothing.
    pub fn unmanaged(branch: &str) -> Self {
        Self {
            key: IdentityKey::new(branch),
            branch: branch.to_string(),
            enforce_admins: Setting::Unset,
            required_linear_history: Setting::Unset,
            allow_force_pushes: Setting::Unset,
            allow_deletions: Setting::Unset,
            required_conversation_resolution: Setting::Unset,
            lock_branch: Setting::Unset,
            allow_fork_syncing: Setting::Unset,
            required_signatures: Setting::Unset,
            required_status_checks: Setting::Unset,
            restrictions: Setting::Unset,
            required_pull_request_reviews: Setting::Unset,
        }
    }
}

impl Keyed for NormalizedBranchProtection {
    fn key(&self) -> &IdentityKey {
        &self.key
    }
}

/// An actor allowed to bypass a ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BypassEntry {
    pub actor_id: Option<u64>,
    pub actor_type: BypassActorType,
    pub bypass_mode: BypassMode,
}

impl BypassEntry {
    fn sort_key(&self) -> (Option<u64>, &'static str, &'static str) {
        (
            self.actor_id,
            self.actor_type.as_str(),
            self.bypass_mode.as_str(),
        )
    }
}

impl PartialOrd for BypassEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BypassEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// The boolean rules of a ruleset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleToggles {
    pub creation: Setting<bool>,
    pub deletion: Setting<bool>,
    pub update: Setting<bool>,
    pub required_linear_history: Setting<bool>,
    pub required_signatures: Setting<bool>,
    pub non_fast_forward: Setting<bool>,
}

impl RuleToggles {
    /// Rule type names paired with their toggles.
    pub fn entries(&self) -> [(&'static str, &Setting<bool>); 6] {
        [
            ("creation", &self.creation),
            ("deletion", &self.deletion),
            ("update", &self.update),
            ("required_linear_history", &self.required_linear_history),
            ("required_signatures", &self.required_signatures),
            ("non_fast_forward", &self.non_fast_forward),
        ]
    }

    /// The toggle for a rule type, if the type is one of the boolean rules.
    pub fn toggle_mut(&mut self, rule_type: &str) -> Option<&mut Setting<bool>> {
        match rule_type {
            "creation" => Some(&mut self.creation),
            "deletion" => Some(&mut self.deletion),
            "update" => Some(&mut self.update),
            "required_linear_history" => Some(&mut self.required_linear_history),
            "required_signatures" => Some(&mut self.required_signatures),
            "non_fast_forward" => Some(&mut self.non_fast_forward),
            _ => None,
        }
    }
}

/// A ruleset, keyed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRuleset {
    pub key: IdentityKey,
    pub name: String,
    /// Assigned by the platform; never part of the identity.
    pub id: Option<u64>,
    pub target: Setting<RulesetTarget>,
    pub enforcement: Setting<RulesetEnforcement>,
    pub include: Setting<BTreeSet<String>>,
    pub exclude: Setting<BTreeSet<String>>,
    pub bypass_actors: Setting<BTreeSet<BypassEntry>>,
    pub rules: RuleToggles,
    /// Observed rules without a toggle. Kept on writes, never compared.
    pub other_rules: Vec<RulesetRule>,
}

impl Keyed for NormalizedRuleset {
    fn key(&self) -> &IdentityKey {
        &self.key
    }
}

/// A repository with all of its managed sub-resources, ready for comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRepository {
    pub name: String,
    pub fields: RepositoryFields,
    pub users: Vec<PermissionEntry>,
    pub teams: Vec<PermissionEntry>,
    pub webhooks: Vec<NormalizedWebhook>,
    pub branch_protections: Vec<NormalizedBranchProtection>,
    pub rulesets: Vec<NormalizedRuleset>,
    /// Branches that exist remotely. Empty on the desired side.
    pub existing_branches: BTreeSet<IdentityKey>,
}
