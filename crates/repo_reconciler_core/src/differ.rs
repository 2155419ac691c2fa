//! Attribute comparison of matched entries.
//!
//! Only attributes the desired side manages are compared: an unset desired
//! setting accepts whatever the platform reports. Collections inside an
//! attribute are compared as sets.

use std::collections::BTreeSet;

use crate::state::{
    NormalizedBranchProtection, NormalizedRuleset, NormalizedWebhook, PermissionEntry,
    PullRequestReviews, RepositoryFields, StatusChecks,
};

#[cfg(test)]
#[path = "differ_tests.rs"]
mod tests;

/// The outcome of comparing a desired entry with its observed counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDiff {
    Equivalent,
    /// The names of the attributes that differ.
    Changed(BTreeSet<&'static str>),
}

impl FieldDiff {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Self::Equivalent)
    }
}

/// Compares a desired value (`self`) with an observed one.
pub trait AttributeDiff {
    fn diff(&self, observed: &Self) -> FieldDiff;
}

#[derive(Default)]
struct Changes(BTreeSet<&'static str>);

impl Changes {
    fn check(&mut self, field: &'static str, accepted: bool) -> &mut Self {
        if !accepted {
            self.0.insert(field);
        }
        self
    }

    fn finish(&mut self) -> FieldDiff {
        if self.0.is_empty() {
            FieldDiff::Equivalent
        } else {
            FieldDiff::Changed(std::mem::take(&mut self.0))
        }
    }
}

impl AttributeDiff for RepositoryFields {
    fn diff(&self, observed: &Self) -> FieldDiff {
        Changes::default()
            .check("description", self.description.accepts(&observed.description))
            .check("archived", self.archived.accepts(&observed.archived))
            .check("private", self.private.accepts(&observed.private))
            .check("is_template", self.is_template.accepts(&observed.is_template))
            .finish()
    }
}

impl AttributeDiff for PermissionEntry {
    fn diff(&self, observed: &Self) -> FieldDiff {
        Changes::default()
            .check("role", self.role == observed.role)
            .finish()
    }
}

impl AttributeDiff for NormalizedWebhook {
    fn diff(&self, observed: &Self) -> FieldDiff {
        Changes::default()
            .check("content_type", self.content_type.accepts(&observed.content_type))
            .check("active", self.active.accepts(&observed.active))
            .check("insecure_ssl", self.insecure_ssl.accepts(&observed.insecure_ssl))
            .check("events", self.events.accepts(&observed.events))
            .finish()
    }
}

impl AttributeDiff for NormalizedBranchProtection {
    fn diff(&self, observed: &Self) -> FieldDiff {
        Changes::default()
            .check("enforce_admins", self.enforce_admins.accepts(&observed.enforce_admins))
            .check(
                "required_linear_history",
                self.required_linear_history
                    .accepts(&observed.required_linear_history),
            )
            .check(
                "allow_force_pushes",
                self.allow_force_pushes.accepts(&observed.allow_force_pushes),
            )
            .check(
                "allow_deletions",
                self.allow_deletions.accepts(&observed.allow_deletions),
            )
            .check(
                "required_conversation_resolution",
                self.required_conversation_resolution
                    .accepts(&observed.required_conversation_resolution),
            )
            .check("lock_branch", self.lock_branch.accepts(&observed.lock_branch))
            .check(
                "allow_fork_syncing",
                self.allow_fork_syncing.accepts(&observed.allow_fork_syncing),
            )
            .check(
                "required_signatures",
                self.required_signatures.accepts(&observed.required_signatures),
            )
            .check(
                "required_status_checks",
                self.required_status_checks
                    .accepts_with(&observed.required_status_checks, |d, o| {
                        nested_accepts(d, o, status_checks_accept)
                    }),
            )
            .check(
                "restrictions",
                self.restrictions.accepts(&observed.restrictions),
            )
            .check(
                "required_pull_request_reviews",
                self.required_pull_request_reviews
                    .accepts_with(&observed.required_pull_request_reviews, |d, o| {
                        nested_accepts(d, o, reviews_accept)
                    }),
            )
            .finish()
    }
}

impl AttributeDiff for NormalizedRuleset {
    fn diff(&self, observed: &Self) -> FieldDiff {
        let mut changes = Changes::default();
        changes
            .check("target", self.target.accepts(&observed.target))
            .check("enforcement", self.enforcement.accepts(&observed.enforcement))
            .check("conditions.ref_name.include", self.include.accepts(&observed.include))
            .check("conditions.ref_name.exclude", self.exclude.accepts(&observed.exclude))
            .check(
                "bypass_actors",
                self.bypass_actors.accepts(&observed.bypass_actors),
            );

        for ((rule, desired), (_, observed)) in
            self.rules.entries().into_iter().zip(observed.rules.entries())
        {
            changes.check(rule, desired.accepts(observed));
        }

        changes.finish()
    }
}

/// Compares explicitly managed optional objects: both absent, or both present
/// and accepted by `accept`.
fn nested_accepts<T>(
    desired: &Option<T>,
    observed: &Option<T>,
    accept: fn(&T, &T) -> bool,
) -> bool {
    match (desired, observed) {
        (None, None) => true,
        (Some(desired), Some(observed)) => accept(desired, observed),
        _ => false,
    }
}

fn status_checks_accept(desired: &StatusChecks, observed: &StatusChecks) -> bool {
    desired.strict.accepts(&observed.strict)
        && desired.checks.keys().eq(observed.checks.keys())
        && desired.checks.iter().all(|(context, app_id)| {
            observed
                .checks
                .get(context)
                .is_some_and(|observed| app_id.accepts(observed))
        })
}

fn reviews_accept(desired: &PullRequestReviews, observed: &PullRequestReviews) -> bool {
    desired
        .dismissal_restrictions
        .accepts(&observed.dismissal_restrictions)
        && desired
            .bypass_pull_request_allowances
            .accepts(&observed.bypass_pull_request_allowances)
        && desired.dismiss_stale_reviews.accepts(&observed.dismiss_stale_reviews)
        && desired
            .require_code_owner_reviews
            .accepts(&observed.require_code_owner_reviews)
        && desired
            .required_approving_review_count
            .accepts(&observed.required_approving_review_count)
        && desired
            .require_last_push_approval
            .accepts(&observed.require_last_push_approval)
}
