//! Turning a change-set into an ordered list of remote operations.
//!
//! Ordering:
//!
//! 1. The scalar repository edit comes first. If it archives the repository it
//!    comes last instead, since an archived repository rejects every other write.
//! 2. Categories follow the comparison order: users, teams, webhooks, branch
//!    protection, rulesets. Within a category creates come before updates, and
//!    updates before deletes.
//! 3. Protection for a branch that does not exist yet is deferred to a later pass.
//! 4. A ruleset update needs the platform id of the observed ruleset; without one
//!    the ruleset is created instead.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, warn};

use crate::aggregator::{CategoryChanges, ChangeSet, Update};
use crate::state::{
    NormalizedBranchProtection, NormalizedRuleset, NormalizedWebhook, PermissionEntry,
    RepositoryFields,
};

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;

/// A single remote mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Creates the repository in an organization with its scalar fields.
    CreateRepository {
        name: String,
        fields: RepositoryFields,
    },
    /// Sets the explicit scalar fields.
    EditRepository {
        fields: RepositoryFields,
        changed: BTreeSet<&'static str>,
    },
    GrantUser(PermissionEntry),
    UpdateUser(PermissionEntry),
    RevokeUser(PermissionEntry),
    GrantTeam(PermissionEntry),
    UpdateTeam(PermissionEntry),
    RevokeTeam(PermissionEntry),
    CreateWebhook(NormalizedWebhook),
    UpdateWebhook {
        id: u64,
        desired: NormalizedWebhook,
        observed: NormalizedWebhook,
        changed: BTreeSet<&'static str>,
    },
    DeleteWebhook {
        id: u64,
        url: String,
    },
    ProtectBranch(NormalizedBranchProtection),
    UpdateBranchProtection {
        desired: NormalizedBranchProtection,
        observed: NormalizedBranchProtection,
        changed: BTreeSet<&'static str>,
    },
    UnprotectBranch {
        branch: String,
    },
    CreateRuleset(NormalizedRuleset),
    UpdateRuleset {
        id: u64,
        desired: NormalizedRuleset,
        observed: NormalizedRuleset,
        changed: BTreeSet<&'static str>,
    },
    DeleteRuleset {
        id: u64,
        name: String,
    },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateRepository { name, .. } => write!(f, "create repository {name}"),
            Self::EditRepository { changed, .. } => {
                write!(f, "edit repository ({})", join(changed))
            }
            Self::GrantUser(entry) => write!(f, "grant {} to user {}", entry.role, entry.name),
            Self::UpdateUser(entry) => {
                write!(f, "change role of user {} to {}", entry.name, entry.role)
            }
            Self::RevokeUser(entry) => write!(f, "remove user {}", entry.name),
            Self::GrantTeam(entry) => write!(f, "grant {} to team {}", entry.role, entry.name),
            Self::UpdateTeam(entry) => {
                write!(f, "change role of team {} to {}", entry.name, entry.role)
            }
            Self::RevokeTeam(entry) => write!(f, "remove team {}", entry.name),
            Self::CreateWebhook(webhook) => write!(f, "create webhook {}", webhook.url),
            Self::UpdateWebhook {
                id,
                desired,
                changed,
                ..
            } => write!(
                f,
                "update webhook {id} {} ({})",
                desired.url,
                join(changed)
            ),
            Self::DeleteWebhook { id, url } => write!(f, "delete webhook {id} {url}"),
            Self::ProtectBranch(rule) => write!(f, "protect branch {}", rule.branch),
            Self::UpdateBranchProtection {
                desired, changed, ..
            } => write!(
                f,
                "update protection of branch {} ({})",
                desired.branch,
                join(changed)
            ),
            Self::UnprotectBranch { branch } => write!(f, "remove protection of branch {branch}"),
            Self::CreateRuleset(ruleset) => write!(f, "create ruleset {}", ruleset.name),
            Self::UpdateRuleset {
                id,
                desired,
                changed,
                ..
            } => write!(
                f,
                "update ruleset {id} {} ({})",
                desired.name,
                join(changed)
            ),
            Self::DeleteRuleset { id, name } => write!(f, "delete ruleset {id} {name}"),
        }
    }
}

fn join(fields: &BTreeSet<&'static str>) -> String {
    fields.iter().copied().collect::<Vec<_>>().join(", ")
}

/// Work that cannot be planned in this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    /// Protection was requested for a branch that does not exist yet.
    BranchMissing { branch: String },
}

impl fmt::Display for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BranchMissing { branch } => {
                write!(f, "protection of branch {branch} waits for the branch to exist")
            }
        }
    }
}

/// The operations of one convergence pass, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub operations: Vec<Operation>,
    pub pending: Vec<Pending>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Orders the changes of a change-set into a plan.
pub fn build_plan(changes: &ChangeSet) -> Plan {
    let mut plan = Plan::default();

    let edit = changes.repository.as_ref().map(|change| {
        (
            change.archives(),
            Operation::EditRepository {
                fields: change.fields.clone(),
                changed: change.changed.clone(),
            },
        )
    });
    let mut archive_last = None;
    match edit {
        Some((true, operation)) => archive_last = Some(operation),
        Some((false, operation)) => plan.operations.push(operation),
        None => {}
    }

    plan_permissions(
        &mut plan,
        &changes.users,
        Operation::GrantUser,
        Operation::UpdateUser,
        Operation::RevokeUser,
    );
    plan_permissions(
        &mut plan,
        &changes.teams,
        Operation::GrantTeam,
        Operation::UpdateTeam,
        Operation::RevokeTeam,
    );
    plan_webhooks(&mut plan, &changes.webhooks);
    plan_branch_protections(&mut plan, changes);
    plan_rulesets(&mut plan, &changes.rulesets);

    if let Some(operation) = archive_last {
        plan.operations.push(operation);
    }

    debug!(
        operations = plan.operations.len(),
        pending = plan.pending.len(),
        "Built convergence plan"
    );
    plan
}

fn plan_permissions(
    plan: &mut Plan,
    changes: &CategoryChanges<PermissionEntry>,
    grant: fn(PermissionEntry) -> Operation,
    update: fn(PermissionEntry) -> Operation,
    revoke: fn(PermissionEntry) -> Operation,
) {
    plan.operations
        .extend(changes.create.iter().cloned().map(grant));
    plan.operations
        .extend(changes.update.iter().map(|u| update(u.desired.clone())));
    plan.operations
        .extend(changes.delete.iter().cloned().map(revoke));
}

fn plan_webhooks(plan: &mut Plan, changes: &CategoryChanges<NormalizedWebhook>) {
    plan.operations
        .extend(changes.create.iter().cloned().map(Operation::CreateWebhook));

    for Update {
        desired,
        observed,
        fields,
    } in &changes.update
    {
        match observed.id {
            Some(id) => plan.operations.push(Operation::UpdateWebhook {
                id,
                desired: desired.clone(),
                observed: observed.clone(),
                changed: fields.clone(),
            }),
            None => plan.operations.push(Operation::CreateWebhook(desired.clone())),
        }
    }

    for webhook in &changes.delete {
        match webhook.id {
            Some(id) => plan.operations.push(Operation::DeleteWebhook {
                id,
                url: webhook.url.clone(),
            }),
            None => warn!(url = %webhook.url, "Cannot delete a webhook without an id"),
        }
    }
}

fn plan_branch_protections(plan: &mut Plan, changes: &ChangeSet) {
    let branch_protections = &changes.branch_protections;

    for rule in &branch_protections.create {
        if changes.existing_branches.contains(&rule.key) {
            plan.operations.push(Operation::ProtectBranch(rule.clone()));
        } else {
            debug!(branch = %rule.branch, "Deferring protection of missing branch");
            plan.pending.push(Pending::BranchMissing {
                branch: rule.branch.clone(),
            });
        }
    }

    plan.operations
        .extend(branch_protections.update.iter().map(|u| {
            Operation::UpdateBranchProtection {
                desired: u.desired.clone(),
                observed: u.observed.clone(),
                changed: u.fields.clone(),
            }
        }));

    plan.operations
        .extend(branch_protections.delete.iter().map(|rule| {
            Operation::UnprotectBranch {
                branch: rule.branch.clone(),
            }
        }));
}

fn plan_rulesets(plan: &mut Plan, changes: &CategoryChanges<NormalizedRuleset>) {
    plan.operations
        .extend(changes.create.iter().cloned().map(Operation::CreateRuleset));

    for Update {
        desired,
        observed,
        fields,
    } in &changes.update
    {
        match observed.id {
            Some(id) => plan.operations.push(Operation::UpdateRuleset {
                id,
                desired: desired.clone(),
                observed: observed.clone(),
                changed: fields.clone(),
            }),
            None => plan.operations.push(Operation::CreateRuleset(desired.clone())),
        }
    }

    for ruleset in &changes.delete {
        match ruleset.id {
            Some(id) => plan.operations.push(Operation::DeleteRuleset {
                id,
                name: ruleset.name.clone(),
            }),
            None => warn!(ruleset = %ruleset.name, "Cannot delete a ruleset without an id"),
        }
    }
}
