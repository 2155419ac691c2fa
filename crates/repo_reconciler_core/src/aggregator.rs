//! Folding per-category comparisons into a verdict and a change-set.

use std::collections::BTreeSet;

use crate::differ::{AttributeDiff, FieldDiff};
use crate::matcher::match_keyed;
use crate::state::{
    Category, IdentityKey, Keyed, NormalizedBranchProtection, NormalizedRepository,
    NormalizedRuleset, NormalizedWebhook, PermissionEntry, RepositoryFields, Setting,
};

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod tests;

/// A matched entry whose attributes differ.
#[derive(Debug, Clone, PartialEq)]
pub struct Update<T> {
    pub desired: T,
    pub observed: T,
    pub fields: BTreeSet<&'static str>,
}

/// The creates, updates and deletes of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryChanges<T> {
    pub create: Vec<T>,
    pub update: Vec<Update<T>>,
    pub delete: Vec<T>,
}

impl<T> Default for CategoryChanges<T> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
        }
    }
}

impl<T> CategoryChanges<T> {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// A change to the scalar fields of the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryChange {
    /// Only the changed fields are explicit.
    pub fields: RepositoryFields,
    pub changed: BTreeSet<&'static str>,
}

impl RepositoryChange {
    /// True when the change archives the repository.
    pub fn archives(&self) -> bool {
        self.fields.archived == Setting::Explicit(true)
    }
}

/// Everything that differs between a desired and an observed repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub repository: Option<RepositoryChange>,
    pub users: CategoryChanges<PermissionEntry>,
    pub teams: CategoryChanges<PermissionEntry>,
    pub webhooks: CategoryChanges<NormalizedWebhook>,
    pub branch_protections: CategoryChanges<NormalizedBranchProtection>,
    pub rulesets: CategoryChanges<NormalizedRuleset>,
    /// Branches that exist remotely, so protection for others can be deferred.
    pub existing_branches: BTreeSet<IdentityKey>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.drifted_categories().is_empty()
    }

    /// The categories with at least one change, in comparison order.
    pub fn drifted_categories(&self) -> Vec<Category> {
        [
            (Category::Repository, self.repository.is_some()),
            (Category::Users, !self.users.is_empty()),
            (Category::Teams, !self.teams.is_empty()),
            (Category::Webhooks, !self.webhooks.is_empty()),
            (Category::BranchProtection, !self.branch_protections.is_empty()),
            (Category::Rulesets, !self.rulesets.is_empty()),
        ]
        .into_iter()
        .filter_map(|(category, drifted)| drifted.then_some(category))
        .collect()
    }
}

/// Whether a repository matches its desired state.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The repository is absent remotely; nothing was compared.
    DoesNotExist,
    UpToDate,
    NotUpToDate(ChangeSet),
}

impl Verdict {
    pub fn resource_exists(&self) -> bool {
        !matches!(self, Self::DoesNotExist)
    }

    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Self::UpToDate)
    }

    pub fn change_set(&self) -> Option<&ChangeSet> {
        match self {
            Self::NotUpToDate(changes) => Some(changes),
            _ => None,
        }
    }
}

/// Compares every category and returns the verdict with the full change-set.
pub fn aggregate(desired: &NormalizedRepository, observed: &NormalizedRepository) -> Verdict {
    let changes = ChangeSet {
        repository: repository_change(&desired.fields, &observed.fields),
        users: category_changes(&desired.users, &observed.users),
        teams: category_changes(&desired.teams, &observed.teams),
        webhooks: category_changes(&desired.webhooks, &observed.webhooks),
        branch_protections: category_changes(
            &desired.branch_protections,
            &observed.branch_protections,
        ),
        rulesets: category_changes(&desired.rulesets, &observed.rulesets),
        existing_branches: observed.existing_branches.clone(),
    };

    if changes.is_empty() {
        Verdict::UpToDate
    } else {
        Verdict::NotUpToDate(changes)
    }
}

/// Returns whether the repositories are equivalent, stopping at the first
/// category that differs.
pub fn is_up_to_date(desired: &NormalizedRepository, observed: &NormalizedRepository) -> bool {
    desired.fields.diff(&observed.fields).is_equivalent()
        && category_in_sync(&desired.users, &observed.users)
        && category_in_sync(&desired.teams, &observed.teams)
        && category_in_sync(&desired.webhooks, &observed.webhooks)
        && category_in_sync(&desired.branch_protections, &observed.branch_protections)
        && category_in_sync(&desired.rulesets, &observed.rulesets)
}

fn repository_change(
    desired: &RepositoryFields,
    observed: &RepositoryFields,
) -> Option<RepositoryChange> {
    let FieldDiff::Changed(changed) = desired.diff(observed) else {
        return None;
    };

    let pick = |field: &str| changed.contains(field);
    let fields = RepositoryFields {
        description: if pick("description") {
            desired.description.clone()
        } else {
            Setting::Unset
        },
        archived: if pick("archived") {
            desired.archived.clone()
        } else {
            Setting::Unset
        },
        private: if pick("private") {
            desired.private.clone()
        } else {
            Setting::Unset
        },
        is_template: if pick("is_template") {
            desired.is_template.clone()
        } else {
            Setting::Unset
        },
    };

    Some(RepositoryChange { fields, changed })
}

fn category_changes<T>(desired: &[T], observed: &[T]) -> CategoryChanges<T>
where
    T: Keyed + AttributeDiff + Clone,
{
    let matched = match_keyed(desired, observed);

    let update = matched
        .pairs
        .into_iter()
        .filter_map(|(desired, observed)| match desired.diff(observed) {
            FieldDiff::Equivalent => None,
            FieldDiff::Changed(fields) => Some(Update {
                desired: desired.clone(),
                observed: observed.clone(),
                fields,
            }),
        })
        .collect();

    CategoryChanges {
        create: matched.to_create.into_iter().cloned().collect(),
        update,
        delete: matched.to_delete.into_iter().cloned().collect(),
    }
}

fn category_in_sync<T: Keyed + AttributeDiff>(desired: &[T], observed: &[T]) -> bool {
    let matched = match_keyed(desired, observed);

    matched.to_create.is_empty()
        && matched.to_delete.is_empty()
        && matched
            .pairs
            .iter()
            .all(|(desired, observed)| desired.diff(observed).is_equivalent())
}
