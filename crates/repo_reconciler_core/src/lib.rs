//! # Repo Reconciler Core
//!
//! This crate reconciles the declared configuration of a GitHub repository with the
//! state the platform actually holds.
//!
//! ## Overview
//!
//! A reconciliation pass runs through these stages:
//! 1. Fetching the observed state, one concurrent read per sub-resource category
//! 2. Normalizing desired and observed state into comparable form
//! 3. Matching entries of each category by case-insensitive identity
//! 4. Comparing the attributes the desired side manages
//! 5. Folding the comparisons into a verdict and a change-set
//! 6. Ordering the changes into a plan and applying it
//!
//! Categories are repository scalar fields, user permissions, team permissions,
//! webhooks, branch protection rules and rulesets.
//!
//! ## Main Entry Points
//!
//! - [`Reconciler::observe`] - Report whether a repository exists and is up to date
//! - [`Reconciler::converge`] - Apply the changes that bring it up to date
//! - [`Reconciler::create`] - Create a missing repository, then converge it
//!
//! The stages are public as well, so they can be used on their own:
//! [`normalize_desired`], [`normalize_observed`], [`match_keyed`],
//! [`AttributeDiff::diff`], [`aggregate`], [`is_up_to_date`], [`build_plan`] and
//! [`ConvergeExecutor::apply`].

pub mod aggregator;
pub use aggregator::{
    aggregate, is_up_to_date, CategoryChanges, ChangeSet, RepositoryChange, Update, Verdict,
};

pub mod configuration;
pub use configuration::ReconcilerConfig;

pub mod differ;
pub use differ::{AttributeDiff, FieldDiff};

pub mod errors;
pub use errors::{ReconcileError, ReconcileResult};

pub mod executor;
pub use executor::{ApplyReport, ConvergeExecutor};

pub mod fetcher;
pub use fetcher::{fetch_observed, ObservedRepository, ProtectedBranch};

pub mod matcher;
pub use matcher::{match_keyed, Matched};

pub mod normalizer;
pub use normalizer::{normalize_desired, normalize_observed};

pub mod planner;
pub use planner::{build_plan, Operation, Pending, Plan};

pub mod reconciler;
pub use reconciler::{ConvergeReport, Reconciler};

pub mod repository;
pub use repository::{OrganizationName, RepositoryName};

pub mod requests;

pub mod retry;
pub use retry::RetryPolicy;

pub mod state;
pub use state::{
    Category, GrantedRole, IdentityKey, Keyed, NormalizedBranchProtection, NormalizedRepository,
    NormalizedRuleset, NormalizedWebhook, PermissionEntry, Setting,
};

#[cfg(test)]
mod test_support;
