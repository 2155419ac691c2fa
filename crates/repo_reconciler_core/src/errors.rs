//! Error types for repository reconciliation.

use thiserror::Error;

use crate::planner::Operation;
use crate::state::Category;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that end a reconciliation pass.
///
/// Fetch errors are raised before anything is diffed, so a pass never plans from
/// a partial snapshot. Apply errors and cancellations report the operations that
/// already succeeded; those are not rolled back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// The desired specification breaks an invariant and was rejected before any
    /// remote call was made.
    #[error("Invalid repository specification: {reason}")]
    MalformedInput { reason: String },

    /// Reading the observed state of one sub-resource category failed.
    #[error("Failed to fetch {category} of {repo}: {source}")]
    Fetch {
        category: Category,
        repo: String,
        #[source]
        source: github_client::Error,
    },

    /// A planned operation failed with a permanent error, or with a transient
    /// error that outlasted its retries.
    #[error("Operation '{failed}' failed after {} applied operation(s): {cause}", .applied.len())]
    Apply {
        applied: Vec<Operation>,
        failed: Operation,
        #[source]
        cause: github_client::Error,
    },

    /// The caller cancelled the pass. Operations in `applied` have completed.
    #[error("Reconciliation cancelled after {} applied operation(s)", .applied.len())]
    Cancelled { applied: Vec<Operation> },

    /// Convergence was requested for a repository that does not exist.
    #[error("Repository {owner}/{repo} does not exist")]
    RepositoryNotFound { owner: String, repo: String },

    /// The reconciler configuration could not be read.
    #[error("Invalid reconciler configuration: {reason}")]
    Configuration { reason: String },
}

impl ReconcileError {
    /// The operations that completed before the pass ended.
    pub fn applied(&self) -> &[Operation] {
        match self {
            Self::Apply { applied, .. } | Self::Cancelled { applied } => applied,
            _ => &[],
        }
    }
}

impl From<config_manager::ConfigurationError> for ReconcileError {
    fn from(error: config_manager::ConfigurationError) -> Self {
        Self::MalformedInput {
            reason: error.to_string(),
        }
    }
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
