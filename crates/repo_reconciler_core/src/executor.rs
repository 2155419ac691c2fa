//! Sequential execution of a plan.
//!
//! Operations run strictly in plan order. The first operation that fails
//! permanently, or transiently past its retries, ends the pass; operations that
//! already succeeded stay applied and are reported with the failure. The next
//! pass re-reads the repository and continues from its actual state.

use github_client::{Error, RepositoryClient};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::planner::{Operation, Plan};
use crate::requests::{
    branch_protection_request, repository_create_payload, repository_update, ruleset_request,
    webhook_request,
};
use crate::retry::RetryPolicy;

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

/// The operations a pass applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub applied: Vec<Operation>,
}

/// Applies plans to one repository through a [`RepositoryClient`].
pub struct ConvergeExecutor<'a> {
    client: &'a dyn RepositoryClient,
    owner: &'a str,
    repo: &'a str,
    retry: RetryPolicy,
}

impl<'a> ConvergeExecutor<'a> {
    pub fn new(
        client: &'a dyn RepositoryClient,
        owner: &'a str,
        repo: &'a str,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            owner,
            repo,
            retry,
        }
    }

    /// Executes the operations of `plan` in order.
    ///
    /// Cancellation is checked before every operation and interrupts an operation
    /// that is in flight or waiting to retry. Completed operations are not undone.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Apply` for the first failed operation and
    /// `ReconcileError::Cancelled` when `cancel` fires.
    #[instrument(skip(self, plan, cancel), fields(owner = %self.owner, repo = %self.repo))]
    pub async fn apply(
        &self,
        plan: &Plan,
        cancel: &CancellationToken,
    ) -> ReconcileResult<ApplyReport> {
        let mut applied = Vec::with_capacity(plan.operations.len());

        for operation in &plan.operations {
            if cancel.is_cancelled() {
                warn!(applied = applied.len(), "Convergence cancelled");
                return Err(ReconcileError::Cancelled { applied });
            }

            let description = operation.to_string();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        operation = %description,
                        applied = applied.len(),
                        "Convergence cancelled during operation"
                    );
                    return Err(ReconcileError::Cancelled { applied });
                }
                result = self.retry.run(&description, || self.execute(operation)) => result,
            };

            match result {
                Ok(()) => {
                    info!(operation = %description, "Applied operation");
                    applied.push(operation.clone());
                }
                Err(cause) => {
                    error!(
                        operation = %description,
                        applied = applied.len(),
                        error = %cause,
                        "Operation failed, stopping convergence"
                    );
                    return Err(ReconcileError::Apply {
                        applied,
                        failed: operation.clone(),
                        cause,
                    });
                }
            }
        }

        Ok(ApplyReport { applied })
    }

    async fn execute(&self, operation: &Operation) -> Result<(), Error> {
        let (client, owner, repo) = (self.client, self.owner, self.repo);

        match operation {
            Operation::CreateRepository { name, fields } => client
                .create_org_repository(owner, &repository_create_payload(name, fields))
                .await
                .map(drop),
            Operation::EditRepository { fields, .. } => client
                .update_repository(owner, repo, &repository_update(fields))
                .await
                .map(drop),
            Operation::GrantUser(entry) | Operation::UpdateUser(entry) => {
                client
                    .add_collaborator(owner, repo, &entry.name, entry.role.as_str())
                    .await
            }
            Operation::RevokeUser(entry) => {
                client.remove_collaborator(owner, repo, &entry.name).await
            }
            Operation::GrantTeam(entry) | Operation::UpdateTeam(entry) => {
                client
                    .add_team_permission(owner, repo, &entry.name, entry.role.as_str())
                    .await
            }
            Operation::RevokeTeam(entry) => {
                client.remove_team_permission(owner, repo, &entry.name).await
            }
            Operation::CreateWebhook(webhook) => client
                .create_webhook(owner, repo, &webhook_request(webhook, None))
                .await
                .map(drop),
            Operation::UpdateWebhook {
                id,
                desired,
                observed,
                ..
            } => client
                .update_webhook(owner, repo, *id, &webhook_request(desired, Some(observed)))
                .await
                .map(drop),
            Operation::DeleteWebhook { id, .. } => client.delete_webhook(owner, repo, *id).await,
            Operation::ProtectBranch(rule) => {
                client
                    .update_branch_protection(
                        owner,
                        repo,
                        &rule.branch,
                        &branch_protection_request(rule, None),
                    )
                    .await
            }
            Operation::UpdateBranchProtection {
                desired, observed, ..
            } => {
                client
                    .update_branch_protection(
                        owner,
                        repo,
                        &observed.branch,
                        &branch_protection_request(desired, Some(observed)),
                    )
                    .await
            }
            Operation::UnprotectBranch { branch } => {
                client.delete_branch_protection(owner, repo, branch).await
            }
            Operation::CreateRuleset(ruleset) => client
                .create_repository_ruleset(owner, repo, &ruleset_request(ruleset, None))
                .await
                .map(drop),
            Operation::UpdateRuleset {
                id,
                desired,
                observed,
                ..
            } => client
                .update_repository_ruleset(
                    owner,
                    repo,
                    *id,
                    &ruleset_request(desired, Some(observed)),
                )
                .await
                .map(drop),
            Operation::DeleteRuleset { id, .. } => {
                client.delete_repository_ruleset(owner, repo, *id).await
            }
        }
    }
}
