//! Fetching the observed state of a repository.
//!
//! The repository itself is read first; if it is missing the fetch stops there.
//! Each sub-resource category is then read concurrently. A category the platform
//! reports as missing is treated as empty, while any other failure that survives
//! its retries aborts the whole fetch so that no diff is ever computed from a
//! partial snapshot. Rulesets inherited from the organization are skipped.

use std::future::Future;

use github_client::{
    Branch, BranchProtection, Collaborator, Error, Repository, RepositoryClient,
    RepositoryRuleset, TeamPermission, Webhook,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::retry::RetryPolicy;
use crate::state::Category;

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod tests;

/// The protection of a single branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedBranch {
    pub branch: String,
    pub protection: BranchProtection,
}

/// Everything read from the platform for one repository, in the platform's shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedRepository {
    pub repository: Repository,
    pub collaborators: Vec<Collaborator>,
    pub teams: Vec<TeamPermission>,
    pub webhooks: Vec<Webhook>,
    pub branches: Vec<Branch>,
    pub branch_protections: Vec<ProtectedBranch>,
    /// Full ruleset definitions, including their rules.
    pub rulesets: Vec<RepositoryRuleset>,
}

/// Rulesets with another source are inherited from the organization and are
/// not reconciled here.
const REPOSITORY_SOURCE_TYPE: &str = "Repository";

/// Reads the observed state of a repository.
///
/// Every read goes through `retry`, so a transient failure only aborts the fetch
/// once its attempts are used up. The whole fetch stops as soon as `cancel` fires.
///
/// Returns `Ok(None)` when the repository does not exist.
///
/// # Errors
///
/// Returns `ReconcileError::Fetch` naming the first category that failed, and
/// `ReconcileError::Cancelled` with nothing applied when `cancel` fires.
#[instrument(skip(client, retry, cancel), fields(owner = %owner, repo = %repo))]
pub async fn fetch_observed(
    client: &dyn RepositoryClient,
    owner: &str,
    repo: &str,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> ReconcileResult<Option<ObservedRepository>> {
    let reads = Reads {
        client,
        owner,
        repo,
        retry,
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("Fetch cancelled");
            Err(ReconcileError::Cancelled { applied: Vec::new() })
        }
        result = reads.repository_state() => result,
    }
}

struct Reads<'a> {
    client: &'a dyn RepositoryClient,
    owner: &'a str,
    repo: &'a str,
    retry: &'a RetryPolicy,
}

impl Reads<'_> {
    async fn repository_state(&self) -> ReconcileResult<Option<ObservedRepository>> {
        let (client, owner, repo) = (self.client, self.owner, self.repo);

        let Some(repository) = self
            .read(Category::Repository, "get repository", move || {
                client.get_repository(owner, repo)
            })
            .await?
        else {
            info!("Repository does not exist");
            return Ok(None);
        };

        let (collaborators, teams, webhooks, (branches, branch_protections), rulesets) = tokio::try_join!(
            self.list(Category::Users, "list collaborators", move || {
                client.list_collaborators(owner, repo)
            }),
            self.list(Category::Teams, "list teams", move || {
                client.list_repository_teams(owner, repo)
            }),
            self.list(Category::Webhooks, "list webhooks", move || {
                client.list_webhooks(owner, repo)
            }),
            self.branch_protections(),
            self.rulesets(),
        )?;

        info!(
            collaborators = collaborators.len(),
            teams = teams.len(),
            webhooks = webhooks.len(),
            branches = branches.len(),
            protected_branches = branch_protections.len(),
            rulesets = rulesets.len(),
            "Fetched observed repository state"
        );

        Ok(Some(ObservedRepository {
            repository,
            collaborators,
            teams,
            webhooks,
            branches,
            branch_protections,
            rulesets,
        }))
    }

    /// One retried read. A missing resource is `None`.
    async fn read<T, F, Fut>(
        &self,
        category: Category,
        description: &str,
        request: F,
    ) -> ReconcileResult<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match self.retry.run(description, request).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(ReconcileError::Fetch {
                category,
                repo: self.repo.to_string(),
                source: e,
            }),
        }
    }

    async fn list<T, F, Fut>(
        &self,
        category: Category,
        description: &str,
        request: F,
    ) -> ReconcileResult<Vec<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>, Error>>,
    {
        let items = self.read(category, description, request).await?;
        Ok(items.unwrap_or_else(|| {
            debug!(category = %category, "Category not found, treating it as empty");
            Vec::new()
        }))
    }

    async fn branch_protections(&self) -> ReconcileResult<(Vec<Branch>, Vec<ProtectedBranch>)> {
        let (client, owner, repo) = (self.client, self.owner, self.repo);
        let branches = self
            .list(Category::BranchProtection, "list branches", move || {
                client.list_branches(owner, repo)
            })
            .await?;

        let mut protections = Vec::new();
        for branch in branches.iter().filter(|b| b.protected) {
            let name = branch.name.as_str();
            let protection = self
                .read(Category::BranchProtection, "get branch protection", move || {
                    client.get_branch_protection(owner, repo, name)
                })
                .await?;
            match protection {
                Some(protection) => protections.push(ProtectedBranch {
                    branch: branch.name.clone(),
                    protection,
                }),
                None => {
                    debug!(branch = %branch.name, "Branch lost its protection while fetching");
                }
            }
        }

        Ok((branches, protections))
    }

    async fn rulesets(&self) -> ReconcileResult<Vec<RepositoryRuleset>> {
        let (client, owner, repo) = (self.client, self.owner, self.repo);
        let summaries = self
            .list(Category::Rulesets, "list rulesets", move || {
                client.list_repository_rulesets(owner, repo)
            })
            .await?;

        let mut rulesets = Vec::with_capacity(summaries.len());
        for summary in summaries.into_iter().filter(is_repository_ruleset) {
            // The list endpoint leaves out the rules.
            let Some(id) = summary.id else {
                rulesets.push(summary);
                continue;
            };

            let ruleset = self
                .read(Category::Rulesets, "get ruleset", move || {
                    client.get_repository_ruleset(owner, repo, id)
                })
                .await?;
            match ruleset {
                Some(ruleset) => rulesets.push(ruleset),
                None => debug!(ruleset = %summary.name, id, "Ruleset deleted while fetching"),
            }
        }

        Ok(rulesets)
    }
}

fn is_repository_ruleset(ruleset: &RepositoryRuleset) -> bool {
    match ruleset.source_type.as_deref() {
        None | Some(REPOSITORY_SOURCE_TYPE) => true,
        Some(source) => {
            debug!(
                ruleset = %ruleset.name,
                source_type = %source,
                "Ignoring ruleset inherited from its source"
            );
            false
        }
    }
}
