//! The reconciliation entry point.
//!
//! One call reconciles one repository. [`Reconciler::observe`] answers whether the
//! repository exists and is up to date, [`Reconciler::converge`] applies a plan
//! to an existing repository, and [`Reconciler::create`] creates a missing one
//! and then converges it.

use std::sync::Arc;

use config_manager::RepositorySpec;
use github_client::RepositoryClient;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::aggregator::{aggregate, Verdict};
use crate::configuration::ReconcilerConfig;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::executor::ConvergeExecutor;
use crate::fetcher::fetch_observed;
use crate::normalizer::{normalize_desired, normalize_observed};
use crate::planner::{build_plan, Operation, Pending, Plan};
use crate::repository::{OrganizationName, RepositoryName};
use crate::retry::RetryPolicy;

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;

/// The outcome of a convergence pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergeReport {
    /// Operations applied, in order.
    pub applied: Vec<Operation>,
    /// Work deferred to a later pass.
    pub pending: Vec<Pending>,
}

impl ConvergeReport {
    /// True when nothing had to be applied and nothing is waiting.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.pending.is_empty()
    }
}

/// Reconciles repositories against their specifications.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use config_manager::load_repository_spec;
/// use github_client::{create_token_client, GitHubClient};
/// use repo_reconciler_core::{Reconciler, ReconcilerConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GitHubClient::new(create_token_client("ghp_token")?);
/// let reconciler = Reconciler::new(Arc::new(client), ReconcilerConfig::default());
/// let spec = load_repository_spec(r#"name = "my-repo""#)?;
///
/// let cancel = CancellationToken::new();
///
/// let verdict = reconciler.observe("my-org", &spec, &cancel).await?;
/// if !verdict.resource_exists() {
///     reconciler.create("my-org", &spec, &cancel).await?;
/// } else if !verdict.is_up_to_date() {
///     reconciler.converge("my-org", &spec, &cancel).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct Reconciler {
    client: Arc<dyn RepositoryClient>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(client: Arc<dyn RepositoryClient>, config: ReconcilerConfig) -> Self {
        Self { client, config }
    }

    /// Compares the repository with its specification without changing anything.
    ///
    /// A missing repository yields [`Verdict::DoesNotExist`], not an error.
    ///
    /// # Errors
    ///
    /// `MalformedInput` when the spec is invalid, `Fetch` when the observed state
    /// cannot be read, `Cancelled` when `cancel` fires during the fetch.
    #[instrument(skip(self, spec, cancel), fields(owner = %owner, repo = %spec.name))]
    pub async fn observe(
        &self,
        owner: &str,
        spec: &RepositorySpec,
        cancel: &CancellationToken,
    ) -> ReconcileResult<Verdict> {
        let (owner, repo) = validated_names(owner, &spec.name)?;
        let desired = normalize_desired(spec)?;

        let Some(observed) = fetch_observed(
            self.client.as_ref(),
            owner.as_str(),
            repo.as_str(),
            &self.retry_policy(),
            cancel,
        )
        .await?
        else {
            return Ok(Verdict::DoesNotExist);
        };

        let verdict = aggregate(&desired, &normalize_observed(&observed));
        match verdict.change_set() {
            Some(changes) => info!(
                categories = ?changes.drifted_categories(),
                "Repository is not up to date"
            ),
            None => info!("Repository is up to date"),
        }
        Ok(verdict)
    }

    /// Brings an existing repository in line with its specification.
    ///
    /// The observed state is fetched afresh, so the plan reflects what the
    /// platform holds now rather than what an earlier pass assumed.
    ///
    /// # Errors
    ///
    /// `RepositoryNotFound` when the repository is missing, `Apply` or `Cancelled`
    /// with the operations already applied, and the errors of [`Self::observe`].
    #[instrument(skip(self, spec, cancel), fields(owner = %owner, repo = %spec.name))]
    pub async fn converge(
        &self,
        owner: &str,
        spec: &RepositorySpec,
        cancel: &CancellationToken,
    ) -> ReconcileResult<ConvergeReport> {
        let plan = match self.observe(owner, spec, cancel).await? {
            Verdict::DoesNotExist => {
                return Err(ReconcileError::RepositoryNotFound {
                    owner: owner.to_string(),
                    repo: spec.name.clone(),
                })
            }
            Verdict::UpToDate => Plan::default(),
            Verdict::NotUpToDate(changes) => build_plan(&changes),
        };

        for pending in &plan.pending {
            warn!(pending = %pending, "Deferred to a later pass");
        }

        let report = self
            .executor(owner, &spec.name)
            .apply(&plan, cancel)
            .await?;

        info!(applied = report.applied.len(), "Convergence pass complete");
        Ok(ConvergeReport {
            applied: report.applied,
            pending: plan.pending,
        })
    }

    /// Creates the repository in the `owner` organization, then converges its
    /// sub-resources.
    ///
    /// # Errors
    ///
    /// `Apply` when the repository cannot be created, and the errors of
    /// [`Self::converge`].
    #[instrument(skip(self, spec, cancel), fields(owner = %owner, repo = %spec.name))]
    pub async fn create(
        &self,
        owner: &str,
        spec: &RepositorySpec,
        cancel: &CancellationToken,
    ) -> ReconcileResult<ConvergeReport> {
        validated_names(owner, &spec.name)?;
        let desired = normalize_desired(spec)?;

        let creation = Plan {
            operations: vec![Operation::CreateRepository {
                name: desired.name.clone(),
                fields: desired.fields.clone(),
            }],
            pending: Vec::new(),
        };
        let created = self
            .executor(owner, &spec.name)
            .apply(&creation, cancel)
            .await?;
        info!("Repository created");

        match self.converge(owner, spec, cancel).await {
            Ok(mut report) => {
                report.applied = created.applied.into_iter().chain(report.applied).collect();
                Ok(report)
            }
            Err(ReconcileError::Apply {
                applied,
                failed,
                cause,
            }) => Err(ReconcileError::Apply {
                applied: created.applied.into_iter().chain(applied).collect(),
                failed,
                cause,
            }),
            Err(ReconcileError::Cancelled { applied }) => Err(ReconcileError::Cancelled {
                applied: created.applied.into_iter().chain(applied).collect(),
            }),
            Err(e) => Err(e),
        }
    }

    fn executor<'a>(&'a self, owner: &'a str, repo: &'a str) -> ConvergeExecutor<'a> {
        ConvergeExecutor::new(
            self.client.as_ref(),
            owner,
            repo,
            self.retry_policy(),
        )
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config)
    }
}

fn validated_names(owner: &str, repo: &str) -> ReconcileResult<(OrganizationName, RepositoryName)> {
    Ok((OrganizationName::new(owner)?, RepositoryName::new(repo)?))
}
