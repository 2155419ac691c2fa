//! Crate for interacting with the GitHub REST API.
//!
//! This crate provides the [`RepositoryClient`] trait, which names every read and
//! mutation the repository reconciler needs, and [`GitHubClient`], its implementation
//! on top of an authenticated [`Octocrab`] instance.
//!
//! All failures are reported as [`Error`], which can be classified with
//! [`Error::kind`] into not-found, transient and permanent failures.

use async_trait::async_trait;
use octocrab::{Octocrab, Result as OctocrabResult};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, instrument};

pub mod errors;
pub use errors::{Error, ErrorKind};

pub mod branch_protection;
pub use branch_protection::{
    Branch, BranchProtection, BranchProtectionRequest, EnabledSetting, PrincipalNames,
    PrincipalRefs, PullRequestReviewEnforcement, PullRequestReviewsRequest, RequiredStatusChecks,
    RequiredStatusChecksRequest, SlugRef, StatusCheck, UserRef,
};

pub mod repository;
pub use repository::{Collaborator, PermissionFlags, PermissionRequest, Repository, TeamPermission};

pub mod ruleset;
pub use ruleset::{
    BypassActor, BypassActorType, BypassMode, OtherRule, PullRequestParameters, RefNameCondition,
    RepositoryRuleset, RequiredStatusChecksParameters, Rule, RulesetConditions,
    RulesetEnforcement, RulesetRule, RulesetStatusCheck, RulesetTarget,
};

pub mod webhook;
pub use webhook::{Webhook, WebhookDetails, WebhookRequest};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Page size used for every list endpoint. GitHub caps it at 100.
const PAGE_SIZE: usize = 100;

/// A client for interacting with the GitHub API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Creates a new `GitHubClient` from an authenticated `Octocrab` instance.
    ///
    /// # Arguments
    ///
    /// * `client` - An `Octocrab` client, typically from [`create_token_client`].
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Fetches every page of a list endpoint.
    ///
    /// Pages are requested until GitHub returns a page shorter than [`PAGE_SIZE`].
    async fn get_all_pages<T>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
        context: &str,
    ) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned + Send,
    {
        let mut items = Vec::new();
        let mut page = 1usize;
        loop {
            let mut params: Vec<(String, String)> = extra
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            params.push(("per_page".to_string(), PAGE_SIZE.to_string()));
            params.push(("page".to_string(), page.to_string()));

            let response: OctocrabResult<Vec<T>> = self.client.get(path, Some(&params)).await;
            let batch = response.map_err(|e| map_octocrab_error(context, e))?;

            let count = batch.len();
            items.extend(batch);
            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        debug!(path = path, count = items.len(), "Fetched all pages");
        Ok(items)
    }

    /// Sends a request whose successful response has no body worth reading.
    ///
    /// GitHub answers most membership and delete calls with `204 No Content`, which
    /// the typed `put`/`delete` helpers of octocrab cannot deserialize.
    async fn send_without_body<B>(
        &self,
        method: http::Method,
        path: &str,
        body: Option<&B>,
        context: &str,
    ) -> Result<(), Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        let response = if method == http::Method::PUT {
            self.client._put(path, body).await
        } else if method == http::Method::DELETE {
            self.client._delete(path, body).await
        } else {
            return Err(Error::InvalidRequest(format!(
                "unsupported method {method} for {path}"
            )));
        };

        let response = response.map_err(|e| map_octocrab_error(context, e))?;
        octocrab::map_github_error(response)
            .await
            .map(|_| ())
            .map_err(|e| map_octocrab_error(context, e))
    }
}

#[async_trait]
impl RepositoryClient for GitHubClient {
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error> {
        let path = format!("/repos/{}/{}", owner, repo);
        let response: OctocrabResult<Repository> = self.client.get(path, None::<&()>).await;
        response.map_err(|e| map_octocrab_error("Failed to get repository", e))
    }

    #[instrument(skip(self, payload), fields(org_name = %org_name, repo = %payload.name))]
    async fn create_org_repository(
        &self,
        org_name: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        let path = format!("/orgs/{}/repos", org_name);
        let response: OctocrabResult<Repository> = self.client.post(path, Some(payload)).await;
        let repository = response
            .map_err(|e| map_octocrab_error("Failed to create repository for organisation", e))?;

        info!(
            org_name = org_name,
            repo = repository.name,
            "Created repository"
        );
        Ok(repository)
    }

    #[instrument(skip(self, update), fields(owner = %owner, repo = %repo))]
    async fn update_repository(
        &self,
        owner: &str,
        repo: &str,
        update: &RepositoryUpdate,
    ) -> Result<Repository, Error> {
        let path = format!("/repos/{}/{}", owner, repo);
        let response: OctocrabResult<Repository> = self.client.patch(path, Some(update)).await;
        response.map_err(|e| map_octocrab_error("Failed to update repository", e))
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn list_collaborators(&self, owner: &str, repo: &str) -> Result<Vec<Collaborator>, Error> {
        let path = format!("/repos/{}/{}/collaborators", owner, repo);
        self.get_all_pages(
            &path,
            &[("affiliation", "direct")],
            "Failed to list collaborators",
        )
        .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, user = %user))]
    async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
        permission: &str,
    ) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/collaborators/{}", owner, repo, user);
        let body = PermissionRequest {
            permission: permission.to_string(),
        };
        self.send_without_body(
            http::Method::PUT,
            &path,
            Some(&body),
            "Failed to add collaborator",
        )
        .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, user = %user))]
    async fn remove_collaborator(&self, owner: &str, repo: &str, user: &str) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/collaborators/{}", owner, repo, user);
        self.send_without_body(
            http::Method::DELETE,
            &path,
            None::<&()>,
            "Failed to remove collaborator",
        )
        .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn list_repository_teams(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<TeamPermission>, Error> {
        let path = format!("/repos/{}/{}/teams", owner, repo);
        self.get_all_pages(&path, &[], "Failed to list repository teams")
            .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, team = %team_slug))]
    async fn add_team_permission(
        &self,
        owner: &str,
        repo: &str,
        team_slug: &str,
        permission: &str,
    ) -> Result<(), Error> {
        let path = format!("/orgs/{}/teams/{}/repos/{}/{}", owner, team_slug, owner, repo);
        let body = PermissionRequest {
            permission: permission.to_string(),
        };
        self.send_without_body(
            http::Method::PUT,
            &path,
            Some(&body),
            "Failed to grant team permission",
        )
        .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, team = %team_slug))]
    async fn remove_team_permission(
        &self,
        owner: &str,
        repo: &str,
        team_slug: &str,
    ) -> Result<(), Error> {
        let path = format!("/orgs/{}/teams/{}/repos/{}/{}", owner, team_slug, owner, repo);
        self.send_without_body(
            http::Method::DELETE,
            &path,
            None::<&()>,
            "Failed to remove team permission",
        )
        .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn list_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<Webhook>, Error> {
        let path = format!("/repos/{}/{}/hooks", owner, repo);
        self.get_all_pages(&path, &[], "Failed to list webhooks")
            .await
    }

    #[instrument(skip(self, request), fields(owner = %owner, repo = %repo))]
    async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        request: &WebhookRequest,
    ) -> Result<Webhook, Error> {
        let path = format!("/repos/{}/{}/hooks", owner, repo);
        let response: OctocrabResult<Webhook> = self.client.post(path, Some(request)).await;
        response.map_err(|e| map_octocrab_error("Failed to create webhook", e))
    }

    #[instrument(skip(self, request), fields(owner = %owner, repo = %repo, hook_id = hook_id))]
    async fn update_webhook(
        &self,
        owner: &str,
        repo: &str,
        hook_id: u64,
        request: &WebhookRequest,
    ) -> Result<Webhook, Error> {
        let path = format!("/repos/{}/{}/hooks/{}", owner, repo, hook_id);
        let response: OctocrabResult<Webhook> = self.client.patch(path, Some(request)).await;
        response.map_err(|e| map_octocrab_error("Failed to update webhook", e))
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, hook_id = hook_id))]
    async fn delete_webhook(&self, owner: &str, repo: &str, hook_id: u64) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/hooks/{}", owner, repo, hook_id);
        self.send_without_body(
            http::Method::DELETE,
            &path,
            None::<&()>,
            "Failed to delete webhook",
        )
        .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>, Error> {
        let path = format!("/repos/{}/{}/branches", owner, repo);
        self.get_all_pages(&path, &[], "Failed to list branches")
            .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch))]
    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, Error> {
        let path = format!("/repos/{}/{}/branches/{}/protection", owner, repo, branch);
        let response: OctocrabResult<BranchProtection> = self.client.get(path, None::<&()>).await;
        response.map_err(|e| map_octocrab_error("Failed to get branch protection", e))
    }

    #[instrument(skip(self, request), fields(owner = %owner, repo = %repo, branch = %branch))]
    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        request: &BranchProtectionRequest,
    ) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/branches/{}/protection", owner, repo, branch);
        self.send_without_body(
            http::Method::PUT,
            &path,
            Some(request),
            "Failed to update branch protection",
        )
        .await?;

        let signatures_path = format!("{}/required_signatures", path);
        match request.required_signatures {
            Some(true) => {
                let response: OctocrabResult<serde_json::Value> =
                    self.client.post(signatures_path, None::<&()>).await;
                response
                    .map(|_| ())
                    .map_err(|e| map_octocrab_error("Failed to require signed commits", e))?;
            }
            Some(false) => {
                match self
                    .send_without_body(
                        http::Method::DELETE,
                        &signatures_path,
                        None::<&()>,
                        "Failed to stop requiring signed commits",
                    )
                    .await
                {
                    // Already off.
                    Err(Error::NotFound) => {}
                    other => other?,
                }
            }
            None => {}
        }

        Ok(())
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch))]
    async fn delete_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/branches/{}/protection", owner, repo, branch);
        self.send_without_body(
            http::Method::DELETE,
            &path,
            None::<&()>,
            "Failed to delete branch protection",
        )
        .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn list_repository_rulesets(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<RepositoryRuleset>, Error> {
        let path = format!("/repos/{}/{}/rulesets", owner, repo);
        self.get_all_pages(
            &path,
            &[("includes_parents", "false")],
            "Failed to list rulesets",
        )
        .await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, ruleset_id = ruleset_id))]
    async fn get_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset_id: u64,
    ) -> Result<RepositoryRuleset, Error> {
        let path = format!("/repos/{}/{}/rulesets/{}", owner, repo, ruleset_id);
        let response: OctocrabResult<RepositoryRuleset> = self.client.get(path, None::<&()>).await;
        response.map_err(|e| map_octocrab_error("Failed to get ruleset", e))
    }

    #[instrument(skip(self, ruleset), fields(owner = %owner, repo = %repo, ruleset = %ruleset.name))]
    async fn create_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error> {
        let path = format!("/repos/{}/{}/rulesets", owner, repo);
        let response: OctocrabResult<RepositoryRuleset> =
            self.client.post(path, Some(ruleset)).await;
        response.map_err(|e| map_octocrab_error("Failed to create ruleset", e))
    }

    #[instrument(skip(self, ruleset), fields(owner = %owner, repo = %repo, ruleset_id = ruleset_id))]
    async fn update_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset_id: u64,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error> {
        let path = format!("/repos/{}/{}/rulesets/{}", owner, repo, ruleset_id);
        let response: OctocrabResult<RepositoryRuleset> =
            self.client.put(path, Some(ruleset)).await;
        response.map_err(|e| map_octocrab_error("Failed to update ruleset", e))
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, ruleset_id = ruleset_id))]
    async fn delete_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset_id: u64,
    ) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/rulesets/{}", owner, repo, ruleset_id);
        self.send_without_body(
            http::Method::DELETE,
            &path,
            None::<&()>,
            "Failed to delete ruleset",
        )
        .await
    }
}

/// Represents the payload for creating a new repository via the REST API.
/// Use `Default::default()` and modify fields as needed.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCreatePayload {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>, // Defaults to false if None

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>, // Defaults to false if None
}

/// Represents the repository fields that can be changed in place.
///
/// Only the fields that are `Some` are sent, so GitHub leaves every other setting alone.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
}

impl RepositoryUpdate {
    /// True when the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.private.is_none()
            && self.archived.is_none()
            && self.is_template.is_none()
    }
}

/// The remote operations the reconciler performs against a repository.
///
/// Reads report a missing resource as [`Error::NotFound`]; mutations that GitHub
/// answers without a body return `()`.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Fetches the repository itself.
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error>;

    async fn create_org_repository(
        &self,
        org_name: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error>;

    /// Updates the scalar settings of a repository.
    ///
    /// Only the fields provided in the `update` argument will be changed.
    ///
    /// # Arguments
    ///
    /// * `owner` - The owner of the repository (user or organization name).
    /// * `repo` - The name of the repository.
    /// * `update` - A `RepositoryUpdate` struct containing the desired changes.
    async fn update_repository(
        &self,
        owner: &str,
        repo: &str,
        update: &RepositoryUpdate,
    ) -> Result<Repository, Error>;

    /// Lists the direct collaborators of a repository. Organization members who
    /// only have access through a team are not included.
    async fn list_collaborators(&self, owner: &str, repo: &str) -> Result<Vec<Collaborator>, Error>;

    /// Grants a user a permission level, replacing any level they already hold.
    async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
        permission: &str,
    ) -> Result<(), Error>;

    async fn remove_collaborator(&self, owner: &str, repo: &str, user: &str) -> Result<(), Error>;

    async fn list_repository_teams(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<TeamPermission>, Error>;

    /// Grants a team of the owning organization a permission level on the repository.
    async fn add_team_permission(
        &self,
        owner: &str,
        repo: &str,
        team_slug: &str,
        permission: &str,
    ) -> Result<(), Error>;

    async fn remove_team_permission(
        &self,
        owner: &str,
        repo: &str,
        team_slug: &str,
    ) -> Result<(), Error>;

    async fn list_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<Webhook>, Error>;

    async fn create_webhook(
        &self,
        owner: &str,
        repo: &str,
        request: &WebhookRequest,
    ) -> Result<Webhook, Error>;

    async fn update_webhook(
        &self,
        owner: &str,
        repo: &str,
        hook_id: u64,
        request: &WebhookRequest,
    ) -> Result<Webhook, Error>;

    async fn delete_webhook(&self, owner: &str, repo: &str, hook_id: u64) -> Result<(), Error>;

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>, Error>;

    /// Fetches the protection of a branch. An unprotected branch is reported as
    /// [`Error::NotFound`].
    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, Error>;

    /// Replaces the protection of a branch, then applies the signed commit
    /// requirement through its own endpoint when the request names it.
    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        request: &BranchProtectionRequest,
    ) -> Result<(), Error>;

    async fn delete_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), Error>;

    /// Lists the rulesets defined on the repository itself.
    ///
    /// GitHub's list endpoint does not include rules; use
    /// [`RepositoryClient::get_repository_ruleset`] for the full definition.
    async fn list_repository_rulesets(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<RepositoryRuleset>, Error>;

    async fn get_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset_id: u64,
    ) -> Result<RepositoryRuleset, Error>;

    async fn create_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error>;

    async fn update_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset_id: u64,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error>;

    async fn delete_repository_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset_id: u64,
    ) -> Result<(), Error>;
}

/// Creates an `Octocrab` client authenticated with a personal or installation token.
///
/// # Errors
///
/// Returns `Error::AuthError` if the client cannot be built.
#[instrument(skip(token))]
pub fn create_token_client(token: &str) -> Result<Octocrab, Error> {
    Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| {
            error!(error = ?e, "Failed to build Octocrab client with token");
            Error::AuthError("Failed to build a client for the provided token.".to_string())
        })
}

/// Logs an octocrab failure and converts it into an [`Error`].
fn map_octocrab_error(message: &str, e: octocrab::Error) -> Error {
    log_octocrab_error(message, &e);
    match e {
        octocrab::Error::GitHub { source, .. } => {
            Error::from_status(source.status_code.as_u16(), &source.message)
        }
        octocrab::Error::Serde { source, .. } => Error::InvalidResponse(source.to_string()),
        octocrab::Error::Json { source, .. } => Error::InvalidResponse(source.to_string()),
        octocrab::Error::Uri { source, .. } => Error::InvalidRequest(source.to_string()),
        octocrab::Error::UriParse { source, .. } => Error::InvalidRequest(source.to_string()),
        octocrab::Error::InvalidHeaderValue { source, .. } => {
            Error::InvalidRequest(source.to_string())
        }
        other => Error::Transport(other.to_string()),
    }
}

fn log_octocrab_error(message: &str, e: &octocrab::Error) {
    match e {
        octocrab::Error::GitHub { source, .. } => error!(
            status = source.status_code.as_u16(),
            error_message = source.message,
            "{}. Received an error from GitHub",
            message
        ),
        octocrab::Error::UriParse { source, .. } => error!(
            error_message = source.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        octocrab::Error::Uri { source, .. } => error!(
            error_message = source.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        octocrab::Error::InvalidHeaderValue { source, .. } => error!(
            error_message = source.to_string(),
            "{}. One of the header values was invalid.",
            message
        ),
        octocrab::Error::InvalidUtf8 { source, .. } => error!(
            error_message = source.to_string(),
            "{}. The message wasn't valid UTF-8.",
            message,
        ),
        _ => error!(error_message = e.to_string(), "{}", message),
    };
}
