//! An in-memory platform and the canonical fixtures shared by the reconciler tests.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use config_manager::settings::{
    AccessListConfig, BranchProtectionRuleConfig, BypassActorConfig, PermissionsConfig,
    PullRequestReviewsConfig, RefNameConditionConfig, RulesConfig, RulesetConditionsConfig,
    RulesetConfig, StatusCheckConfig, StatusChecksConfig, TeamPermissionConfig,
    UserPermissionConfig, WebhookConfig,
};
use config_manager::{RepositorySpec, Role};
use github_client::{
    Branch, BranchProtection, BranchProtectionRequest, BypassActor, BypassActorType, BypassMode,
    Collaborator, EnabledSetting, Error, PermissionFlags, PrincipalNames, PrincipalRefs,
    PullRequestReviewEnforcement, RefNameCondition, Repository, RepositoryClient,
    RepositoryCreatePayload, RepositoryRuleset, RepositoryUpdate, RequiredStatusChecks, Rule,
    RulesetConditions, RulesetEnforcement, RulesetRule, RulesetTarget, SlugRef, StatusCheck,
    TeamPermission, UserRef, Webhook, WebhookDetails, WebhookRequest,
};
use tokio_util::sync::CancellationToken;

use crate::fetcher::{ObservedRepository, ProtectedBranch};

pub const OWNER: &str = "test-org";

const ROLE_ORDER: [&str; 5] = ["pull", "triage", "push", "maintain", "admin"];

/// Values the canonical desired and observed repositories are built from.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub repo: String,
    pub description: String,
    pub private: bool,
    pub user1: String,
    pub user1_role: Role,
    pub user2: String,
    pub user2_role: Role,
    pub team1: String,
    pub team1_role: Role,
    pub team2: String,
    pub team2_role: Role,
    pub app: String,
    pub webhook_id: u64,
    pub webhook_url: String,
    pub webhook_content_type: String,
    pub webhook_events: Vec<String>,
    pub branch: String,
    pub status_check: String,
    pub ruleset_id: u64,
    pub ruleset_name: String,
    pub bypass_actor_id: u64,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            repo: "test-repo".to_string(),
            description: "desc".to_string(),
            private: true,
            user1: "test-user-1".to_string(),
            user1_role: Role::Admin,
            user2: "test-user-2".to_string(),
            user2_role: Role::Pull,
            team1: "test-team-1".to_string(),
            team1_role: Role::Admin,
            team2: "test-team-2".to_string(),
            team2_role: Role::Pull,
            app: "my-awesome-app".to_string(),
            webhook_id: 1,
            webhook_url: "https://example.org/webhook".to_string(),
            webhook_content_type: "json".to_string(),
            webhook_events: vec!["push".to_string(), "workflow_job".to_string()],
            branch: "main".to_string(),
            status_check: "terraform_validate".to_string(),
            ruleset_id: 123,
            ruleset_name: "test-ruleset-1".to_string(),
            bypass_actor_id: 123,
        }
    }
}

/// The desired specification. Principal names are upper-cased, as a user might
/// type them, so every comparison exercises case folding.
pub fn desired_spec(config: &FixtureConfig) -> RepositorySpec {
    let access = AccessListConfig {
        users: vec![config.user1.to_uppercase()],
        teams: vec![config.team1.to_uppercase()],
        apps: vec![config.app.to_uppercase()],
    };

    RepositorySpec {
        name: config.repo.clone(),
        description: Some(config.description.clone()),
        archived: Some(false),
        private: Some(config.private),
        is_template: Some(false),
        permissions: PermissionsConfig {
            users: vec![
                UserPermissionConfig {
                    user: config.user1.to_uppercase(),
                    role: config.user1_role,
                },
                UserPermissionConfig {
                    user: config.user2.to_uppercase(),
                    role: config.user2_role,
                },
            ],
            teams: vec![
                TeamPermissionConfig {
                    team: config.team1.to_uppercase(),
                    role: config.team1_role,
                },
                TeamPermissionConfig {
                    team: config.team2.to_uppercase(),
                    role: config.team2_role,
                },
            ],
        },
        webhooks: vec![WebhookConfig {
            url: config.webhook_url.clone(),
            content_type: Some(config.webhook_content_type.clone()),
            secret: None,
            active: Some(true),
            insecure_ssl: Some(false),
            events: Some(config.webhook_events.clone()),
        }],
        branch_protection_rules: vec![BranchProtectionRuleConfig {
            branch: config.branch.clone(),
            enforce_admins: Some(true),
            required_linear_history: Some(true),
            allow_force_pushes: Some(false),
            allow_deletions: Some(false),
            required_conversation_resolution: Some(true),
            lock_branch: Some(false),
            allow_fork_syncing: Some(false),
            required_signatures: Some(false),
            required_status_checks: Some(StatusChecksConfig {
                strict: Some(true),
                checks: vec![StatusCheckConfig {
                    context: config.status_check.clone(),
                    app_id: None,
                }],
            }),
            restrictions: Some(access.clone()),
            required_pull_request_reviews: Some(PullRequestReviewsConfig {
                dismissal_restrictions: Some(access.clone()),
                bypass_pull_request_allowances: Some(access),
                ..Default::default()
            }),
        }],
        rulesets: vec![RulesetConfig {
            name: config.ruleset_name.clone(),
            target: Some("branch".to_string()),
            enforcement: Some("active".to_string()),
            conditions: Some(RulesetConditionsConfig {
                ref_name: Some(RefNameConditionConfig {
                    include: vec!["include".to_string()],
                    exclude: vec!["exclude".to_string()],
                }),
            }),
            bypass_actors: Some(vec![BypassActorConfig {
                actor_id: Some(config.bypass_actor_id),
                actor_type: "Team".to_string(),
                bypass_mode: Some("always".to_string()),
            }]),
            rules: Some(RulesConfig {
                creation: Some(true),
                deletion: Some(true),
                update: Some(true),
                required_linear_history: Some(true),
                required_signatures: Some(true),
                non_fast_forward: Some(true),
            }),
        }],
    }
}

/// The platform's view of a repository that matches [`desired_spec`].
pub fn observed_repository(config: &FixtureConfig) -> ObservedRepository {
    let refs = PrincipalRefs {
        users: vec![UserRef {
            login: config.user1.clone(),
        }],
        teams: vec![SlugRef {
            slug: config.team1.clone(),
        }],
        apps: vec![SlugRef {
            slug: config.app.clone(),
        }],
    };
    let enabled = |enabled: bool| Some(EnabledSetting { enabled });

    ObservedRepository {
        repository: Repository {
            id: Some(1),
            name: config.repo.clone(),
            full_name: Some(format!("{OWNER}/{}", config.repo)),
            description: Some(config.description.clone()),
            private: config.private,
            archived: false,
            is_template: false,
            fork: false,
            default_branch: Some(config.branch.clone()),
        },
        collaborators: vec![
            collaborator(&config.user1, config.user1_role.as_str()),
            collaborator(&config.user2, config.user2_role.as_str()),
        ],
        teams: vec![
            team(&config.team1, config.team1_role.as_str()),
            team(&config.team2, config.team2_role.as_str()),
        ],
        webhooks: vec![Webhook {
            id: config.webhook_id,
            active: true,
            events: config.webhook_events.clone(),
            config: WebhookDetails {
                url: config.webhook_url.clone(),
                content_type: Some(config.webhook_content_type.clone()),
                secret: None,
                insecure_ssl: Some(false),
            },
        }],
        branches: vec![Branch {
            name: config.branch.clone(),
            protected: true,
        }],
        branch_protections: vec![ProtectedBranch {
            branch: config.branch.clone(),
            protection: BranchProtection {
                required_status_checks: Some(RequiredStatusChecks {
                    strict: true,
                    contexts: vec![config.status_check.clone()],
                    checks: vec![StatusCheck {
                        context: config.status_check.clone(),
                        app_id: None,
                    }],
                }),
                enforce_admins: enabled(true),
                required_pull_request_reviews: Some(PullRequestReviewEnforcement {
                    dismissal_restrictions: Some(refs.clone()),
                    bypass_pull_request_allowances: Some(refs.clone()),
                    ..Default::default()
                }),
                restrictions: Some(refs),
                required_linear_history: enabled(true),
                allow_force_pushes: enabled(false),
                allow_deletions: enabled(false),
                required_conversation_resolution: enabled(true),
                lock_branch: enabled(false),
                allow_fork_syncing: enabled(false),
                required_signatures: enabled(false),
            },
        }],
        rulesets: vec![RepositoryRuleset {
            id: Some(config.ruleset_id),
            name: config.ruleset_name.clone(),
            target: Some(RulesetTarget::Branch),
            enforcement: RulesetEnforcement::Active,
            bypass_actors: vec![BypassActor {
                actor_id: Some(config.bypass_actor_id),
                actor_type: BypassActorType::Team,
                bypass_mode: BypassMode::Always,
            }],
            conditions: Some(RulesetConditions {
                ref_name: RefNameCondition {
                    include: vec!["include".to_string()],
                    exclude: vec!["exclude".to_string()],
                },
            }),
            rules: [
                Rule::Creation,
                Rule::Deletion,
                Rule::Update,
                Rule::RequiredLinearHistory,
                Rule::RequiredSignatures,
                Rule::NonFastForward,
            ]
            .into_iter()
            .map(RulesetRule::Known)
            .collect(),
            source_type: Some("Repository".to_string()),
        }],
    }
}

/// A platform holding a repository that already matches [`desired_spec`].
pub fn converged_client(config: &FixtureConfig) -> MockRepositoryClient {
    MockRepositoryClient::with_observed(observed_repository(config))
}

pub fn collaborator(login: &str, role: &str) -> Collaborator {
    Collaborator {
        login: login.to_string(),
        permissions: flags_for(role),
        role_name: Some(role.to_string()),
    }
}

pub fn team(slug: &str, role: &str) -> TeamPermission {
    TeamPermission {
        slug: slug.to_string(),
        name: None,
        permission: Some(role.to_string()),
        permissions: Some(flags_for(role)),
    }
}

/// The permission map GitHub reports for a role: the role and everything below it.
pub fn flags_for(role: &str) -> PermissionFlags {
    let rank = ROLE_ORDER
        .iter()
        .position(|r| *r == role)
        .map_or(0, |index| index + 1);

    PermissionFlags {
        pull: rank >= 1,
        triage: rank >= 2,
        push: rank >= 3,
        maintain: rank >= 4,
        admin: rank >= 5,
    }
}

#[derive(Debug, Default)]
struct PlatformState {
    repository: Option<Repository>,
    collaborators: Vec<Collaborator>,
    teams: Vec<TeamPermission>,
    webhooks: Vec<Webhook>,
    branches: Vec<Branch>,
    protections: BTreeMap<String, BranchProtection>,
    rulesets: Vec<RepositoryRuleset>,
    next_id: u64,
}

impl PlatformState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`RepositoryClient`] backed by in-memory state.
///
/// Mutations change the state the way GitHub would, so a converge pass can be
/// followed by an observe pass. Every call is recorded by method name.
#[derive(Default)]
pub struct MockRepositoryClient {
    state: Mutex<PlatformState>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, VecDeque<Error>>>,
    stalls: Mutex<HashSet<&'static str>>,
    cancel_on: Mutex<HashMap<&'static str, CancellationToken>>,
}

impl MockRepositoryClient {
    /// A platform without the repository.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observed(observed: ObservedRepository) -> Self {
        let client = Self::new();
        {
            let mut state = client.state.lock().unwrap();
            state.repository = Some(observed.repository);
            state.collaborators = observed.collaborators;
            state.teams = observed.teams;
            state.webhooks = observed.webhooks;
            state.branches = observed.branches;
            state.protections = observed
                .branch_protections
                .into_iter()
                .map(|p| (p.branch, p.protection))
                .collect();
            state.next_id = observed
                .rulesets
                .iter()
                .filter_map(|r| r.id)
                .chain(state.webhooks.iter().map(|w| w.id))
                .max()
                .unwrap_or(0);
            state.rulesets = observed.rulesets;
        }
        client
    }

    /// Makes the next call of `method` fail with `error`. Queued failures are
    /// consumed in order.
    pub fn fail_next(&self, method: &'static str, error: Error) {
        self.failures
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(error);
    }

    /// Makes every call of `method` wait forever.
    pub fn stall(&self, method: &'static str) {
        self.stalls.lock().unwrap().insert(method);
    }

    /// Cancels `token` when `method` is called. The call itself succeeds.
    pub fn cancel_on(&self, method: &'static str, token: CancellationToken) {
        self.cancel_on.lock().unwrap().insert(method, token);
    }

    pub fn add_branch(&self, name: &str) {
        self.state.lock().unwrap().branches.push(Branch {
            name: name.to_string(),
            protected: false,
        });
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// The recorded calls that change state.
    pub fn mutations(&self) -> Vec<&'static str> {
        self.calls()
            .into_iter()
            .filter(|method| !method.starts_with("get_") && !method.starts_with("list_"))
            .collect()
    }

    pub fn repository(&self) -> Option<Repository> {
        self.state.lock().unwrap().repository.clone()
    }

    pub fn collaborators(&self) -> Vec<Collaborator> {
        self.state.lock().unwrap().collaborators.clone()
    }

    pub fn webhooks(&self) -> Vec<Webhook> {
        self.state.lock().unwrap().webhooks.clone()
    }

    pub fn protection(&self, branch: &str) -> Option<BranchProtection> {
        self.state.lock().unwrap().protections.get(branch).cloned()
    }

    pub fn rulesets(&self) -> Vec<RepositoryRuleset> {
        self.state.lock().unwrap().rulesets.clone()
    }

    async fn begin(&self, method: &'static str) -> Result<(), Error> {
        self.calls.lock().unwrap().push(method);

        let token = self.cancel_on.lock().unwrap().get(method).cloned();
        if let Some(token) = token {
            token.cancel();
        }

        let stalled = self.stalls.lock().unwrap().contains(method);
        if stalled {
            std::future::pending::<()>().await;
        }

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn with_repository<T>(
        &self,
        f: impl FnOnce(&mut PlatformState) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut state = self.state.lock().unwrap();
        if state.repository.is_none() {
            return Err(Error::NotFound);
        }
        f(&mut state)
    }
}

fn same(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn refs_from_names(names: &PrincipalNames) -> PrincipalRefs {
    PrincipalRefs {
        users: names
            .users
            .iter()
            .map(|login| UserRef {
                login: login.clone(),
            })
            .collect(),
        teams: names
            .teams
            .iter()
            .map(|slug| SlugRef { slug: slug.clone() })
            .collect(),
        apps: names
            .apps
            .iter()
            .map(|slug| SlugRef { slug: slug.clone() })
            .collect(),
    }
}

/// What GitHub reports back after a protection was written.
fn protection_from_request(request: &BranchProtectionRequest) -> BranchProtection {
    let enabled = |value: Option<bool>| value.map(|enabled| EnabledSetting { enabled });

    BranchProtection {
        required_status_checks: request.required_status_checks.as_ref().map(|checks| {
            RequiredStatusChecks {
                strict: checks.strict,
                contexts: checks.checks.iter().map(|c| c.context.clone()).collect(),
                checks: checks.checks.clone(),
            }
        }),
        enforce_admins: enabled(request.enforce_admins),
        required_pull_request_reviews: request.required_pull_request_reviews.as_ref().map(
            |reviews| PullRequestReviewEnforcement {
                dismissal_restrictions: reviews.dismissal_restrictions.as_ref().map(refs_from_names),
                bypass_pull_request_allowances: reviews
                    .bypass_pull_request_allowances
                    .as_ref()
                    .map(refs_from_names),
                dismiss_stale_reviews: reviews.dismiss_stale_reviews,
                require_code_owner_reviews: reviews.require_code_owner_reviews,
                required_approving_review_count: reviews.required_approving_review_count,
                require_last_push_approval: reviews.require_last_push_approval,
            },
        ),
        restrictions: request.restrictions.as_ref().map(refs_from_names),
        required_linear_history: enabled(request.required_linear_history),
        allow_force_pushes: enabled(request.allow_force_pushes),
        allow_deletions: enabled(request.allow_deletions),
        required_conversation_resolution: enabled(request.required_conversation_resolution),
        lock_branch: enabled(request.lock_branch),
        allow_fork_syncing: enabled(request.allow_fork_syncing),
        required_signatures: enabled(request.required_signatures),
    }
}

#[async_trait]
impl RepositoryClient for MockRepositoryClient {
    async fn get_repository(&self, _owner: &str, _repo: &str) -> Result<Repository, Error> {
        self.begin("get_repository").await?;
        self.state
            .lock()
            .unwrap()
            .repository
            .clone()
            .ok_or(Error::NotFound)
    }

    async fn create_org_repository(
        &self,
        org_name: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        self.begin("create_org_repository").await?;
        let mut state = self.state.lock().unwrap();
        if state.repository.is_some() {
            return Err(Error::ValidationFailed(
                "name already exists on this account".to_string(),
            ));
        }

        let repository = Repository {
            id: Some(state.allocate_id()),
            name: payload.name.clone(),
            full_name: Some(format!("{org_name}/{}", payload.name)),
            description: payload.description.clone(),
            private: payload.private.unwrap_or(false),
            archived: false,
            is_template: payload.is_template.unwrap_or(false),
            fork: false,
            default_branch: None,
        };
        state.repository = Some(repository.clone());
        Ok(repository)
    }

    async fn update_repository(
        &self,
        _owner: &str,
        _repo: &str,
        update: &RepositoryUpdate,
    ) -> Result<Repository, Error> {
        self.begin("update_repository").await?;
        self.with_repository(|state| {
            let repository = state.repository.as_mut().ok_or(Error::NotFound)?;
            if let Some(description) = &update.description {
                repository.description = Some(description.clone());
            }
            if let Some(private) = update.private {
                repository.private = private;
            }
            if let Some(archived) = update.archived {
                repository.archived = archived;
            }
            if let Some(is_template) = update.is_template {
                repository.is_template = is_template;
            }
            Ok(repository.clone())
        })
    }

    async fn list_collaborators(&self, _owner: &str, _repo: &str) -> Result<Vec<Collaborator>, Error> {
        self.begin("list_collaborators").await?;
        self.with_repository(|state| Ok(state.collaborators.clone()))
    }

    async fn add_collaborator(
        &self,
        _owner: &str,
        _repo: &str,
        user: &str,
        permission: &str,
    ) -> Result<(), Error> {
        self.begin("add_collaborator").await?;
        self.with_repository(|state| {
            state.collaborators.retain(|c| !same(&c.login, user));
            state.collaborators.push(collaborator(user, permission));
            Ok(())
        })
    }

    async fn remove_collaborator(&self, _owner: &str, _repo: &str, user: &str) -> Result<(), Error> {
        self.begin("remove_collaborator").await?;
        self.with_repository(|state| {
            state.collaborators.retain(|c| !same(&c.login, user));
            Ok(())
        })
    }

    async fn list_repository_teams(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> Result<Vec<TeamPermission>, Error> {
        self.begin("list_repository_teams").await?;
        self.with_repository(|state| Ok(state.teams.clone()))
    }

    async fn add_team_permission(
        &self,
        _owner: &str,
        _repo: &str,
        team_slug: &str,
        permission: &str,
    ) -> Result<(), Error> {
        self.begin("add_team_permission").await?;
        self.with_repository(|state| {
            state.teams.retain(|t| !same(&t.slug, team_slug));
            state.teams.push(team(team_slug, permission));
            Ok(())
        })
    }

    async fn remove_team_permission(
        &self,
        _owner: &str,
        _repo: &str,
        team_slug: &str,
    ) -> Result<(), Error> {
        self.begin("remove_team_permission").await?;
        self.with_repository(|state| {
            state.teams.retain(|t| !same(&t.slug, team_slug));
            Ok(())
        })
    }

    async fn list_webhooks(&self, _owner: &str, _repo: &str) -> Result<Vec<Webhook>, Error> {
        self.begin("list_webhooks").await?;
        self.with_repository(|state| Ok(state.webhooks.clone()))
    }

    async fn create_webhook(
        &self,
        _owner: &str,
        _repo: &str,
        request: &WebhookRequest,
    ) -> Result<Webhook, Error> {
        self.begin("create_webhook").await?;
        self.with_repository(|state| {
            let webhook = Webhook {
                id: state.allocate_id(),
                active: request.active.unwrap_or(true),
                events: request
                    .events
                    .clone()
                    .unwrap_or_else(|| vec!["push".to_string()]),
                config: request.config.clone().unwrap_or_default(),
            };
            state.webhooks.push(webhook.clone());
            Ok(webhook)
        })
    }

    async fn update_webhook(
        &self,
        _owner: &str,
        _repo: &str,
        hook_id: u64,
        request: &WebhookRequest,
    ) -> Result<Webhook, Error> {
        self.begin("update_webhook").await?;
        self.with_repository(|state| {
            let webhook = state
                .webhooks
                .iter_mut()
                .find(|w| w.id == hook_id)
                .ok_or(Error::NotFound)?;
            if let Some(active) = request.active {
                webhook.active = active;
            }
            if let Some(events) = &request.events {
                webhook.events = events.clone();
            }
            if let Some(config) = &request.config {
                // GitHub drops the stored secret whenever the config is replaced.
                webhook.config = WebhookDetails {
                    url: config.url.clone(),
                    content_type: config
                        .content_type
                        .clone()
                        .or_else(|| webhook.config.content_type.clone()),
                    secret: config.secret.clone(),
                    insecure_ssl: config.insecure_ssl.or(webhook.config.insecure_ssl),
                };
            }
            Ok(webhook.clone())
        })
    }

    async fn delete_webhook(&self, _owner: &str, _repo: &str, hook_id: u64) -> Result<(), Error> {
        self.begin("delete_webhook").await?;
        self.with_repository(|state| {
            let before = state.webhooks.len();
            state.webhooks.retain(|w| w.id != hook_id);
            if state.webhooks.len() == before {
                return Err(Error::NotFound);
            }
            Ok(())
        })
    }

    async fn list_branches(&self, _owner: &str, _repo: &str) -> Result<Vec<Branch>, Error> {
        self.begin("list_branches").await?;
        self.with_repository(|state| {
            Ok(state
                .branches
                .iter()
                .map(|b| Branch {
                    name: b.name.clone(),
                    protected: state.protections.contains_key(&b.name),
                })
                .collect())
        })
    }

    async fn get_branch_protection(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, Error> {
        self.begin("get_branch_protection").await?;
        self.with_repository(|state| state.protections.get(branch).cloned().ok_or(Error::NotFound))
    }

    async fn update_branch_protection(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
        request: &BranchProtectionRequest,
    ) -> Result<(), Error> {
        self.begin("update_branch_protection").await?;
        self.with_repository(|state| {
            let name = state
                .branches
                .iter()
                .find(|b| same(&b.name, branch))
                .map(|b| b.name.clone())
                .ok_or(Error::NotFound)?;
            state
                .protections
                .insert(name, protection_from_request(request));
            Ok(())
        })
    }

    async fn delete_branch_protection(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
    ) -> Result<(), Error> {
        self.begin("delete_branch_protection").await?;
        self.with_repository(|state| {
            state
                .protections
                .remove(branch)
                .map(drop)
                .ok_or(Error::NotFound)
        })
    }

    async fn list_repository_rulesets(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> Result<Vec<RepositoryRuleset>, Error> {
        self.begin("list_repository_rulesets").await?;
        self.with_repository(|state| {
            Ok(state
                .rulesets
                .iter()
                .map(|r| RepositoryRuleset {
                    rules: Vec::new(),
                    ..r.clone()
                })
                .collect())
        })
    }

    async fn get_repository_ruleset(
        &self,
        _owner: &str,
        _repo: &str,
        ruleset_id: u64,
    ) -> Result<RepositoryRuleset, Error> {
        self.begin("get_repository_ruleset").await?;
        self.with_repository(|state| {
            state
                .rulesets
                .iter()
                .find(|r| r.id == Some(ruleset_id))
                .cloned()
                .ok_or(Error::NotFound)
        })
    }

    async fn create_repository_ruleset(
        &self,
        _owner: &str,
        _repo: &str,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error> {
        self.begin("create_repository_ruleset").await?;
        self.with_repository(|state| {
            let created = RepositoryRuleset {
                id: Some(state.allocate_id()),
                source_type: Some("Repository".to_string()),
                ..ruleset.clone()
            };
            state.rulesets.push(created.clone());
            Ok(created)
        })
    }

    async fn update_repository_ruleset(
        &self,
        _owner: &str,
        _repo: &str,
        ruleset_id: u64,
        ruleset: &RepositoryRuleset,
    ) -> Result<RepositoryRuleset, Error> {
        self.begin("update_repository_ruleset").await?;
        self.with_repository(|state| {
            let existing = state
                .rulesets
                .iter_mut()
                .find(|r| r.id == Some(ruleset_id))
                .ok_or(Error::NotFound)?;
            *existing = RepositoryRuleset {
                id: Some(ruleset_id),
                source_type: existing.source_type.clone(),
                ..ruleset.clone()
            };
            Ok(existing.clone())
        })
    }

    async fn delete_repository_ruleset(
        &self,
        _owner: &str,
        _repo: &str,
        ruleset_id: u64,
    ) -> Result<(), Error> {
        self.begin("delete_repository_ruleset").await?;
        self.with_repository(|state| {
            let before = state.rulesets.len();
            state.rulesets.retain(|r| r.id != Some(ruleset_id));
            if state.rulesets.len() == before {
                return Err(Error::NotFound);
            }
            Ok(())
        })
    }
}
