//! Conversion of desired and observed repositories into comparable form.
//!
//! Desired values come from a [`RepositorySpec`]; fields left out of the spec
//! become [`Setting::Unset`]. Observed values come from the platform and are
//! always explicit, with the platform's documented default standing in for
//! anything the platform leaves out.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use config_manager::settings::{
    AccessListConfig, BranchProtectionRuleConfig, BypassActorConfig, PullRequestReviewsConfig,
    RulesetConfig, StatusChecksConfig, WebhookConfig,
};
use config_manager::{BasicConfigurationValidator, ConfigurationValidator, RepositorySpec, Role};
use github_client::{
    BranchProtection, BypassActor, BypassActorType, BypassMode, Collaborator, PrincipalRefs,
    PullRequestReviewEnforcement, RepositoryRuleset, RequiredStatusChecks, RulesetEnforcement,
    RulesetRule, RulesetTarget, TeamPermission, Webhook,
};
use tracing::warn;

use crate::errors::{ReconcileError, ReconcileResult};
use crate::fetcher::{ObservedRepository, ProtectedBranch};
use crate::state::{
    BypassEntry, GrantedRole, IdentityKey, NameSet, NormalizedBranchProtection,
    NormalizedRepository, NormalizedRuleset, NormalizedWebhook, PermissionEntry, PrincipalSet,
    PullRequestReviews, RepositoryFields, RuleToggles, Setting, StatusChecks,
};

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod tests;

/// Content type GitHub stores when a webhook is created without one.
pub const DEFAULT_WEBHOOK_CONTENT_TYPE: &str = "form";

/// Validates a repository specification and converts it into desired state.
///
/// # Errors
///
/// Returns `ReconcileError::MalformedInput` when the spec fails validation, for
/// example when an identity appears twice in one collection.
pub fn normalize_desired(spec: &RepositorySpec) -> ReconcileResult<NormalizedRepository> {
    let validation = BasicConfigurationValidator::new().validate_repository_spec(spec);
    if !validation.is_valid() {
        return Err(ReconcileError::MalformedInput {
            reason: validation.summary(),
        });
    }

    Ok(NormalizedRepository {
        name: spec.name.clone(),
        fields: RepositoryFields {
            description: spec.description.clone().into(),
            archived: spec.archived.into(),
            private: spec.private.into(),
            is_template: spec.is_template.into(),
        },
        users: spec
            .permissions
            .users
            .iter()
            .map(|u| PermissionEntry::new(&u.user, u.role))
            .collect(),
        teams: spec
            .permissions
            .teams
            .iter()
            .map(|t| PermissionEntry::new(&t.team, t.role))
            .collect(),
        webhooks: spec.webhooks.iter().map(desired_webhook).collect(),
        branch_protections: spec
            .branch_protection_rules
            .iter()
            .map(desired_branch_protection)
            .collect(),
        rulesets: spec
            .rulesets
            .iter()
            .map(desired_ruleset)
            .collect::<ReconcileResult<Vec<_>>>()?,
        existing_branches: BTreeSet::new(),
    })
}

fn desired_webhook(config: &WebhookConfig) -> NormalizedWebhook {
    NormalizedWebhook {
        key: IdentityKey::new(&config.url),
        url: config.url.clone(),
        id: None,
        content_type: config.content_type.clone().into(),
        active: config.active.into(),
        insecure_ssl: config.insecure_ssl.into(),
        events: Setting::from(
            config
                .events
                .as_ref()
                .map(|events| events.iter().cloned().collect::<BTreeSet<_>>()),
        ),
        secret: config.secret.clone(),
    }
}

fn desired_branch_protection(config: &BranchProtectionRuleConfig) -> NormalizedBranchProtection {
    NormalizedBranchProtection {
        key: IdentityKey::new(&config.branch),
        branch: config.branch.clone(),
        enforce_admins: config.enforce_admins.into(),
        required_linear_history: config.required_linear_history.into(),
        allow_force_pushes: config.allow_force_pushes.into(),
        allow_deletions: config.allow_deletions.into(),
        required_conversation_resolution: config.required_conversation_resolution.into(),
        lock_branch: config.lock_branch.into(),
        allow_fork_syncing: config.allow_fork_syncing.into(),
        required_signatures: config.required_signatures.into(),
        required_status_checks: config
            .required_status_checks
            .as_ref()
            .map(desired_status_checks)
            .into(),
        restrictions: config
            .restrictions
            .as_ref()
            .map(|list| principals_from_config(list).non_empty())
            .into(),
        required_pull_request_reviews: config
            .required_pull_request_reviews
            .as_ref()
            .map(|reviews| Some(desired_reviews(reviews)))
            .into(),
    }
}

fn desired_status_checks(config: &StatusChecksConfig) -> Option<StatusChecks> {
    if config.checks.is_empty() && config.strict != Some(true) {
        return None;
    }

    Some(StatusChecks {
        strict: config.strict.into(),
        checks: config
            .checks
            .iter()
            .map(|check| (check.context.clone(), Setting::from(check.app_id)))
            .collect(),
    })
}

fn desired_reviews(config: &PullRequestReviewsConfig) -> PullRequestReviews {
    PullRequestReviews {
        dismissal_restrictions: config
            .dismissal_restrictions
            .as_ref()
            .map(|list| principals_from_config(list).non_empty())
            .into(),
        bypass_pull_request_allowances: config
            .bypass_pull_request_allowances
            .as_ref()
            .map(|list| principals_from_config(list).non_empty())
            .into(),
        dismiss_stale_reviews: config.dismiss_stale_reviews.into(),
        require_code_owner_reviews: config.require_code_owner_reviews.into(),
        required_approving_review_count: config.required_approving_review_count.into(),
        require_last_push_approval: config.require_last_push_approval.into(),
    }
}

fn principals_from_config(config: &AccessListConfig) -> PrincipalSet {
    PrincipalSet {
        users: config.users.iter().collect(),
        teams: config.teams.iter().collect(),
        apps: config.apps.iter().collect(),
    }
}

fn desired_ruleset(config: &RulesetConfig) -> ReconcileResult<NormalizedRuleset> {
    let target = config
        .target
        .as_deref()
        .map(|t| parse::<RulesetTarget>(t, &config.name))
        .transpose()?;
    let enforcement = config
        .enforcement
        .as_deref()
        .map(|e| parse::<RulesetEnforcement>(e, &config.name))
        .transpose()?;
    let bypass_actors = config
        .bypass_actors
        .as_ref()
        .map(|actors| {
            actors
                .iter()
                .map(|actor| desired_bypass_actor(actor, &config.name))
                .collect::<ReconcileResult<BTreeSet<_>>>()
        })
        .transpose()?;

    let ref_name = config.conditions.as_ref().and_then(|c| c.ref_name.as_ref());
    let rules = config
        .rules
        .as_ref()
        .map(|rules| RuleToggles {
            creation: rules.creation.into(),
            deletion: rules.deletion.into(),
            update: rules.update.into(),
            required_linear_history: rules.required_linear_history.into(),
            required_signatures: rules.required_signatures.into(),
            non_fast_forward: rules.non_fast_forward.into(),
        })
        .unwrap_or_default();

    Ok(NormalizedRuleset {
        key: IdentityKey::new(&config.name),
        name: config.name.clone(),
        id: None,
        target: target.into(),
        enforcement: enforcement.into(),
        include: Setting::from(
            ref_name.map(|r| r.include.iter().cloned().collect::<BTreeSet<_>>()),
        ),
        exclude: Setting::from(
            ref_name.map(|r| r.exclude.iter().cloned().collect::<BTreeSet<_>>()),
        ),
        bypass_actors: bypass_actors.into(),
        rules,
        other_rules: Vec::new(),
    })
}

fn desired_bypass_actor(config: &BypassActorConfig, ruleset: &str) -> ReconcileResult<BypassEntry> {
    Ok(BypassEntry {
        actor_id: config.actor_id,
        actor_type: parse::<BypassActorType>(&config.actor_type, ruleset)?,
        bypass_mode: config
            .bypass_mode
            .as_deref()
            .map(|mode| parse::<BypassMode>(mode, ruleset))
            .transpose()?
            .unwrap_or_default(),
    })
}

fn parse<T: FromStr<Err = String>>(value: &str, ruleset: &str) -> ReconcileResult<T> {
    value
        .parse()
        .map_err(|reason| ReconcileError::MalformedInput {
            reason: format!("ruleset '{ruleset}': {reason}"),
        })
}

/// Converts a fetched repository snapshot into observed state.
pub fn normalize_observed(observed: &ObservedRepository) -> NormalizedRepository {
    let repository = &observed.repository;

    NormalizedRepository {
        name: repository.name.clone(),
        fields: RepositoryFields {
            description: Setting::Explicit(repository.description.clone().unwrap_or_default()),
            archived: Setting::Explicit(repository.archived),
            private: Setting::Explicit(repository.private),
            is_template: Setting::Explicit(repository.is_template),
        },
        users: observed.collaborators.iter().map(observed_collaborator).collect(),
        teams: observed.teams.iter().map(observed_team).collect(),
        webhooks: observed.webhooks.iter().map(observed_webhook).collect(),
        branch_protections: observed
            .branch_protections
            .iter()
            .map(observed_branch_protection)
            .collect(),
        rulesets: observed
            .rulesets
            .iter()
            .map(observed_ruleset)
            .collect(),
        existing_branches: observed
            .branches
            .iter()
            .map(|branch| IdentityKey::new(&branch.name))
            .collect(),
    }
}

fn observed_collaborator(collaborator: &Collaborator) -> PermissionEntry {
    let role = collaborator
        .permissions
        .highest()
        .or(collaborator.role_name.as_deref())
        .and_then(|name| Role::from_str(name).ok());

    let role = role.map(GrantedRole::Base).unwrap_or_else(|| {
        warn!(
            user = %collaborator.login,
            role_name = ?collaborator.role_name,
            "Collaborator has no recognized role"
        );
        GrantedRole::Unrecognized(collaborator.role_name.clone())
    });
    PermissionEntry::with_role(&collaborator.login, role)
}

fn observed_team(team: &TeamPermission) -> PermissionEntry {
    let role = team
        .permission
        .as_deref()
        .and_then(|name| Role::from_str(name).ok())
        .or_else(|| {
            team.permissions
                .and_then(|flags| flags.highest())
                .and_then(|name| Role::from_str(name).ok())
        });

    let role = role.map(GrantedRole::Base).unwrap_or_else(|| {
        warn!(
            team = %team.slug,
            permission = ?team.permission,
            "Team has no recognized role"
        );
        GrantedRole::Unrecognized(team.permission.clone())
    });
    PermissionEntry::with_role(&team.slug, role)
}

fn observed_webhook(webhook: &Webhook) -> NormalizedWebhook {
    NormalizedWebhook {
        key: IdentityKey::new(&webhook.config.url),
        url: webhook.config.url.clone(),
        id: Some(webhook.id),
        content_type: Setting::Explicit(
            webhook
                .config
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_WEBHOOK_CONTENT_TYPE.to_string()),
        ),
        active: Setting::Explicit(webhook.active),
        insecure_ssl: Setting::Explicit(webhook.config.insecure_ssl.unwrap_or(false)),
        events: Setting::Explicit(webhook.events.iter().cloned().collect()),
        secret: None,
    }
}

fn observed_branch_protection(protected: &ProtectedBranch) -> NormalizedBranchProtection {
    let protection: &BranchProtection = &protected.protection;
    let enabled = |setting: Option<github_client::EnabledSetting>| {
        Setting::Explicit(setting.is_some_and(|s| s.enabled))
    };

    NormalizedBranchProtection {
        key: IdentityKey::new(&protected.branch),
        branch: protected.branch.clone(),
        enforce_admins: enabled(protection.enforce_admins),
        required_linear_history: enabled(protection.required_linear_history),
        allow_force_pushes: enabled(protection.allow_force_pushes),
        allow_deletions: enabled(protection.allow_deletions),
        required_conversation_resolution: enabled(protection.required_conversation_resolution),
        lock_branch: enabled(protection.lock_branch),
        allow_fork_syncing: enabled(protection.allow_fork_syncing),
        required_signatures: enabled(protection.required_signatures),
        required_status_checks: Setting::Explicit(
            protection
                .required_status_checks
                .as_ref()
                .and_then(observed_status_checks),
        ),
        restrictions: Setting::Explicit(observed_principals(protection.restrictions.as_ref())),
        required_pull_request_reviews: Setting::Explicit(
            protection
                .required_pull_request_reviews
                .as_ref()
                .map(observed_reviews),
        ),
    }
}

fn observed_status_checks(checks: &RequiredStatusChecks) -> Option<StatusChecks> {
    // Older protections only report the deprecated `contexts` list.
    let checks_by_context: BTreeMap<String, Setting<i64>> = if checks.checks.is_empty() {
        checks
            .contexts
            .iter()
            .map(|context| (context.clone(), Setting::Unset))
            .collect()
    } else {
        checks
            .checks
            .iter()
            .map(|check| (check.context.clone(), Setting::from(check.app_id)))
            .collect()
    };

    if checks.strict || !checks_by_context.is_empty() {
        Some(StatusChecks {
            strict: Setting::Explicit(checks.strict),
            checks: checks_by_context,
        })
    } else {
        None
    }
}

fn observed_reviews(reviews: &PullRequestReviewEnforcement) -> PullRequestReviews {
    PullRequestReviews {
        dismissal_restrictions: Setting::Explicit(observed_principals(
            reviews.dismissal_restrictions.as_ref(),
        )),
        bypass_pull_request_allowances: Setting::Explicit(observed_principals(
            reviews.bypass_pull_request_allowances.as_ref(),
        )),
        dismiss_stale_reviews: Setting::Explicit(reviews.dismiss_stale_reviews),
        require_code_owner_reviews: Setting::Explicit(reviews.require_code_owner_reviews),
        required_approving_review_count: Setting::Explicit(reviews.required_approving_review_count),
        require_last_push_approval: Setting::Explicit(reviews.require_last_push_approval),
    }
}

fn observed_principals(refs: Option<&PrincipalRefs>) -> Option<PrincipalSet> {
    refs.and_then(|refs| {
        PrincipalSet {
            users: refs.users.iter().map(|u| &u.login).collect::<NameSet>(),
            teams: refs.teams.iter().map(|t| &t.slug).collect(),
            apps: refs.apps.iter().map(|a| &a.slug).collect(),
        }
        .non_empty()
    })
}

fn observed_ruleset(ruleset: &RepositoryRuleset) -> NormalizedRuleset {
    let mut rules = RuleToggles {
        creation: Setting::Explicit(false),
        deletion: Setting::Explicit(false),
        update: Setting::Explicit(false),
        required_linear_history: Setting::Explicit(false),
        required_signatures: Setting::Explicit(false),
        non_fast_forward: Setting::Explicit(false),
    };
    let mut other_rules = Vec::new();

    for rule in &ruleset.rules {
        if let Some(toggle) = rules.toggle_mut(rule.rule_type()) {
            *toggle = Setting::Explicit(true);
            continue;
        }

        if let RulesetRule::Other(other) = rule {
            warn!(
                ruleset = %ruleset.name,
                rule_type = %other.rule_type,
                "Preserving ruleset rule of unknown type"
            );
        }
        other_rules.push(rule.clone());
    }

    let (include, exclude): (BTreeSet<String>, BTreeSet<String>) = ruleset
        .conditions
        .as_ref()
        .map(|c| {
            (
                c.ref_name.include.iter().cloned().collect(),
                c.ref_name.exclude.iter().cloned().collect(),
            )
        })
        .unwrap_or_default();

    NormalizedRuleset {
        key: IdentityKey::new(&ruleset.name),
        name: ruleset.name.clone(),
        id: ruleset.id,
        target: Setting::Explicit(ruleset.target.unwrap_or(RulesetTarget::Branch)),
        enforcement: Setting::Explicit(ruleset.enforcement),
        include: Setting::Explicit(include),
        exclude: Setting::Explicit(exclude),
        bypass_actors: Setting::Explicit(
            ruleset.bypass_actors.iter().map(observed_bypass_actor).collect(),
        ),
        rules,
        other_rules,
    }
}

fn observed_bypass_actor(actor: &BypassActor) -> BypassEntry {
    BypassEntry {
        actor_id: actor.actor_id,
        actor_type: actor.actor_type,
        bypass_mode: actor.bypass_mode,
    }
}
