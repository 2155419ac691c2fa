//! Request payloads for planned operations.
//!
//! Branch protection and ruleset writes replace the whole remote object, so the
//! payload is the desired state laid over the observed one: anything the desired
//! side leaves unset keeps its observed value. Ruleset rules without a toggle are
//! carried over unchanged.

use github_client::{
    BranchProtectionRequest, BypassActor, PrincipalNames, PullRequestReviewsRequest,
    RepositoryCreatePayload, RepositoryRuleset, RepositoryUpdate, RequiredStatusChecksRequest,
    RefNameCondition, Rule, RulesetConditions, RulesetEnforcement, RulesetRule, RulesetTarget,
    StatusCheck, WebhookDetails, WebhookRequest,
};

use crate::state::{
    NormalizedBranchProtection, NormalizedRuleset, NormalizedWebhook, PrincipalSet,
    PullRequestReviews, RepositoryFields, Setting, StatusChecks,
};

#[cfg(test)]
#[path = "requests_tests.rs"]
mod tests;

/// GitHub only accepts `web` as the name of a repository webhook.
const WEBHOOK_NAME: &str = "web";

pub fn repository_create_payload(
    name: &str,
    fields: &RepositoryFields,
) -> RepositoryCreatePayload {
    RepositoryCreatePayload {
        name: name.to_string(),
        description: fields.description.as_option().cloned(),
        private: fields.private.as_option().copied(),
        is_template: fields.is_template.as_option().copied(),
    }
}

pub fn repository_update(fields: &RepositoryFields) -> RepositoryUpdate {
    RepositoryUpdate {
        description: fields.description.as_option().cloned(),
        private: fields.private.as_option().copied(),
        archived: fields.archived.as_option().copied(),
        is_template: fields.is_template.as_option().copied(),
    }
}

/// Builds a webhook payload. Without an observed webhook, unset fields are left
/// out so the platform applies its defaults.
///
/// An update carries `config` only when a config field changes or the secret is
/// managed, since sending it replaces a secret the spec may not know.
pub fn webhook_request(
    desired: &NormalizedWebhook,
    observed: Option<&NormalizedWebhook>,
) -> WebhookRequest {
    let send_config = observed.map_or(true, |o| {
        desired.secret.is_some()
            || !desired.content_type.accepts(&o.content_type)
            || !desired.insecure_ssl.accepts(&o.insecure_ssl)
    });

    WebhookRequest {
        name: observed.is_none().then(|| WEBHOOK_NAME.to_string()),
        active: desired
            .active
            .or_observed(observed.map(|o| &o.active))
            .copied(),
        events: desired
            .events
            .or_observed(observed.map(|o| &o.events))
            .map(|events| events.iter().cloned().collect()),
        config: send_config.then(|| WebhookDetails {
            url: desired.url.clone(),
            content_type: desired
                .content_type
                .or_observed(observed.map(|o| &o.content_type))
                .cloned(),
            secret: desired.secret.clone(),
            insecure_ssl: desired
                .insecure_ssl
                .or_observed(observed.map(|o| &o.insecure_ssl))
                .copied(),
        }),
    }
}

pub fn branch_protection_request(
    desired: &NormalizedBranchProtection,
    observed: Option<&NormalizedBranchProtection>,
) -> BranchProtectionRequest {
    BranchProtectionRequest {
        required_status_checks: nested(
            &desired.required_status_checks,
            observed.map(|o| &o.required_status_checks),
        )
        .map(|(checks, observed)| status_checks_request(checks, observed)),
        enforce_admins: merged(&desired.enforce_admins, observed.map(|o| &o.enforce_admins)),
        required_pull_request_reviews: nested(
            &desired.required_pull_request_reviews,
            observed.map(|o| &o.required_pull_request_reviews),
        )
        .map(|(reviews, observed)| reviews_request(reviews, observed)),
        restrictions: principals_request(
            &desired.restrictions,
            observed.map(|o| &o.restrictions),
        ),
        required_linear_history: merged(
            &desired.required_linear_history,
            observed.map(|o| &o.required_linear_history),
        ),
        allow_force_pushes: merged(
            &desired.allow_force_pushes,
            observed.map(|o| &o.allow_force_pushes),
        ),
        allow_deletions: merged(&desired.allow_deletions, observed.map(|o| &o.allow_deletions)),
        required_conversation_resolution: merged(
            &desired.required_conversation_resolution,
            observed.map(|o| &o.required_conversation_resolution),
        ),
        lock_branch: merged(&desired.lock_branch, observed.map(|o| &o.lock_branch)),
        allow_fork_syncing: merged(
            &desired.allow_fork_syncing,
            observed.map(|o| &o.allow_fork_syncing),
        ),
        required_signatures: merged(
            &desired.required_signatures,
            observed.map(|o| &o.required_signatures),
        ),
    }
}

fn merged(desired: &Setting<bool>, observed: Option<&Setting<bool>>) -> Option<bool> {
    desired.or_observed(observed).copied()
}

/// Resolves a nested optional object to the value to send, paired with the
/// observed value to fill its unset fields from.
fn nested<'a, T>(
    desired: &'a Setting<Option<T>>,
    observed: Option<&'a Setting<Option<T>>>,
) -> Option<(&'a T, Option<&'a T>)> {
    let observed = observed.and_then(Setting::as_option).and_then(Option::as_ref);
    match desired {
        Setting::Explicit(Some(value)) => Some((value, observed)),
        Setting::Explicit(None) => None,
        Setting::Unset => observed.map(|value| (value, None)),
    }
}

fn status_checks_request(
    desired: &StatusChecks,
    observed: Option<&StatusChecks>,
) -> RequiredStatusChecksRequest {
    RequiredStatusChecksRequest {
        strict: desired
            .strict
            .or_observed(observed.map(|o| &o.strict))
            .copied()
            .unwrap_or(false),
        checks: desired
            .checks
            .iter()
            .map(|(context, app_id)| StatusCheck {
                context: context.clone(),
                app_id: app_id
                    .or_observed(observed.and_then(|o| o.checks.get(context)))
                    .copied(),
            })
            .collect(),
    }
}

fn reviews_request(
    desired: &PullRequestReviews,
    observed: Option<&PullRequestReviews>,
) -> PullRequestReviewsRequest {
    PullRequestReviewsRequest {
        dismissal_restrictions: principals_request(
            &desired.dismissal_restrictions,
            observed.map(|o| &o.dismissal_restrictions),
        ),
        bypass_pull_request_allowances: principals_request(
            &desired.bypass_pull_request_allowances,
            observed.map(|o| &o.bypass_pull_request_allowances),
        ),
        dismiss_stale_reviews: desired
            .dismiss_stale_reviews
            .or_observed(observed.map(|o| &o.dismiss_stale_reviews))
            .copied()
            .unwrap_or(false),
        require_code_owner_reviews: desired
            .require_code_owner_reviews
            .or_observed(observed.map(|o| &o.require_code_owner_reviews))
            .copied()
            .unwrap_or(false),
        required_approving_review_count: desired
            .required_approving_review_count
            .or_observed(observed.map(|o| &o.required_approving_review_count))
            .copied()
            .unwrap_or(1),
        require_last_push_approval: desired
            .require_last_push_approval
            .or_observed(observed.map(|o| &o.require_last_push_approval))
            .copied()
            .unwrap_or(false),
    }
}

fn principals_request(
    desired: &Setting<Option<PrincipalSet>>,
    observed: Option<&Setting<Option<PrincipalSet>>>,
) -> Option<PrincipalNames> {
    desired
        .or_observed(observed)
        .and_then(Option::as_ref)
        .map(|set| PrincipalNames {
            users: set.users.names(),
            teams: set.teams.names(),
            apps: set.apps.names(),
        })
}

/// Builds a ruleset payload. Without an observed ruleset, unset fields take the
/// platform defaults: a branch target, active enforcement and no rules.
pub fn ruleset_request(
    desired: &NormalizedRuleset,
    observed: Option<&NormalizedRuleset>,
) -> RepositoryRuleset {
    let mut rules: Vec<RulesetRule> = Vec::new();
    let observed_rules = observed.map(|o| o.rules.entries());
    for (index, (rule_type, toggle)) in desired.rules.entries().into_iter().enumerate() {
        let observed_toggle = observed_rules.as_ref().map(|entries| entries[index].1);
        if toggle.or_observed(observed_toggle).copied().unwrap_or(false) {
            if let Some(rule) = boolean_rule(rule_type) {
                rules.push(RulesetRule::Known(rule));
            }
        }
    }
    if let Some(observed) = observed {
        rules.extend(observed.other_rules.iter().cloned());
    }

    let include: Vec<String> = desired
        .include
        .or_observed(observed.map(|o| &o.include))
        .map(|patterns| patterns.iter().cloned().collect())
        .unwrap_or_default();
    let exclude: Vec<String> = desired
        .exclude
        .or_observed(observed.map(|o| &o.exclude))
        .map(|patterns| patterns.iter().cloned().collect())
        .unwrap_or_default();

    RepositoryRuleset {
        id: None,
        name: desired.name.clone(),
        target: Some(
            desired
                .target
                .or_observed(observed.map(|o| &o.target))
                .copied()
                .unwrap_or(RulesetTarget::Branch),
        ),
        enforcement: desired
            .enforcement
            .or_observed(observed.map(|o| &o.enforcement))
            .copied()
            .unwrap_or(RulesetEnforcement::Active),
        bypass_actors: desired
            .bypass_actors
            .or_observed(observed.map(|o| &o.bypass_actors))
            .map(|actors| {
                actors
                    .iter()
                    .map(|actor| BypassActor {
                        actor_id: actor.actor_id,
                        actor_type: actor.actor_type,
                        bypass_mode: actor.bypass_mode,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        conditions: Some(RulesetConditions {
            ref_name: RefNameCondition { include, exclude },
        }),
        rules,
        source_type: None,
    }
}

fn boolean_rule(rule_type: &str) -> Option<Rule> {
    match rule_type {
        "creation" => Some(Rule::Creation),
        "deletion" => Some(Rule::Deletion),
        "update" => Some(Rule::Update),
        "required_linear_history" => Some(Rule::RequiredLinearHistory),
        "required_signatures" => Some(Rule::RequiredSignatures),
        "non_fast_forward" => Some(Rule::NonFastForward),
        _ => None,
    }
}
