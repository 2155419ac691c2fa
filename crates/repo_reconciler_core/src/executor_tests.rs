use super::*;
use crate::state::{IdentityKey, NormalizedWebhook, PermissionEntry, RepositoryFields, Setting};
use crate::normalizer::normalize_observed;
use crate::test_support::{
    converged_client, observed_repository, FixtureConfig, MockRepositoryClient, OWNER,
};
use config_manager::Role;
use std::time::Duration;

const REPO: &str = "test-repo";

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
    }
}

fn plan(operations: Vec<Operation>) -> Plan {
    Plan {
        operations,
        pending: Vec::new(),
    }
}

fn grant_user(name: &str) -> Operation {
    Operation::GrantUser(PermissionEntry::new(name, Role::Push))
}

fn grant_team(name: &str) -> Operation {
    Operation::GrantTeam(PermissionEntry::new(name, Role::Maintain))
}

#[tokio::test]
async fn test_applies_operations_in_order() {
    let client = converged_client(&FixtureConfig::default());
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());
    let operations = vec![
        Operation::EditRepository {
            fields: RepositoryFields {
                description: Setting::Explicit("updated".to_string()),
                ..Default::default()
            },
            changed: ["description"].into_iter().collect(),
        },
        grant_user("newcomer"),
        grant_team("platform"),
        Operation::DeleteWebhook {
            id: 1,
            url: "https://example.org/webhook".to_string(),
        },
    ];

    let report = executor
        .apply(&plan(operations.clone()), &CancellationToken::new())
        .await
        .expect("Apply should succeed");

    assert_eq!(report.applied, operations);
    assert_eq!(
        client.mutations(),
        vec![
            "update_repository",
            "add_collaborator",
            "add_team_permission",
            "delete_webhook"
        ]
    );
    assert_eq!(
        client.repository().and_then(|r| r.description).as_deref(),
        Some("updated")
    );
    assert!(client.webhooks().is_empty());
}

#[tokio::test]
async fn test_stops_at_first_permanent_failure() {
    let client = converged_client(&FixtureConfig::default());
    client.fail_next(
        "add_team_permission",
        Error::ValidationFailed("Team does not exist".to_string()),
    );
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());

    let result = executor
        .apply(
            &plan(vec![
                grant_user("newcomer"),
                grant_team("missing-team"),
                grant_user("never-applied"),
            ]),
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(ReconcileError::Apply {
            applied,
            failed,
            cause,
        }) => {
            assert_eq!(applied, vec![grant_user("newcomer")]);
            assert_eq!(failed, grant_team("missing-team"));
            assert!(matches!(cause, Error::ValidationFailed(_)));
        }
        other => panic!("Expected apply error, got {other:?}"),
    }
    assert_eq!(
        client.mutations(),
        vec!["add_collaborator", "add_team_permission"]
    );
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let client = converged_client(&FixtureConfig::default());
    client.fail_next("add_collaborator", Error::RateLimitExceeded);
    client.fail_next(
        "add_collaborator",
        Error::ServerError {
            status: 502,
            message: "Bad Gateway".to_string(),
        },
    );
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());

    let report = executor
        .apply(&plan(vec![grant_user("newcomer")]), &CancellationToken::new())
        .await
        .expect("Apply should succeed after retries");

    assert_eq!(report.applied.len(), 1);
    assert_eq!(client.mutations().len(), 3);
}

#[tokio::test]
async fn test_transient_failure_past_retries_is_reported() {
    let client = converged_client(&FixtureConfig::default());
    for _ in 0..3 {
        client.fail_next("add_collaborator", Error::Timeout);
    }
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());

    let result = executor
        .apply(&plan(vec![grant_user("newcomer")]), &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(ReconcileError::Apply {
            cause: Error::Timeout,
            ..
        })
    ));
}

#[tokio::test]
async fn test_cancelled_before_start_applies_nothing() {
    let client = MockRepositoryClient::new();
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = executor.apply(&plan(vec![grant_user("newcomer")]), &cancel).await;

    assert_eq!(result, Err(ReconcileError::Cancelled { applied: vec![] }));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_cancellation_between_operations_keeps_applied() {
    let client = converged_client(&FixtureConfig::default());
    let cancel = CancellationToken::new();
    client.cancel_on("add_collaborator", cancel.clone());
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());

    let result = executor
        .apply(
            &plan(vec![grant_user("newcomer"), grant_team("platform")]),
            &cancel,
        )
        .await;

    assert_eq!(
        result,
        Err(ReconcileError::Cancelled {
            applied: vec![grant_user("newcomer")]
        })
    );
    assert_eq!(client.mutations(), vec!["add_collaborator"]);
}

#[tokio::test]
async fn test_cancellation_interrupts_operation_in_flight() {
    let client = converged_client(&FixtureConfig::default());
    client.stall("add_team_permission");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());

    let result = executor
        .apply(
            &plan(vec![grant_user("newcomer"), grant_team("platform")]),
            &cancel,
        )
        .await;

    assert_eq!(result.unwrap_err().applied(), &[grant_user("newcomer")]);
}

#[tokio::test]
async fn test_webhook_create_sends_request() {
    let client = converged_client(&FixtureConfig::default());
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());
    let webhook = NormalizedWebhook {
        key: IdentityKey::new("https://ci.example.org/hook"),
        url: "https://ci.example.org/hook".to_string(),
        id: None,
        content_type: Setting::Explicit("json".to_string()),
        active: Setting::Unset,
        insecure_ssl: Setting::Unset,
        events: Setting::Unset,
        secret: None,
    };

    executor
        .apply(
            &plan(vec![Operation::CreateWebhook(webhook)]),
            &CancellationToken::new(),
        )
        .await
        .expect("Apply should succeed");

    let created = client
        .webhooks()
        .into_iter()
        .find(|w| w.config.url == "https://ci.example.org/hook")
        .expect("Webhook should exist");
    assert!(created.active);
    assert_eq!(created.events, vec!["push".to_string()]);
    assert_eq!(created.config.content_type.as_deref(), Some("json"));
}

#[tokio::test]
async fn test_webhook_event_update_keeps_stored_secret() {
    let config = FixtureConfig::default();
    let mut observed = observed_repository(&config);
    observed.webhooks[0].config.secret = Some("kept".to_string());
    let client = MockRepositoryClient::with_observed(observed.clone());
    let executor = ConvergeExecutor::new(&client, OWNER, REPO, fast_retry());

    let current = normalize_observed(&observed).webhooks.remove(0);
    let update = Operation::UpdateWebhook {
        id: config.webhook_id,
        desired: NormalizedWebhook {
            events: Setting::Explicit(["release".to_string()].into_iter().collect()),
            ..current.clone()
        },
        observed: current,
        changed: ["events"].into_iter().collect(),
    };

    executor
        .apply(&plan(vec![update]), &CancellationToken::new())
        .await
        .expect("Apply should succeed");

    let webhook = &client.webhooks()[0];
    assert_eq!(webhook.events, vec!["release".to_string()]);
    assert_eq!(webhook.config.secret.as_deref(), Some("kept"));
}
