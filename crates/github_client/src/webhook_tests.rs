//! Tests for webhook types.

use super::*;
use serde_json::json;

#[test]
fn test_webhook_deserialization_from_github_api() {
    let webhook: Webhook = serde_json::from_value(json!({
        "type": "Repository",
        "id": 12345678,
        "name": "web",
        "active": true,
        "events": ["push", "pull_request"],
        "config": {
            "content_type": "json",
            "insecure_ssl": "0",
            "secret": "********",
            "url": "https://example.com/webhook"
        },
        "updated_at": "2019-06-03T00:57:16Z",
        "created_at": "2019-06-03T00:57:16Z",
        "url": "https://api.github.com/repos/octocat/Hello-World/hooks/12345678"
    }))
    .expect("Failed to deserialize");

    assert_eq!(webhook.id, 12345678);
    assert!(webhook.active);
    assert_eq!(webhook.events, vec!["push", "pull_request"]);
    assert_eq!(webhook.config.url, "https://example.com/webhook");
    assert_eq!(webhook.config.content_type.as_deref(), Some("json"));
    assert_eq!(webhook.config.insecure_ssl, Some(false));
}

#[test]
fn test_insecure_ssl_accepts_all_wire_forms() {
    let cases = [
        (json!("1"), Some(true)),
        (json!("0"), Some(false)),
        (json!(1), Some(true)),
        (json!(0), Some(false)),
        (json!(true), Some(true)),
        (json!(null), None),
    ];

    for (raw, expected) in cases {
        let details: WebhookDetails = serde_json::from_value(json!({
            "url": "https://example.com",
            "insecure_ssl": raw.clone()
        }))
        .expect("Failed to deserialize");
        assert_eq!(details.insecure_ssl, expected, "wire value {raw}");
    }
}

#[test]
fn test_missing_optional_fields_stay_unset() {
    let webhook: Webhook = serde_json::from_value(json!({
        "id": 1,
        "config": { "url": "https://example.com" }
    }))
    .expect("Failed to deserialize");

    assert!(webhook.active, "GitHub treats hooks as active by default");
    assert!(webhook.events.is_empty());
    assert!(webhook.config.content_type.is_none());
    assert!(webhook.config.insecure_ssl.is_none());
}

#[test]
fn test_webhook_request_serialization_omits_unset_fields() {
    let request = WebhookRequest {
        name: None,
        active: Some(false),
        events: None,
        config: Some(WebhookDetails {
            url: "https://example.com/hook".to_string(),
            content_type: None,
            secret: None,
            insecure_ssl: Some(true),
        }),
    };

    let body = serde_json::to_value(&request).unwrap();

    assert_eq!(
        body,
        json!({
            "active": false,
            "config": {
                "url": "https://example.com/hook",
                "insecure_ssl": "1"
            }
        })
    );
}

#[test]
fn test_webhook_request_serialization_for_create() {
    let request = WebhookRequest {
        name: Some("web".to_string()),
        active: Some(true),
        events: Some(vec!["push".to_string()]),
        config: Some(WebhookDetails {
            url: "https://example.com/hook".to_string(),
            content_type: Some("json".to_string()),
            secret: Some("s3cret".to_string()),
            insecure_ssl: Some(false),
        }),
    };

    let body = serde_json::to_value(&request).unwrap();

    assert_eq!(body["name"], "web");
    assert_eq!(body["events"], json!(["push"]));
    assert_eq!(body["config"]["content_type"], "json");
    assert_eq!(body["config"]["secret"], "s3cret");
    assert_eq!(body["config"]["insecure_ssl"], "0");
}

#[test]
fn test_webhook_request_without_config_leaves_it_out() {
    let request = WebhookRequest {
        events: Some(vec!["release".to_string()]),
        ..Default::default()
    };

    let body = serde_json::to_value(&request).unwrap();

    assert_eq!(body, json!({ "events": ["release"] }));
}
