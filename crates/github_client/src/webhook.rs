//! Repository webhooks as the hooks endpoints report them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A repository webhook.
///
/// ```rust
/// use github_client::Webhook;
///
/// let hook: Webhook = serde_json::from_str(r#"{
///     "id": 7,
///     "events": ["release"],
///     "config": { "url": "https://ci.example.org/hook", "insecure_ssl": "1" }
/// }"#).unwrap();
///
/// assert!(hook.active);
/// assert_eq!(hook.config.insecure_ssl, Some(true));
/// assert_eq!(hook.config.content_type, None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Webhook {
    pub id: u64,

    /// Hooks created without `active` are delivered to.
    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub events: Vec<String>,

    pub config: WebhookDetails,
}

fn default_active() -> bool {
    true
}

/// The `config` object of a hook.
///
/// Only the URL is always present; other keys are missing when never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookDetails {
    pub url: String,

    /// `json` or `form`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Shared secret. GitHub masks it on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// `true` disables certificate checks. Sent as `"1"`, `false` as `"0"`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_insecure_ssl",
        deserialize_with = "deserialize_insecure_ssl"
    )]
    pub insecure_ssl: Option<bool>,
}

/// Request body for `POST /repos/{owner}/{repo}/hooks` and `PATCH .../hooks/{id}`.
///
/// Unset fields are left out so that an update never resets settings it does not name.
/// GitHub replaces the stored `config` as a whole, secret included, so an update
/// that does not touch the configuration should leave `config` out.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WebhookRequest {
    /// Hook name, always `web` for repository webhooks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<WebhookDetails>,
}

fn serialize_insecure_ssl<S>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(insecure) => serializer.serialize_str(if *insecure { "1" } else { "0" }),
        None => serializer.serialize_none(),
    }
}

/// Accepts the shapes GitHub has used: "0"/"1" strings, bare integers and, for older hooks, booleans.
fn deserialize_insecure_ssl<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
        Flag(bool),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        Raw::Text(s) => s.trim() == "1",
        Raw::Number(n) => n == 1,
        Raw::Flag(b) => b,
    }))
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
