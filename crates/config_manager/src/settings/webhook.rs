//! Webhook configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Webhook configuration.
///
/// A webhook is identified by its URL. Every other field is optional; a field left
/// out is not managed and the platform default (or current value) is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WebhookConfig {
    /// Webhook URL
    pub url: String,

    /// Content type (json or form)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Secret for webhook validation. GitHub never reports it back, so it is only
    /// sent when the webhook is created or otherwise updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Whether the webhook is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Whether TLS certificate verification is skipped on delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_ssl: Option<bool>,

    /// Events that trigger the webhook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
