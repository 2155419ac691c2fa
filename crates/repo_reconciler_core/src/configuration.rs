//! Reconciler configuration.
//!
//! Controls how the converge executor retries transient platform failures. All
//! fields have defaults, so an empty TOML document is a valid configuration.
//!
//! ```toml
//! max_attempts = 5
//! initial_backoff_ms = 500
//! max_backoff_ms = 10000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ReconcileError, ReconcileResult};

#[cfg(test)]
#[path = "configuration_tests.rs"]
mod tests;

/// Settings of a [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcilerConfig {
    /// Attempts per operation, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry. Doubles on every further retry.
    pub initial_backoff_ms: u64,

    /// Upper bound of the delay between retries.
    pub max_backoff_ms: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
        }
    }
}

impl ReconcilerConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Configuration` when the document cannot be parsed
    /// or `max_attempts` is zero.
    pub fn from_toml(content: &str) -> ReconcileResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ReconcileError::Configuration {
            reason: e.to_string(),
        })?;

        if config.max_attempts == 0 {
            return Err(ReconcileError::Configuration {
                reason: "max_attempts must be at least 1".to_string(),
            });
        }

        debug!(?config, "Loaded reconciler configuration");
        Ok(config)
    }

    /// Reads a configuration file.
    pub fn from_file(path: &Path) -> ReconcileResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ReconcileError::Configuration {
                reason: format!("failed to read {}: {e}", path.display()),
            })?;
        Self::from_toml(&content)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}
