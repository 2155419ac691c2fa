//! Bounded retries of transient platform failures.

use std::future::Future;
use std::time::Duration;

use github_client::Error;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::configuration::ReconcilerConfig;

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

/// Exponential backoff applied to transient errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl From<&ReconcilerConfig> for RetryPolicy {
    fn from(config: &ReconcilerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ReconcilerConfig::default())
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails with a non-transient error, or
    /// runs out of attempts. The last error is returned unchanged.
    pub async fn run<F, Fut, T>(&self, description: &str, mut operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut delay = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(
                            operation = %description,
                            attempt,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    debug!(
                        operation = %description,
                        attempt,
                        total_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying after delay"
                    );

                    sleep(delay).await;
                    delay = (delay * 2).min(self.max_backoff);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
