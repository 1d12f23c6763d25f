//! Retry with exponential backoff

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Largest exponent applied to the base delay
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry (ms); doubles on every further retry
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt with 0-based index `attempt`:
    /// `base × 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(MAX_BACKOFF_SHIFT);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Run `operation` until it succeeds or the policy's attempts are exhausted
///
/// Returns the last error when every attempt fails.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 >= attempts => {
                warn!("[RETRY] {} failed after {} attempts: {}", label, attempts, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                debug!(
                    "[RETRY] {} attempt {} failed ({}), retrying in {:?}",
                    label,
                    attempt + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
