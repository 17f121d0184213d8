//! Retry logic with exponential backoff for ledger reads.
//!
//! Retries only on transient errors ([`AnchorError::is_transient`]).
//! `Unavailable`, `Rejected` and `InvalidDigest` are returned immediately.
//! Writes are never wrapped: a resent transaction is not idempotent.

use std::future::Future;
use std::time::Duration;

use crate::error::AnchorError;

/// Default number of retry attempts after the initial call.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, ...).
const BASE_DELAY_MS: u64 = 200;

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Same base delay, different retry bound.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `f` up to `max_retries + 1` times while it fails transiently.
    pub async fn run<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, AnchorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, AnchorError>>,
    {
        for attempt in 0..self.max_retries {
            match f().await {
                Err(e) if e.is_transient() => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        "ledger call failed, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
        // Final attempt, no more retries.
        f().await
    }
}
