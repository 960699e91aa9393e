//! Retry policy for provider calls.

use crate::error::ProviderError;
use std::time::Duration;

/// Longest server-requested delay the loop will honour.
const MAX_RETRY_AFTER_SECS: u64 = 300;

/// Bounded exponential backoff applied by the orchestration loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on total attempts, including the initial request.
    pub max_attempts: u32,
    /// Base delay used for exponential backoff.
    pub initial_backoff: Duration,
    /// Maximum allowed delay between retry attempts.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Decide whether another attempt should follow the failed `attempt` (0-based).
    pub fn should_retry(&self, err: &ProviderError, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts && err.is_transient()
    }

    /// Compute the delay before the next attempt, respecting `Retry-After`.
    pub fn retry_delay_for(&self, attempt: u32, err: &ProviderError) -> Duration {
        if let Some(seconds) = err.retry_after_secs {
            return Duration::from_secs(seconds.min(MAX_RETRY_AFTER_SECS));
        }
        let pow = 2u32.saturating_pow(attempt);
        let millis = self
            .initial_backoff
            .as_millis()
            .saturating_mul(u128::from(pow))
            .min(self.max_backoff.as_millis());
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}
