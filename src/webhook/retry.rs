//! Retry backoff strategy for webhook delivery.

use std::time::Duration;

/// Computes the delay before a retry attempt. `attempt_index` is 0-based and
/// counts only retries — the initial delivery attempt has no delay.
pub trait RetryStrategy: Send + Sync {
    fn delay_before_retry(&self, attempt_index: u32) -> Duration;
}

/// `2^n` seconds starting at 1s, per spec §4.5 (resolving the source's two
/// conflicting branches — one started at 2s, the other at 1s — in favor of
/// the latter).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialBackoff;

impl RetryStrategy for ExponentialBackoff {
    fn delay_before_retry(&self, attempt_index: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_matches_spec_gaps() {
        let strategy = ExponentialBackoff;
        assert_eq!(strategy.delay_before_retry(0), Duration::from_secs(1));
        assert_eq!(strategy.delay_before_retry(1), Duration::from_secs(2));
        assert_eq!(strategy.delay_before_retry(2), Duration::from_secs(4));
    }
}
