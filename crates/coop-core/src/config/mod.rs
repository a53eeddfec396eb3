//! Sync driver configuration.
//!
//! Controls how patiently the sync driver talks to the remote store:
//! per-attempt fetch timeout and bounded retry with exponential backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 200;
const MAX_BACKOFF_MS: u64 = 30_000;

/// Retry and timeout policy for remote store calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upper bound for a single remote call
    pub fetch_timeout: Duration,
    /// Attempts per remote call, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for every further retry
    pub initial_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        }
    }
}

impl SyncConfig {
    /// Set the per-attempt timeout
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the number of attempts per remote call (at least one)
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the delay before the first retry
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.initial_backoff.saturating_mul(1 << exponent);
        delay.min(Duration::from_millis(MAX_BACKOFF_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let config = SyncConfig::default();
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let config = SyncConfig::default().with_initial_backoff(Duration::from_millis(100));
        assert_eq!(config.backoff_for(1), Duration::from_millis(100));
        assert_eq!(config.backoff_for(2), Duration::from_millis(200));
        assert_eq!(config.backoff_for(3), Duration::from_millis(400));
    }

    #[test]
    fn backoff_is_capped() {
        let config = SyncConfig::default().with_initial_backoff(Duration::from_secs(10));
        assert_eq!(config.backoff_for(10), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        assert_eq!(SyncConfig::default().with_max_attempts(0).max_attempts, 1);
    }
}
