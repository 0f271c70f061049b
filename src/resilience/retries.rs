//! Retry policy for the dependency wait.
//!
//! # Responsibilities
//! - Decide whether another probe may be issued
//! - Compute the delay before the next probe

use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::{BackoffKind, DependencyConfig};
use crate::resilience::backoff::probe_delay;

/// How often, and how many times, a failed probe is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Base delay between probes.
    pub interval: Duration,
    /// Total probe cap; `None` waits forever.
    pub max_attempts: Option<NonZeroU32>,
    pub backoff: BackoffKind,
    /// Ceiling for exponential delays.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Fixed interval, no cap.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            backoff: BackoffKind::Fixed,
            max_delay: interval,
        }
    }

    /// Fixed interval, at most `attempts` probes (0 means no cap).
    pub fn bounded(interval: Duration, attempts: u32) -> Self {
        Self {
            max_attempts: NonZeroU32::new(attempts),
            ..Self::unbounded(interval)
        }
    }

    pub fn from_config(config: &DependencyConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: NonZeroU32::new(config.max_attempts),
            backoff: config.backoff,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Whether a probe may follow `attempts_made` failed ones.
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        self.max_attempts
            .map_or(true, |max| attempts_made < max.get())
    }

    /// Delay to sleep after the `failures`-th consecutive failure.
    pub fn delay_after(&self, failures: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.interval,
            BackoffKind::Exponential => probe_delay(failures, self.interval, self.max_delay),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&DependencyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert!(policy.allows_another(u32::MAX - 1));
        assert_eq!(policy.delay_after(50), Duration::from_secs(1));
        assert_eq!(policy.backoff, BackoffKind::Fixed);
    }

    #[test]
    fn test_default_matches_default_config() {
        let from_config = RetryPolicy::from_config(&DependencyConfig::default());
        assert_eq!(RetryPolicy::default(), from_config);
        assert_eq!(from_config.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_bounded_policy_caps_attempts() {
        let policy = RetryPolicy::bounded(Duration::from_millis(10), 3);
        assert!(policy.allows_another(0));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));

        assert_eq!(RetryPolicy::bounded(Duration::from_millis(10), 0).max_attempts, None);
    }

    #[test]
    fn test_from_config_exponential() {
        let config = DependencyConfig {
            interval_ms: 100,
            max_attempts: 5,
            backoff: BackoffKind::Exponential,
            max_delay_ms: 400,
            ..DependencyConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts.map(NonZeroU32::get), Some(5));

        let third = policy.delay_after(3);
        assert!(third >= Duration::from_millis(400) && third < Duration::from_millis(440));
    }
}
