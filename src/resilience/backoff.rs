//! Jittered exponential delay between dependency probes.
//!
//! Used by [`RetryPolicy::delay_after`](super::RetryPolicy::delay_after) when
//! `dependency.backoff = "exponential"`. The first failed probe waits one
//! interval, each further failure doubles it up to `max_delay`, and up to 10%
//! jitter keeps replicas started together from probing the database in step.

use std::time::Duration;

use rand::Rng;

/// Delay to sleep after `failures` consecutive failed probes.
///
/// `max_delay` never undercuts `interval`; zero failures means no delay.
pub fn probe_delay(failures: u32, interval: Duration, max_delay: Duration) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }

    let ceiling = max_delay.max(interval);
    let factor = 2u32.saturating_pow(failures - 1);
    let delay = interval.saturating_mul(factor).min(ceiling);

    let jitter_ms = delay.as_millis() as u64 / 10;
    let jitter = if jitter_ms > 0 {
        rand::thread_rng().gen_range(0..jitter_ms)
    } else {
        0
    };

    delay + Duration::from_millis(jitter)
}
