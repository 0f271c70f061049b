//! Blocking wait for the dependency endpoint.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant};

use crate::health::probe::{DependencyProbe, Endpoint};
use crate::resilience::RetryPolicy;

/// Result of a completed wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Loopback dependency; no probe was issued.
    Skipped,
    /// The endpoint accepted a connection.
    Reachable { attempts: u32, waited: Duration },
}

impl WaitOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            WaitOutcome::Skipped => 0,
            WaitOutcome::Reachable { attempts, .. } => *attempts,
        }
    }
}

/// The retry policy ran out before the endpoint became reachable.
#[derive(Debug, Error)]
#[error("dependency {endpoint} still unreachable after {attempts} attempts ({waited:?}): {last_error}")]
pub struct DependencyTimeout {
    pub endpoint: Endpoint,
    pub attempts: u32,
    pub waited: Duration,
    pub last_error: std::io::Error,
}

/// Probe `endpoint` until it answers or `policy` gives up.
///
/// With an unbounded policy this only returns once the endpoint is reachable.
pub async fn wait_for_dependency<P>(
    endpoint: &Endpoint,
    policy: &RetryPolicy,
    probe: &P,
) -> Result<WaitOutcome, DependencyTimeout>
where
    P: DependencyProbe,
{
    if endpoint.is_loopback() {
        tracing::debug!(host = %endpoint.host, "Dependency is local, skipping wait");
        return Ok(WaitOutcome::Skipped);
    }

    tracing::info!(
        host = %endpoint.host,
        port = endpoint.port,
        max_attempts = ?policy.max_attempts,
        "Waiting for dependency"
    );

    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match probe.probe(endpoint).await {
            Ok(()) => {
                let waited = started.elapsed();
                tracing::info!(
                    endpoint = %endpoint,
                    attempts,
                    waited_ms = waited.as_millis() as u64,
                    "Dependency reachable"
                );
                return Ok(WaitOutcome::Reachable { attempts, waited });
            }
            Err(e) => {
                if !policy.allows_another(attempts) {
                    return Err(DependencyTimeout {
                        endpoint: endpoint.clone(),
                        attempts,
                        waited: started.elapsed(),
                        last_error: e,
                    });
                }

                let delay = policy.delay_after(attempts);
                tracing::info!(
                    endpoint = %endpoint,
                    attempt = attempts,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Dependency not reachable yet"
                );
                time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails until the `succeed_on`-th call.
    struct ScriptedProbe {
        calls: AtomicU32,
        succeed_on: u32,
    }

    impl ScriptedProbe {
        fn new(succeed_on: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_on,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DependencyProbe for ScriptedProbe {
        async fn probe(&self, _endpoint: &Endpoint) -> io::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok(())
            } else {
                Err(io::Error::from(io::ErrorKind::ConnectionRefused))
            }
        }
    }

    #[tokio::test]
    async fn test_loopback_issues_no_probes() {
        let probe = ScriptedProbe::new(u32::MAX);
        for host in ["127.0.0.1", "localhost", "::1"] {
            let outcome = wait_for_dependency(
                &Endpoint::new(host, 3306),
                &RetryPolicy::default(),
                &probe,
            )
            .await
            .unwrap();
            assert_eq!(outcome, WaitOutcome::Skipped);
        }
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_at_fixed_interval_until_reachable() {
        let probe = ScriptedProbe::new(4);
        let started = Instant::now();

        let outcome = wait_for_dependency(
            &Endpoint::new("db", 3306),
            &RetryPolicy::default(),
            &probe,
        )
        .await
        .unwrap();

        assert_eq!(outcome.attempts(), 4);
        assert_eq!(probe.calls(), 4);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_policy_times_out() {
        let probe = ScriptedProbe::new(u32::MAX);
        let policy = RetryPolicy::bounded(Duration::from_secs(1), 5);

        let err = wait_for_dependency(&Endpoint::new("db", 3306), &policy, &probe)
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 5);
        assert_eq!(probe.calls(), 5);
        assert!(err.waited >= Duration::from_secs(4) && err.waited < Duration::from_millis(4100));
        assert!(err.to_string().contains("db:3306"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_last_allowed_attempt() {
        let probe = ScriptedProbe::new(3);
        let policy = RetryPolicy::bounded(Duration::from_millis(250), 3);

        let outcome = wait_for_dependency(&Endpoint::new("db", 3306), &policy, &probe)
            .await
            .unwrap();
        assert_eq!(outcome.attempts(), 3);
    }
}
