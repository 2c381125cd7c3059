//! Fixed-delay retry.
//!
//! The commentary pipeline retries with a constant delay between attempts —
//! no exponential backoff, no jitter, identical input every attempt.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::metrics::record_retry;

/// Retry behavior for one external operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// Some attempt succeeded.
    Success(T),
    /// Every attempt failed; carries the last error and the attempt count.
    Exhausted { error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success(_))
    }
}

/// Execute an async operation under a fixed-delay retry policy.
///
/// The factory is re-invoked for each attempt with no request mutation in
/// between. Sleeps exactly `policy.delay` between attempt *i* and *i+1*.
pub async fn retry_fixed<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> RetryOutcome<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return RetryOutcome::Success(value),
            Err(e) if attempt < policy.max_attempts => {
                debug!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    operation_name, attempt, policy.delay, e
                );
                record_retry(operation_name);
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                return RetryOutcome::Exhausted {
                    error: e,
                    attempts: attempt,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_immediate_success_is_single_attempt() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let outcome = retry_fixed(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(7) }
        })
        .await;

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_count_never_exceeds_ceiling() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let outcome = retry_fixed(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>("boom") }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match outcome {
            RetryOutcome::Exhausted { attempts, error } => {
                assert_eq!(attempts, 3);
                assert_eq!(error, "boom");
            }
            RetryOutcome::Success(_) => panic!("expected exhaustion"),
        }
    }

    #[tokio::test]
    async fn test_eventual_success_stops_retrying() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let outcome = retry_fixed(&policy, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Err("transient")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert!(outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_attempts_is_exact() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        let attempt_times = std::sync::Mutex::new(Vec::new());

        let _ = retry_fixed(&policy, "test", || {
            attempt_times.lock().unwrap().push(tokio::time::Instant::now());
            async { Err::<u32, _>("boom") }
        })
        .await;

        let times = attempt_times.lock().unwrap();
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_millis(1000));
        assert_eq!(times[2] - times[1], Duration::from_millis(1000));
    }
}
