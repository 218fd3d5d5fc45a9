//! Jittered exponential backoff and an async retry helper.
//!
//! [`exponential_backoff`] is used both by the event-creation state machine
//! (per-state retry waits) and by [`retry_with_backoff`], which the gateway
//! retry decorator builds on.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Compute a retry delay in seconds.
///
/// The delay is `min(base_delay * 2^attempt, max_delay)`, perturbed uniformly by
/// up to `±jitter * delay`, and never negative. `attempt` is 0-indexed.
pub fn exponential_backoff(attempt: u32, base_delay: f64, max_delay: f64, jitter: f64) -> f64 {
    let exp = 2f64.powi(attempt.min(63) as i32);
    let mut delay = (base_delay * exp).min(max_delay);

    if jitter > 0.0 {
        let spread = delay * jitter;
        // fastrand::f64() is in [0, 1); map it onto [-spread, spread).
        delay += (fastrand::f64() * 2.0 - 1.0) * spread;
    }

    delay.max(0.0)
}

/// Retry budget and delay bounds for a retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; the operation runs at most `max_retries + 1` times.
    pub max_retries: u32,
    /// Base delay in seconds.
    pub base_delay: f64,
    /// Upper bound on a single delay, in seconds.
    pub max_delay: f64,
    /// Jitter fraction in `[0, 1]`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: 1.0,
            max_delay: 30.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following the given 0-indexed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(exponential_backoff(
            attempt,
            self.base_delay,
            self.max_delay,
            self.jitter,
        ))
    }
}

/// Outcome of [`retry_with_backoff`] when the operation never succeeded.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-retryable error, returned as soon as it was observed.
    Fatal(E),
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last_error: E },
}

/// Run `op` until it succeeds, retrying errors for which `is_retryable` holds.
///
/// Between attempts the helper sleeps for `policy.delay_for(attempt)`.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retryable(&err) => return Err(RetryError::Fatal(err)),
            Err(err) => {
                if attempt >= policy.max_retries {
                    warn!(attempts = attempt + 1, "all {} retry attempts exhausted", policy.max_retries);
                    return Err(RetryError::Exhausted {
                        attempts: attempt + 1,
                        last_error: err,
                    });
                }
                let delay = policy.delay_for(attempt);
                info!(
                    attempt = attempt + 1,
                    delay_secs = delay.as_secs_f64(),
                    "attempt failed: {err}; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
