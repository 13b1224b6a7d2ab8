//! Pure retry/backoff combinator.
//!
//! Takes an operation, an attempt bound, and a base delay; runs the operation
//! until it succeeds or the bound is exhausted, doubling the delay between
//! attempts. Each retry is reported through `tracing` with the attempt count
//! and the wait, so an operator can follow a flaky transport from the logs.
//! No UI coupling, no shared state.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Bounded exponential-backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay after the given failed attempt (1-based): `base * 2^(n-1)`.
    pub fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(failed_attempt.saturating_sub(1))
    }
}

/// Terminal failure after the attempt bound was exhausted.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Attempts actually issued.
    pub attempts: u32,
    /// The error from the final attempt.
    pub last_error: E,
}

/// Runs `op` until it succeeds or the policy's attempt bound is exhausted.
///
/// `op` receives the 1-based attempt number. On failure of a non-final
/// attempt the combinator logs a warning and sleeps the backoff delay before
/// trying again; the final failure is returned as [`RetryExhausted`].
pub async fn retry_with_backoff<T, E, Op, Fut>(
    policy: RetryPolicy,
    mut op: Op,
) -> std::result::Result<T, RetryExhausted<E>>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts();
    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt == max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: error,
                    });
                }
                let delay = policy.backoff_delay(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %error,
                    "model call failed, backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    unreachable!("the attempt loop always returns")
}
