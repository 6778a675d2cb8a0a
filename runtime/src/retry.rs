//! Bounded retry with a fixed delay between attempts.
//!
//! Operations that talk to shared infrastructure (a database, a cache) can fail
//! for reasons that go away on their own: a dropped connection, a failover, a
//! pool that is momentarily exhausted. These helpers re-run such an operation a
//! fixed number of times, sleeping the same amount between attempts. There is no
//! exponential growth and no jitter: the worst-case latency is always
//! `max_attempts × delay`.
//!
//! The caller is suspended for the whole loop. Once started it runs to
//! completion; there is no cancellation other than dropping the future.
//!
//! # Example
//!
//! ```rust
//! use courier_runtime::retry::{RetryPolicy, retry_with_delay};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(3)
//!     .delay(Duration::from_secs(5))
//!     .build();
//!
//! let value = retry_with_delay(&policy, || async {
//!     Ok::<_, std::io::Error>(42)
//! })
//! .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy: how many attempts, and how long to wait between them.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `delay`: 5 seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included. Values below 1 behave as 1.
    pub max_attempts: usize,
    /// Pause between two consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_attempts: None,
            delay: None,
        }
    }

    /// A policy that tries exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    const fn attempts(&self) -> usize {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<usize>,
    delay: Option<Duration>,
}

impl RetryPolicyBuilder {
    /// Set the total number of attempts.
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the pause between attempts.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            delay: self.delay.unwrap_or(defaults.delay),
        }
    }
}

/// Terminal outcome of a retry loop that never succeeded.
///
/// Carries the error of the last attempt and how many attempts were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure<E> {
    /// Attempts made before giving up
    pub attempts: usize,
    /// Error returned by the last attempt
    pub error: E,
}

impl<E: fmt::Display> fmt::Display for RetryFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation failed after {} attempt(s): {}", self.attempts, self.error)
    }
}

impl<E> std::error::Error for RetryFailure<E> where E: std::error::Error + 'static {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Retry an async operation with a fixed delay between attempts.
///
/// Every error is treated as transient. Each failed attempt is logged; the
/// loop sleeps `policy.delay` before the next one, except after the final
/// attempt, which returns the failure immediately.
///
/// # Errors
///
/// Returns [`RetryFailure`] wrapping the last error once `policy.max_attempts`
/// attempts have failed.
pub async fn retry_with_delay<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    retry_with_predicate(policy, operation, |_| true).await
}

/// Retry an async operation, giving up early on errors the predicate rejects.
///
/// # Errors
///
/// Returns [`RetryFailure`] with the first non-retryable error, or with the
/// last error once the attempt budget is spent.
pub async fn retry_with_predicate<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, max_attempts, "Operation succeeded after retry");
                }
                return Ok(value);
            },
            Err(error) => {
                if !is_retryable(&error) {
                    tracing::warn!(
                        attempt,
                        error = %error,
                        "Error is not retryable, failing immediately"
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        error,
                    });
                }

                if attempt >= max_attempts {
                    tracing::error!(
                        attempt,
                        max_attempts,
                        error = %error,
                        "Operation failed, retry budget exhausted"
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        error,
                    });
                }

                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "Operation failed, retrying"
                );

                sleep(policy.delay).await;
                attempt += 1;
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn counting_policy() -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(3)
            .delay(Duration::from_secs(5))
            .build()
    }

    #[test]
    fn builder_falls_back_to_defaults() {
        let policy = RetryPolicy::builder().max_attempts(7).build();
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_try_without_sleeping() {
        let counter = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let result = retry_with_delay(&counting_policy(), || {
            let c = Arc::clone(&counter);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_last_attempt() {
        let counter = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let result = retry_with_delay(&counting_policy(), || {
            let c = Arc::clone(&counter);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(format!("attempt {attempt} failed"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget_and_keeps_last_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let result = retry_with_delay(&counting_policy(), || {
            let c = Arc::clone(&counter);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(format!("failure #{attempt}"))
            }
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.error, "failure #2");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        // two pauses, none after the final attempt
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_runs_once() {
        let policy = RetryPolicy::builder().max_attempts(0).build();
        let counter = Arc::new(AtomicUsize::new(0));

        let result = retry_with_delay(&policy, || {
            let c = Arc::clone(&counter);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("down")
            }
        })
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_stops_on_permanent_error() {
        let counter = Arc::new(AtomicUsize::new(0));

        let result = retry_with_predicate(
            &counting_policy(),
            || {
                let c = Arc::clone(&counter);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>("permanent error")
                }
            },
            |err: &&str| err.contains("transient"),
        )
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_display_mentions_attempts() {
        let failure = RetryFailure {
            attempts: 3,
            error: "connection refused",
        };
        assert_eq!(
            failure.to_string(),
            "operation failed after 3 attempt(s): connection refused"
        );
    }
}
