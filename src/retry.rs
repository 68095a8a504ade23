//! Bounded retry with exponential backoff
//!
//! Every remote call in the connector goes through a [`Retryer`], an
//! explicit call executor that classifies failures via
//! [`Error::classify`](crate::error::Error::classify) and retries transient
//! ones. The budget is bounded twice: by attempt count and by total elapsed
//! time, whichever is reached first. After exhaustion the original error is
//! returned unchanged.

use crate::error::{ErrorClass, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Retry policy applied by a [`Retryer`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (first attempt included)
    pub max_attempts: u32,
    /// Maximum total elapsed time across all attempts
    pub max_elapsed: Duration,
    /// Initial backoff delay
    pub initial_backoff: Duration,
    /// Upper bound on a single backoff delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            max_elapsed: Duration::from_secs(60),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(16),
        }
    }
}

impl RetryPolicy {
    /// Policy with near-zero delays, for tests
    pub fn fast() -> Self {
        Self {
            max_attempts: 5,
            max_elapsed: Duration::from_secs(60),
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    /// Exponential backoff delay for a zero-based attempt index
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.initial_backoff * factor, self.max_backoff)
    }
}

/// Call executor wrapping remote operations with classify-and-retry
///
/// The total time spent sleeping between attempts is tracked and observable
/// through [`Retryer::total_backoff`].
#[derive(Debug)]
pub struct Retryer {
    policy: RetryPolicy,
    total_backoff_ms: AtomicU64,
}

impl Retryer {
    /// Create a retryer with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            total_backoff_ms: AtomicU64::new(0),
        }
    }

    /// Total time slept between retry attempts so far
    pub fn total_backoff(&self) -> Duration {
        Duration::from_millis(self.total_backoff_ms.load(Ordering::Relaxed))
    }

    /// Execute `f`, retrying transient failures with exponential backoff
    ///
    /// `operation` names the remote call and `account` is the account scope;
    /// both appear in every attempt's log line. Fatal failures return after
    /// a single attempt.
    pub async fn call<T, F, Fut>(&self, operation: &str, account: Option<&str>, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let account = account.unwrap_or("-");
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(operation, account, attempt, "remote call");

            let err = match f().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let class = err.classify();
            if !class.is_retryable() {
                warn!(operation, account, attempt, error = %err, "fatal error, not retrying");
                return Err(err);
            }

            let elapsed = started.elapsed();
            if attempt >= self.policy.max_attempts || elapsed >= self.policy.max_elapsed {
                warn!(
                    operation,
                    account,
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "retry budget exhausted"
                );
                return Err(err);
            }

            let delay = self.delay_for(class, attempt - 1);
            warn!(
                operation,
                account,
                attempt,
                class = ?class,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient error, retrying"
            );
            self.total_backoff_ms
                .fetch_add(delay.as_millis() as u64, Ordering::Relaxed);
            tokio::time::sleep(delay).await;
        }
    }

    fn delay_for(&self, class: ErrorClass, attempt: u32) -> Duration {
        // Rate-limit responses start at the backoff ceiling instead of
        // walking up to it.
        match class {
            ErrorClass::RateLimit => self.policy.max_backoff,
            _ => self.policy.backoff(attempt),
        }
    }
}

impl Default for Retryer {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

/// Redact a sensitive value for logging, keeping a short prefix
pub fn redact(value: &str) -> String {
    if value.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &value[..4])
    }
}
