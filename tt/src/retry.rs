//! Retry with exponential backoff for external calls
//!
//! One policy object serves both collaborators. Callers hand it the operation
//! and a classification function; transient failures are retried with a
//! doubling delay, fatal ones return immediately.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RetryConfig;

/// How a failed attempt should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth another attempt; `retry_after` is a server-provided delay
    Transient { retry_after: Option<Duration> },
    /// Retrying cannot help (bad request, auth, malformed response)
    Fatal,
}

impl ErrorClass {
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorClass::Transient { .. })
    }
}

/// Failure after the policy gave up
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    #[error("{operation} failed: {source}")]
    Fatal { operation: String, source: E },

    #[error("{operation} failed after {attempts} attempts: {source}")]
    Exhausted { operation: String, attempts: u32, source: E },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Fatal { .. } => None,
            RetryError::Exhausted { attempts, .. } => Some(*attempts),
        }
    }
}

/// Bounded exponential backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; values below 1 become 1
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
        )
    }

    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `retry` (1-based): initial * 2^(retry-1), capped
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    fn delay(&self, retry: u32, class: ErrorClass) -> Duration {
        match class {
            ErrorClass::Transient {
                retry_after: Some(after),
            } => after.min(self.max_backoff),
            _ => self.backoff(retry),
        }
    }

    /// Run `op` until it succeeds, fails fatally, or attempts run out
    pub async fn run<T, E, F, Fut, C>(&self, operation: &str, mut op: F, classify: C) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> ErrorClass,
    {
        debug!(%operation, max_attempts = self.max_attempts, "run: called");
        let mut attempt = 1;
        loop {
            let err = match op().await {
                Ok(value) => {
                    debug!(%operation, attempt, "run: success");
                    return Ok(value);
                }
                Err(err) => err,
            };

            let class = classify(&err);
            if !class.is_transient() {
                debug!(%operation, attempt, error = %err, "run: fatal error, not retrying");
                return Err(RetryError::Fatal {
                    operation: operation.to_string(),
                    source: err,
                });
            }

            if attempt >= self.max_attempts {
                warn!(%operation, attempt, error = %err, "run: attempts exhausted");
                return Err(RetryError::Exhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.delay(attempt, class);
            warn!(
                %operation,
                attempt,
                backoff_ms = delay.as_millis() as u64,
                error = %err,
                "run: retrying after transient error"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
