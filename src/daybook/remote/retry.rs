//! Retry with exponential backoff, as a pure wrapper around any fallible
//! async operation. The classifier decides what is worth retrying, so the
//! policy is testable without touching the network.

use std::future::Future;
use std::time::Duration;

use crate::error::{DaybookError, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Same attempt count, zero delay. For tests.
    pub fn immediate() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_before_attempt(&self, next_attempt: u32) -> Duration {
        // next_attempt is 2-based here; first retry waits base_delay.
        self.base_delay * 2u32.saturating_pow(next_attempt.saturating_sub(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Surface immediately: retrying cannot help (bad credentials, version
    /// conflict, local failure).
    Fatal,
    /// Transport-level trouble; worth another attempt.
    Retryable,
}

/// Default classifier for remote operations.
pub fn classify(err: &DaybookError) -> Disposition {
    match err {
        DaybookError::Authorization { .. }
        | DaybookError::Conflict { .. }
        | DaybookError::Validation(_)
        | DaybookError::EntryNotFound(_)
        | DaybookError::Store(_)
        | DaybookError::Api(_)
        | DaybookError::Io(_)
        | DaybookError::Serialization(_) => Disposition::Fatal,
        DaybookError::Http(_)
        | DaybookError::RemoteStatus { .. }
        | DaybookError::Transient { .. } => Disposition::Retryable,
    }
}

/// Run `op` until it succeeds, a fatal error surfaces, or the attempt limit
/// is reached. A retryable error that exhausts the limit is wrapped in
/// [`DaybookError::Transient`] with the attempt count.
pub async fn with_retry<T, Op, Fut, C>(policy: &RetryPolicy, classify: C, mut op: Op) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    C: Fn(&DaybookError) -> Disposition,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if classify(&err) == Disposition::Fatal {
                    return Err(err);
                }
                if attempt >= policy.max_attempts {
                    return Err(DaybookError::Transient {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                attempt += 1;
                let delay = policy.delay_before_attempt(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err,
                    "retrying remote operation");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn transient() -> DaybookError {
        DaybookError::RemoteStatus {
            status: 503,
            path: "entries/2025-01-01.md".into(),
        }
    }

    fn fatal() -> DaybookError {
        DaybookError::Authorization {
            status: 401,
            path: "entries/2025-01-01.md".into(),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = Cell::new(0u32);
        let result = with_retry(&RetryPolicy::immediate(), classify, || async {
            calls.set(calls.get() + 1);
            Ok(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retryable_error_is_retried_to_the_cap() {
        let calls = Cell::new(0u32);
        let result: Result<()> = with_retry(&RetryPolicy::immediate(), classify, || async {
            calls.set(calls.get() + 1);
            Err(transient())
        })
        .await;

        assert_eq!(calls.get(), DEFAULT_MAX_ATTEMPTS);
        match result.unwrap_err() {
            DaybookError::Transient { attempts, .. } => {
                assert_eq!(attempts, DEFAULT_MAX_ATTEMPTS)
            }
            other => panic!("expected Transient, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_error_short_circuits() {
        let calls = Cell::new(0u32);
        let result: Result<()> = with_retry(&RetryPolicy::immediate(), classify, || async {
            calls.set(calls.get() + 1);
            Err(fatal())
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(
            result.unwrap_err(),
            DaybookError::Authorization { .. }
        ));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result = with_retry(&RetryPolicy::immediate(), classify, || async {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(transient())
            } else {
                Ok("recovered")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_before_attempt(2), Duration::from_millis(100));
        assert_eq!(policy.delay_before_attempt(3), Duration::from_millis(200));
        assert_eq!(policy.delay_before_attempt(4), Duration::from_millis(400));
    }

    #[test]
    fn test_conflict_is_never_retryable() {
        let err = DaybookError::Conflict {
            path: "entries/2025-01-01.md".into(),
        };
        assert_eq!(classify(&err), Disposition::Fatal);
    }
}
