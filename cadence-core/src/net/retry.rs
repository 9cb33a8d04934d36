//! Exponential-backoff retry wrapper for remote calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::catalog::CatalogError;
use crate::config::RetryConfig;

/// Retry policy wrapping one remote call with exponential backoff.
///
/// Default budget is 3 retries starting at 1000ms, doubling per attempt
/// with no jitter. Errors whose kind cannot succeed on retry (auth expiry,
/// quota exhaustion, invalid data) short-circuit immediately; everything
/// else is retried until the budget runs out, after which the final typed
/// error propagates for the orchestrator's skip-vs-abort decision.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.initial_delay)
    }

    /// Runs the operation, retrying retryable failures with backoff.
    ///
    /// # Errors
    ///
    /// The operation's final error once the retry budget is exhausted, or
    /// its first error when the error kind is not retryable.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let mut remaining = self.max_retries;
        let mut delay = self.initial_delay;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if remaining == 0 || !error.is_retryable() => return Err(error),
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        attempts_left = remaining,
                        delay_ms = delay.as_millis() as u64,
                        "remote call failed, retrying after backoff"
                    );
                    sleep(delay).await;
                    delay *= 2;
                    remaining -= 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    fn transient(reason: &str) -> CatalogError {
        CatalogError::Transient {
            reason: reason.to_string(),
        }
    }

    #[tokio::test]
    async fn first_try_success_skips_backoff() {
        let policy = RetryPolicy::default();
        let result = policy.run(|| async { Ok::<_, CatalogError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_then_success_backs_off_1000_then_2000() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        let calls = Arc::new(AtomicU32::new(0));

        let start = Instant::now();
        let calls_in_op = calls.clone();
        let result = policy
            .run(move || {
                let calls = calls_in_op.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(transient("flaky"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Exactly two sleeps: 1000ms then 2000ms.
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_returns_final_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        let calls = Arc::new(AtomicU32::new(0));

        let calls_in_op = calls.clone();
        let result: Result<(), _> = policy
            .run(move || {
                let calls = calls_in_op.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(transient("still down"))
                }
            })
            .await;

        assert!(matches!(result, Err(CatalogError::Transient { .. })));
        // Initial call plus three retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_expiry_is_not_retried() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        let calls = Arc::new(AtomicU32::new(0));

        let start = Instant::now();
        let calls_in_op = calls.clone();
        let result: Result<(), _> = policy
            .run(move || {
                let calls = calls_in_op.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(CatalogError::AuthExpired {
                        provider: "spotify".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(CatalogError::AuthExpired { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn quota_exhaustion_is_not_retried() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));

        let result: Result<(), _> = policy
            .run(|| async {
                Err(CatalogError::QuotaExceeded {
                    provider: "youtube".to_string(),
                    reason: "daily limit".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(CatalogError::QuotaExceeded { .. })));
    }
}
