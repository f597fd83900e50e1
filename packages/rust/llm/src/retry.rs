//! Bounded retry for transient API failures.

use std::future::Future;
use std::time::Duration;

use edugen_shared::Result;
use tracing::warn;

/// Retry budget for a single logical API call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Delay before retry `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Same budget, no waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the budget is spent.
///
/// Only errors reporting [`is_retryable`](edugen_shared::EdugenError::is_retryable)
/// are retried.
pub async fn with_retry<T, F, Fut>(service: &str, policy: RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(service, attempt, error = %e, "transient failure, retrying");
                tokio::time::sleep(policy.base_delay * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use edugen_shared::EdugenError;

    use super::*;

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry("test", RetryPolicy::immediate(1), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(EdugenError::transient("test", "HTTP 503"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry("test", RetryPolicy::immediate(2), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(EdugenError::transient("test", "timeout"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry("test", RetryPolicy::immediate(3), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(EdugenError::api("test", "HTTP 401"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
