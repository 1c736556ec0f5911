use std::future::Future;
use std::time::Duration;

/// Retry configuration. The delay is fixed between attempts; there is no
/// backoff growth. `max_attempts: None` retries until the operation
/// succeeds or returns a non-retryable error.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Some(3), // 1 initial + 2 retries
            delay: Duration::from_millis(500),
        }
    }
}

/// Trait for errors that may be retryable
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

/// Execute an async operation with retries.
/// Only retries on transient errors (as determined by IsRetryable trait).
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt = attempt.saturating_add(1);
                let exhausted = config.max_attempts.is_some_and(|max| attempt >= max);
                if !e.is_retryable() || exhausted {
                    return Err(e);
                }
                tracing::debug!(
                    attempt,
                    delay_ms = config.delay.as_millis() as u64,
                    "retrying after transient error"
                );
                tokio::time::sleep(config.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt() {
        let config = RetryConfig::default();
        let call_count = Arc::new(AtomicU32::new(0));
        let count = call_count.clone();

        let result: Result<&str, TestError> = with_retry(&config, || {
            count.fetch_add(1, Ordering::SeqCst);
            async { Ok("success") }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_transient_error() {
        let config = RetryConfig {
            max_attempts: Some(3),
            delay: Duration::from_millis(1), // fast for tests
        };
        let call_count = Arc::new(AtomicU32::new(0));
        let count = call_count.clone();

        let result: Result<&str, TestError> = with_retry(&config, || {
            let attempt = count.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(TestError { retryable: true })
                } else {
                    Ok("success after retries")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success after retries");
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_retryable_error() {
        let config = RetryConfig::default();
        let call_count = Arc::new(AtomicU32::new(0));
        let count = call_count.clone();

        let result: Result<&str, TestError> = with_retry(&config, || {
            count.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError { retryable: false }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_bounded_attempts() {
        let config = RetryConfig {
            max_attempts: Some(2),
            delay: Duration::from_millis(1),
        };
        let call_count = Arc::new(AtomicU32::new(0));
        let count = call_count.clone();

        let result: Result<&str, TestError> = with_retry(&config, || {
            count.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError { retryable: true }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_retries_until_success() {
        let config = RetryConfig {
            max_attempts: None,
            delay: Duration::from_secs(6),
        };
        let call_count = Arc::new(AtomicU32::new(0));
        let count = call_count.clone();

        let result: Result<&str, TestError> = with_retry(&config, || {
            let attempt = count.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 25 {
                    Err(TestError { retryable: true })
                } else {
                    Ok("eventually")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "eventually");
        assert_eq!(call_count.load(Ordering::SeqCst), 26);
    }
}
