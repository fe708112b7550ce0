//! Timeout and retry wrapper for calls to external services.

use crate::config::NetworkSettings;
use crate::error::{Result, VidaskError};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Bounded timeout per attempt plus a fixed number of retries on transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl From<&NetworkSettings> for RetryPolicy {
    fn from(settings: &NetworkSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            ..Default::default()
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying while the error is transient and attempts remain.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            let result = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(VidaskError::TransientNetwork(format!(
                    "{} timed out after {}s",
                    what,
                    self.timeout.as_secs()
                ))),
            };

            match result {
                Ok(value) => {
                    if attempt > 0 {
                        info!("{} succeeded after {} retries", what, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = self.backoff * attempt;
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {}ms: {}",
                        what,
                        attempt,
                        self.max_retries + 1,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(200),
            max_retries: 1,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_once() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("fetch", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(VidaskError::TransientNetwork("reset".to_string()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(tokio_test::assert_ok!(result), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_single_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy()
            .run("fetch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(VidaskError::TransientNetwork("reset".to_string()))
            })
            .await;

        assert!(matches!(result, Err(VidaskError::TransientNetwork(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy()
            .run("fetch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(VidaskError::VideoNotFound {
                    video_id: "abc".to_string(),
                    reason: "Video unavailable".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(VidaskError::VideoNotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        let policy = RetryPolicy {
            timeout: Duration::from_millis(10),
            max_retries: 0,
            backoff: Duration::ZERO,
        };
        let result: Result<()> = policy
            .run("generate", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        let err = tokio_test::assert_err!(result);
        assert!(err.is_transient());
        assert!(err.to_string().contains("timed out"));
    }
}
