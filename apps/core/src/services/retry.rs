use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use super::ServiceError;

/// Deadline and retry budget for a call to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    /// Deadline for each individual attempt.
    pub timeout: Duration,
    /// Extra attempts after the first one, only for transient failures.
    pub retries: u32,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            retries: 1,
        }
    }
}

impl CallPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Runs `call` under `policy`: every attempt gets its own deadline, and only
/// transient errors are retried.
pub async fn call_with_retry<T, F, Fut>(
    policy: CallPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let attempts = policy.retries + 1;
    let mut attempt = 1;

    loop {
        let err = match timeout(policy.timeout, call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(elapsed) => ServiceError::from(elapsed),
        };

        if attempt >= attempts || !err.is_transient() {
            return Err(err);
        }

        warn!(
            "{} failed (attempt {}/{}): {}. Retrying.",
            operation, attempt, attempts, err
        );
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> CallPolicy {
        CallPolicy::with_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ServiceError>(7) }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_once() {
        let calls = AtomicU32::new(0);
        let result: Result<u8, _> = call_with_retry(fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Unavailable("down".into())) }
        })
        .await;

        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u8, _> = call_with_retry(fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Protocol("garbage".into())) }
        })
        .await;

        assert!(matches!(result, Err(ServiceError::Protocol(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_then_success() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(fast_policy(), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                Ok::<_, ServiceError>("late")
            }
        })
        .await;

        assert_eq!(result, Ok("late"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
