//! Shared HTTP retry policy (spec §7: exponential backoff 1/2/4s, 3
//! attempts, `Retry-After` honored), used unmodified across all four
//! external clients rather than reimplemented per-client.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ClientError;

const BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Retry `operation` up to `BACKOFF.len()` times. `operation` returns the
/// value plus an optional `Retry-After` hint on failure so rate-limited
/// responses can be honored ahead of the fixed backoff schedule.
pub async fn retry_http<F, Fut, T>(operation_name: &str, mut operation: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, (ClientError, Option<Duration>)>>,
{
    let mut last_err = None;
    for (attempt, backoff) in std::iter::once(Duration::ZERO).chain(BACKOFF).enumerate() {
        if attempt > 0 {
            tokio::time::sleep(backoff).await;
        }
        match operation().await {
            Ok(v) => return Ok(v),
            Err((e, retry_after)) => {
                if !e.is_retryable() {
                    return Err(e);
                }
                if let Some(delay) = retry_after {
                    debug!("{operation_name}: honoring Retry-After of {delay:?}");
                    tokio::time::sleep(delay).await;
                }
                warn!("{operation_name} attempt {} failed: {e}", attempt + 1);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| ClientError::transport("retries exhausted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_on_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, ClientError> = retry_http("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, ClientError> = retry_http("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err((ClientError::timeout("poll"), None))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
