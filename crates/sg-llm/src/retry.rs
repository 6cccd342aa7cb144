//! Transport-level retry with exponential backoff (spec §4.2/§7: 1, 2, 4s,
//! capped at 3 attempts). Kept separate from the semantic retry loop in
//! `generator.rs`, which changes prompt content rather than merely
//! re-sending the same request (SPEC_FULL.md "Design Notes" distinction).

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::LlmError;

const BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Retry a transport operation up to 3 times with 1/2/4s backoff.
/// Honors `Retry-After` when the caller's error carries one (passed
/// through `retry_after` on each failed attempt).
pub async fn retry_transport<F, Fut, T>(operation_name: &str, mut operation: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, (LlmError, Option<Duration>)>>,
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
    Err(last_err.unwrap_or_else(|| LlmError::Transport("retries exhausted".into())))
}
