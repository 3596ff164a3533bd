//! Retry with exponential backoff for transient vendor-API failures.

use std::future::Future;
use std::time::Duration;

use crate::error::AdapterError;

/// Returns `true` if `err` is a transient condition worth retrying.
///
/// Network-level failures and 429/5xx statuses are retriable; parse and
/// deserialization errors are not; the same payload would fail again.
fn is_retriable(err: &AdapterError) -> bool {
    match err {
        AdapterError::Http(_) => true,
        AdapterError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// Executes `operation`, sleeping `backoff_base_secs * 2^attempt` seconds
/// between attempts. `max_retries` is the number of retries after the first
/// try; non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient vendor error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
