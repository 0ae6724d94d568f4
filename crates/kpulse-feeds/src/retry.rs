//! Exponential back-off with jitter for transient feed fetch failures.
//!
//! Every retry spends another outbound request from the run's fetch budget,
//! so callers keep `max_retries` small (the default is zero).

use std::future::Future;
use std::time::Duration;

use crate::error::FeedError;

/// Returns `true` for errors worth retrying: timeouts, connection failures,
/// HTTP 429, and 5xx responses. Parse failures and other statuses are final.
pub(crate) fn is_retriable(err: &FeedError) -> bool {
    match err {
        FeedError::Http { source, .. } => source.is_timeout() || source.is_connect(),
        FeedError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        FeedError::NoItems { .. } | FeedError::InvalidUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The sleep before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 % jitter,
/// capped at 10 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
{
    const MAX_DELAY_MS: u64 = 10_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient feed error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
