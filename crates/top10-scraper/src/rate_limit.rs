//! Retry with exponential back-off and jitter for ranking source requests.
//!
//! Transient failures (429, 5xx, network errors) are retried; everything
//! else is returned immediately. The per-item loop relies on this to ride
//! out brief hiccups without dropping a whole country/category pair.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`]: HTTP 429; the server has asked us to back off.
/// - [`ScraperError::Http`]: network-level failure (connection reset, timeout, etc.).
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status; transient server error.
///
/// Non-retriable errors (propagated immediately):
/// - [`ScraperError::NotFound`]: 404; retrying would return the same result.
/// - [`ScraperError::UnexpectedStatus`] with a 4xx status.
/// - [`ScraperError::EmptyPayload`] / [`ScraperError::Parse`]: the body is
///   wrong, not the transport.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        ScraperError::NotFound { .. }
        | ScraperError::EmptyPayload { .. }
        | ScraperError::Parse { .. }
        | ScraperError::AllItemsFailed { .. }
        | ScraperError::SourcesExhausted { .. } => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps for
/// `backoff_base_ms * 2^(attempt - 1)` milliseconds (±25 % jitter, capped at
/// 30 s) and tries again, up to `max_retries` additional attempts after the
/// first try. If all retries are exhausted the last error is returned.
///
/// # Backoff schedule (example with `backoff_base_ms = 1_000`)
///
/// | Attempt | Sleep before next attempt |
/// |---------|---------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 %      |
/// | 2       | 1 000 ms × 2¹ ± 25 %      |
/// | 3       | 1 000 ms × 2² ± 25 %      |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
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
                    "transient source error — retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
