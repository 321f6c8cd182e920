//! Retry with exponential back-off and jitter for catalog requests.
//!
//! Transient failures (timeouts, connection errors, 429 and 5xx responses) are
//! retried. Everything else is returned immediately: a 404 or an unparsable
//! body will not change on the next attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` for errors worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &SourceError) -> bool {
    match err {
        SourceError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SourceError::RateLimited { .. } => true,
        SourceError::UnexpectedStatus { status, .. } => *status >= 500,
        SourceError::Deserialize { .. }
        | SourceError::PaginationLimit { .. }
        | SourceError::InvalidBaseUrl { .. }
        | SourceError::InvalidPage { .. } => false,
    }
}

/// Sleep before retry number `attempt` (1-based), before jitter.
///
/// Doubles from `backoff_base_ms` on each retry. A `Retry-After` hint on a
/// rate-limited response raises the wait to at least that many seconds.
/// The result never exceeds [`MAX_DELAY_MS`].
fn planned_delay_ms(attempt: u32, backoff_base_ms: u64, err: &SourceError) -> u64 {
    let exponent = attempt.saturating_sub(1).min(10);
    let doubled = backoff_base_ms.saturating_mul(1u64 << exponent);
    let hinted = match err {
        SourceError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1_000),
        _ => 0,
    };
    doubled.max(hinted).min(MAX_DELAY_MS)
}

/// Scales `delay_ms` by a random factor in `0.75..=1.25`.
fn jittered(delay_ms: u64) -> Duration {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let scaled = (delay_ms as f64 * rand::random_range(0.75..=1.25)) as u64;
    Duration::from_millis(scaled)
}

/// Calls `operation` until it succeeds, fails permanently, or has been
/// retried `max_retries` times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries >= max_retries || !is_retriable(&err) => return Err(err),
            Err(err) => err,
        };
        retries += 1;
        let delay = jittered(planned_delay_ms(retries, backoff_base_ms, &err));
        tracing::warn!(
            retry = retries,
            of = max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "catalog request failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
