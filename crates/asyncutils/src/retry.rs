use crate::error::{ErrorKind, Result};
use exn::Exn;
use std::error::Error as StdError;
use std::future::Future;

/// Attempts made by [`with_retries`] callers unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Run `action` until it succeeds or `max_attempts` is reached.
///
/// `action` receives the 1-based attempt number, letting callers adjust each
/// attempt (e.g. deprioritize retries). Every failed attempt is logged as a
/// warning; exhaustion itself is not. Once attempts run out, the returned
/// [`RetryExhausted`](ErrorKind::RetryExhausted) error holds each attempt's
/// error as a child, in attempt order.
///
/// A `max_attempts` of zero still makes one attempt.
pub async fn with_retries<T, E, F, Fut>(max_attempts: u32, mut action: F) -> Result<T>
where
    E: StdError + Send + Sync + 'static,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, Exn<E>>>,
{
    let max_attempts = max_attempts.max(1);
    let mut failures = Vec::with_capacity(max_attempts as usize);
    for attempt in 1..=max_attempts {
        match action(attempt).await {
            Ok(output) => return Ok(output),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, error = ?err, "Attempt failed; will retry later");
                failures.push(err);
            },
            Err(err) => {
                tracing::warn!(attempt, max_attempts, error = ?err, "Attempt failed; no attempts left");
                failures.push(err);
            },
        }
    }
    tracing::debug!(attempts = max_attempts, "Giving up after exhausting every attempt");
    Err(Exn::raise_all(ErrorKind::RetryExhausted(max_attempts), failures))
}
