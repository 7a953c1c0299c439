//! Bounded retry for the fetch stage

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Retry budget for one download.
pub(crate) const MAX_FETCH_ATTEMPTS: u32 = 3;
/// Fixed backoff between attempts.
pub(crate) const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Failure classification for one fetch attempt.
#[derive(Error, Debug)]
pub(crate) enum FetchError {
    /// The request was aborted (timeout). "The operation was aborted" is
    /// not "the operation may succeed if retried": never retried.
    #[error("Request aborted: {0}")]
    Aborted(String),

    /// Terminal failure (client-side HTTP status, unusable destination).
    #[error("{0}")]
    Fatal(String),

    /// Network failure that may succeed on retry.
    #[error("{0}")]
    Transient(String),
}

/// Map a transport error to its retry class.
pub(crate) fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Aborted(error.to_string())
    } else {
        FetchError::Transient(error.to_string())
    }
}

/// Run `attempt` until it succeeds, a non-retriable failure occurs, or
/// the budget of [`MAX_FETCH_ATTEMPTS`] is spent, sleeping
/// [`RETRY_BACKOFF`] between transient failures. The returned error is
/// the last one observed.
pub(crate) async fn with_retry<T, F, Fut>(mut attempt: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut last = None;
    for number in 1..=MAX_FETCH_ATTEMPTS {
        match attempt(number).await {
            Ok(value) => return Ok(value),
            Err(FetchError::Transient(message)) => {
                tracing::warn!(attempt = number, error = %message, "transient fetch failure");
                last = Some(FetchError::Transient(message));
                if number < MAX_FETCH_ATTEMPTS {
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
            Err(error) => return Err(error),
        }
    }
    Err(last.unwrap_or_else(|| FetchError::Transient("fetch failed".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_spend_the_full_budget() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let started = tokio::time::Instant::now();
        let result: Result<(), _> = with_retry(move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Transient("connection reset".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(FetchError::Transient(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Two backoffs of one second each, none after the last attempt.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_short_circuits_after_one_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<(), _> = with_retry(move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Aborted("operation timed out".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(FetchError::Aborted(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_short_circuits() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<(), _> = with_retry(move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Fatal("404 Not Found".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(FetchError::Fatal(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failure() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result = with_retry(move |number| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if number < 3 {
                    Err(FetchError::Transient("flaky".to_string()))
                } else {
                    Ok(number)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
