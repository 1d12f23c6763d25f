//! Timeout race for external calls

use crate::error::ResilienceError;
use std::future::Future;
use std::time::Duration;

/// Race `future` against a timer
///
/// Used for health checks of external collaborators. The future is dropped
/// when the timer wins.
pub async fn with_timeout<F>(duration: Duration, future: F) -> Result<F::Output, ResilienceError>
where
    F: Future,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| ResilienceError::Timeout(duration))
}
