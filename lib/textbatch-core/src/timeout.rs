use std::future::Future;
use std::time::Duration;

use crate::error::{BatchError, TimedOperation};

/// Awaits `future`, failing with [`BatchError::TimedOut`] once `timeout` elapses.
pub(crate) async fn within<F>(
    operation: TimedOperation,
    timeout: Option<Duration>,
    future: F,
) -> Result<F::Output, BatchError>
where
    F: Future,
{
    let Some(timeout) = timeout else {
        return Ok(future.await);
    };
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_elapsed| BatchError::TimedOut { operation, timeout })
}
