use std::sync::Arc;
use std::time::Duration;

use super::BatchClient;
use crate::operation::PollOptions;
use crate::paging::PaginationOptions;
use crate::service::BatchService;

/// Builder for [`BatchClient`].
///
/// # Default Configuration
///
/// - **Polling**: [`PollOptions::default()`]
/// - **Pagination**: service page size, no fetch timeout
/// - **Submit timeout**: none
///
/// # Example
///
/// ```rust
/// # use textbatch_core::{BatchClient, BatchService, PaginationOptions, PollOptions};
/// # use std::time::Duration;
/// # fn example<S: BatchService>(service: S) {
/// let client = BatchClient::builder(service)
///     .with_poll_options(PollOptions {
///         max_attempts: 20,
///         ..PollOptions::default()
///     })
///     .with_pagination_options(
///         PaginationOptions::new().with_fetch_timeout(Duration::from_secs(10)),
///     )
///     .with_submit_timeout(Duration::from_secs(30))
///     .build();
/// # }
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct BatchClientBuilder<S> {
    service: S,
    poll_options: PollOptions,
    pagination: PaginationOptions,
    submit_timeout: Option<Duration>,
}

impl<S> BatchClientBuilder<S>
where
    S: BatchService,
{
    pub(super) fn new(service: S) -> Self {
        Self {
            service,
            poll_options: PollOptions::default(),
            pagination: PaginationOptions::default(),
            submit_timeout: None,
        }
    }

    /// Sets how operations created by the client poll their job.
    pub fn with_poll_options(mut self, poll_options: PollOptions) -> Self {
        self.poll_options = poll_options;
        self
    }

    /// Sets the options used by every result collection.
    pub fn with_pagination_options(mut self, pagination: PaginationOptions) -> Self {
        self.pagination = pagination;
        self
    }

    /// Fails a submission with [`BatchError::TimedOut`](crate::BatchError::TimedOut)
    /// when it takes longer than `timeout`.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = Some(timeout);
        self
    }

    /// Builds the client.
    pub fn build(self) -> BatchClient<S> {
        let Self {
            service,
            poll_options,
            pagination,
            submit_timeout,
        } = self;

        BatchClient {
            service: Arc::new(service),
            poll_options,
            pagination,
            submit_timeout,
        }
    }
}
