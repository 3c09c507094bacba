use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use tracing::{debug, warn};

use super::{ContinuationToken, Page, PageRequest};
use crate::error::{BatchError, ServiceError, TimedOperation};
use crate::timeout::within;

/// Something that serves pages of items, one continuation token at a time.
pub trait PageSource: Send + Sync {
    /// The type of the page items.
    type Item: Send;

    /// Fetches the page designated by `request.continuation`, or the first page.
    fn fetch_page(
        &self,
        request: PageRequest<'_>,
    ) -> impl Future<Output = Result<Page<Self::Item>, ServiceError>> + Send;

    /// The index of the action the pages belong to, used in error reports.
    fn action_index(&self) -> usize {
        0
    }

    /// The identity of an item, expected to be unique across all pages.
    ///
    /// Items without a key are not checked for duplicates.
    fn item_key(_item: &Self::Item) -> Option<&str> {
        None
    }
}

/// Options applied to every page fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationOptions {
    pub(crate) max_page_size: Option<NonZeroU32>,
    pub(crate) fetch_timeout: Option<Duration>,
}

impl PaginationOptions {
    /// Creates options with no page size hint and no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the service for at most `max_page_size` items per page.
    ///
    /// The service default applies when unset.
    #[must_use]
    pub fn with_max_page_size(mut self, max_page_size: NonZeroU32) -> Self {
        self.max_page_size = Some(max_page_size);
        self
    }

    /// Fails a page fetch with [`BatchError::TimedOut`] when it takes longer than `timeout`.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// The page size hint, if any.
    pub fn max_page_size(&self) -> Option<NonZeroU32> {
        self.max_page_size
    }

    /// The per-fetch timeout, if any.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout
    }
}

#[derive(Debug)]
enum Cursor {
    Start(Option<ContinuationToken>),
    Next(ContinuationToken),
    Done,
    Faulted(BatchError),
}

/// Fetches pages on demand, following continuation tokens.
///
/// `fetch_next` takes `&mut self`: there is never more than one fetch in flight, and
/// pages are returned in the order the tokens chain them. Each token is consumed by the
/// fetch that uses it.
///
/// Once a fetch fails, the paginator is faulted and returns the same error forever.
#[derive(Debug)]
pub struct Paginator<P> {
    source: P,
    cursor: Cursor,
    options: PaginationOptions,
    pages_fetched: usize,
}

impl<P> Paginator<P>
where
    P: PageSource,
{
    /// Creates a paginator starting at `seed`, or at the first page when `seed` is `None`.
    pub fn new(source: P, seed: Option<ContinuationToken>, options: PaginationOptions) -> Self {
        Self {
            source,
            cursor: Cursor::Start(seed),
            options,
            pages_fetched: 0,
        }
    }

    /// Fetches the next page, or returns `None` after the last one.
    ///
    /// # Errors
    ///
    /// - [`BatchError::ContinuationExpired`] if the service rejects the token
    /// - [`BatchError::TimedOut`] if the fetch exceeds the configured timeout
    /// - [`BatchError::Service`] for other collaborator failures
    ///
    /// After an error every later call returns the same error.
    ///
    /// Dropping the returned future before it completes leaves the paginator where it was:
    /// the next call fetches the same page again, with the same token.
    pub async fn fetch_next(&mut self) -> Result<Option<Page<P::Item>>, BatchError> {
        // the cursor only moves once the fetch resolved: dropping this future keeps the token
        let token = match &self.cursor {
            Cursor::Start(seed) => seed.clone(),
            Cursor::Next(token) => Some(token.clone()),
            Cursor::Done => return Ok(None),
            Cursor::Faulted(error) => return Err(error.clone()),
        };

        match self.fetch(token).await {
            Ok(page) => {
                self.pages_fetched += 1;
                self.cursor = match page.continuation() {
                    Some(next) => Cursor::Next(next.clone()),
                    None => Cursor::Done,
                };
                debug!(
                    action_index = self.source.action_index(),
                    page = self.pages_fetched,
                    items = page.items().len(),
                    last = page.is_last(),
                    "result page fetched"
                );
                Ok(Some(page))
            }
            Err(error) => {
                self.cursor = Cursor::Faulted(error.clone());
                Err(error)
            }
        }
    }

    async fn fetch(&self, token: Option<ContinuationToken>) -> Result<Page<P::Item>, BatchError> {
        let request = PageRequest {
            continuation: token.as_ref(),
            max_page_size: self.options.max_page_size,
        };
        let result = within(
            TimedOperation::FetchPage,
            self.options.fetch_timeout,
            self.source.fetch_page(request),
        )
        .await?;

        result.map_err(|error| match (error, token) {
            (ServiceError::ContinuationRejected, Some(token)) => {
                warn!(%token, action_index = self.source.action_index(), "continuation token rejected");
                BatchError::ContinuationExpired {
                    action_index: self.source.action_index(),
                    token,
                }
            }
            (error, _) => BatchError::Service(error),
        })
    }

    /// Number of pages successfully fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Returns `true` once the last page has been fetched.
    pub fn is_done(&self) -> bool {
        matches!(self.cursor, Cursor::Done)
    }

    /// The error that faulted this paginator, if any.
    pub fn fault(&self) -> Option<&BatchError> {
        match &self.cursor {
            Cursor::Faulted(error) => Some(error),
            _ => None,
        }
    }

    /// The page source.
    pub fn source(&self) -> &P {
        &self.source
    }
}
