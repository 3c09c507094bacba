use std::collections::{HashSet, VecDeque};
use std::fmt;

use futures::Stream;
use tracing::{debug, warn};

use super::page::PageMetadata;
use super::{PageSource, Paginator};
use crate::error::BatchError;
use crate::model::{BatchStatistics, WarningSet};

#[derive(Debug, Default)]
struct CollectionMetadata {
    model_version: String,
    statistics: Option<BatchStatistics>,
    warnings: WarningSet,
    fetched_statistics: Option<BatchStatistics>,
}

impl CollectionMetadata {
    fn first(page: PageMetadata) -> Self {
        let PageMetadata {
            model_version,
            statistics,
            warnings,
        } = page;
        Self {
            model_version,
            statistics,
            warnings,
            fetched_statistics: statistics,
        }
    }

    fn append(&mut self, page: PageMetadata) {
        self.warnings.extend(page.warnings);
        self.fetched_statistics = match (self.fetched_statistics, page.statistics) {
            (Some(total), Some(more)) => Some(total.merge(more)),
            (total, more) => total.or(more),
        };
    }
}

/// A lazily fetched, forward-only sequence of results.
///
/// Items are pulled page by page through a [`Paginator`] as the caller asks for them,
/// and come out in the order the service returned them. The sequence cannot be
/// restarted: build a new collection to enumerate again.
///
/// - After the last item, [`next`](Self::next) keeps returning `Ok(None)` without
///   contacting the service.
/// - After a fetch failure, every later call returns that same error.
///
/// A collection is meant for a single consumer at a time; share it behind your own
/// lock if several tasks must read it.
///
/// An item whose [`PageSource::item_key`] was already seen is still yielded, but logged
/// and counted in [`duplicates`](Self::duplicates).
pub struct ResultCollection<P>
where
    P: PageSource,
{
    paginator: Paginator<P>,
    metadata: Option<CollectionMetadata>,
    buffer: VecDeque<P::Item>,
    yielded: usize,
    seen_keys: HashSet<String>,
    duplicates: usize,
}

impl<P> fmt::Debug for ResultCollection<P>
where
    P: PageSource,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ResultCollection")
            .field("pages_fetched", &self.pages_fetched())
            .field("buffered", &self.buffer.len())
            .field("yielded", &self.yielded)
            .field("duplicates", &self.duplicates)
            .field("fault", &self.fault())
            .finish_non_exhaustive()
    }
}

impl<P> ResultCollection<P>
where
    P: PageSource,
{
    /// Creates a collection reading its pages from `paginator`.
    pub fn new(paginator: Paginator<P>) -> Self {
        Self {
            paginator,
            metadata: None,
            buffer: VecDeque::new(),
            yielded: 0,
            seen_keys: HashSet::new(),
            duplicates: 0,
        }
    }

    /// Yields the next item, fetching a page when the buffered ones are used up.
    ///
    /// # Errors
    ///
    /// Returns the page fetch error; the collection is faulted afterwards.
    pub async fn next(&mut self) -> Result<Option<P::Item>, BatchError> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                self.yielded += 1;
                return Ok(Some(item));
            }
            if !self.pull_page().await? {
                return Ok(None);
            }
        }
    }

    /// Yields all the remaining items.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch error; items read before it are dropped.
    pub async fn collect_all(&mut self) -> Result<Vec<P::Item>, BatchError> {
        let mut items = Vec::with_capacity(self.buffer.len());
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Turns the collection into a stream of items.
    ///
    /// The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<P::Item, BatchError>> {
        futures::stream::try_unfold(self, |mut collection| async move {
            let item = collection.next().await?;
            Ok::<_, BatchError>(item.map(|item| (item, collection)))
        })
    }

    /// The version of the model that produced the results.
    ///
    /// Fetches the first page if it was not fetched yet.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch error.
    pub async fn model_version(&mut self) -> Result<&str, BatchError> {
        let metadata = self.first_page().await?;
        Ok(&metadata.model_version)
    }

    /// The batch counters reported with the first page.
    ///
    /// Fetches the first page if it was not fetched yet.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch error.
    pub async fn statistics(&mut self) -> Result<Option<&BatchStatistics>, BatchError> {
        let metadata = self.first_page().await?;
        Ok(metadata.statistics.as_ref())
    }

    /// The collection-level warnings of the pages fetched so far, in page order.
    ///
    /// Fetches the first page if it was not fetched yet.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch error.
    pub async fn warnings(&mut self) -> Result<&WarningSet, BatchError> {
        let metadata = self.first_page().await?;
        Ok(&metadata.warnings)
    }

    /// The sum of the batch counters of all pages fetched so far.
    ///
    /// Never fetches.
    pub fn fetched_statistics(&self) -> Option<BatchStatistics> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.fetched_statistics)
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.paginator.pages_fetched()
    }

    /// Number of items yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Number of fetched items whose key was already seen on an earlier item.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Returns `true` once every item has been yielded.
    pub fn is_exhausted(&self) -> bool {
        self.paginator.is_done() && self.buffer.is_empty()
    }

    /// The error that faulted this collection, if any.
    pub fn fault(&self) -> Option<&BatchError> {
        self.paginator.fault()
    }

    async fn first_page(&mut self) -> Result<&CollectionMetadata, BatchError> {
        if self.metadata.is_none() {
            self.pull_page().await?;
        }
        Ok(self.metadata.get_or_insert_with(CollectionMetadata::default))
    }

    async fn pull_page(&mut self) -> Result<bool, BatchError> {
        let Some(page) = self.paginator.fetch_next().await? else {
            return Ok(false);
        };

        let (page_metadata, items, _continuation) = page.into_parts();
        debug!(
            buffered = self.buffer.len(),
            received = items.len(),
            "appending result page"
        );
        for item in &items {
            let Some(key) = P::item_key(item) else {
                continue;
            };
            if !self.seen_keys.insert(key.to_owned()) {
                self.duplicates += 1;
                warn!(
                    key,
                    action_index = self.paginator.source().action_index(),
                    "duplicated item in result pages"
                );
            }
        }
        self.buffer.extend(items);
        match &mut self.metadata {
            Some(metadata) => metadata.append(page_metadata),
            None => self.metadata = Some(CollectionMetadata::first(page_metadata)),
        }
        Ok(true)
    }
}
