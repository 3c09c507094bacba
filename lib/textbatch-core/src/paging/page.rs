use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::model::{BatchStatistics, Warning, WarningSet};

/// Opaque cursor to the next page of a result sequence.
///
/// A token is valid for a single fetch and only within the service session
/// that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display, derive_more::From)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl From<&str> for ContinuationToken {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl ContinuationToken {
    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameters of one result page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<'a> {
    /// The token of the page to fetch; `None` asks for the first page.
    pub continuation: Option<&'a ContinuationToken>,
    /// Upper bound on the number of items the service should return.
    pub max_page_size: Option<NonZeroU32>,
}

/// One page of results, as returned by the service.
///
/// A page without continuation token is the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<I> {
    items: Vec<I>,
    continuation: Option<ContinuationToken>,
    model_version: String,
    statistics: Option<BatchStatistics>,
    warnings: WarningSet,
}

impl Page<()> {
    /// Starts building a page produced by the model `model_version`.
    pub fn builder(model_version: impl Into<String>) -> PageBuilder {
        PageBuilder {
            model_version: model_version.into(),
            continuation: None,
            statistics: None,
            warnings: WarningSet::new(),
        }
    }
}

impl<I> Page<I> {
    /// The items of this page, in order.
    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// The token of the next page, `None` on the last page.
    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.continuation.as_ref()
    }

    /// Returns `true` if no page follows this one.
    pub fn is_last(&self) -> bool {
        self.continuation.is_none()
    }

    /// The version of the model that produced the results.
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// The batch counters reported with this page.
    pub fn statistics(&self) -> Option<&BatchStatistics> {
        self.statistics.as_ref()
    }

    /// The collection-level warnings reported with this page.
    pub fn warnings(&self) -> &WarningSet {
        &self.warnings
    }

    pub(crate) fn into_parts(self) -> (PageMetadata, Vec<I>, Option<ContinuationToken>) {
        let Self {
            items,
            continuation,
            model_version,
            statistics,
            warnings,
        } = self;
        let metadata = PageMetadata {
            model_version,
            statistics,
            warnings,
        };
        (metadata, items, continuation)
    }
}

/// The page-level data mirrored into the owning collection.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PageMetadata {
    pub(crate) model_version: String,
    pub(crate) statistics: Option<BatchStatistics>,
    pub(crate) warnings: WarningSet,
}

/// Builds a [`Page`].
#[derive(Debug, Clone)]
#[must_use]
pub struct PageBuilder {
    model_version: String,
    continuation: Option<ContinuationToken>,
    statistics: Option<BatchStatistics>,
    warnings: WarningSet,
}

impl PageBuilder {
    /// Sets the token of the next page.
    pub fn with_continuation(mut self, token: impl Into<ContinuationToken>) -> Self {
        self.continuation = Some(token.into());
        self
    }

    /// Sets the batch counters.
    pub fn with_statistics(mut self, statistics: BatchStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Adds a collection-level warning.
    pub fn add_warning(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Builds the page with its items, in order.
    pub fn build<I>(self, items: Vec<I>) -> Page<I> {
        let Self {
            model_version,
            continuation,
            statistics,
            warnings,
        } = self;
        Page {
            items,
            continuation,
            model_version,
            statistics,
            warnings,
        }
    }
}
