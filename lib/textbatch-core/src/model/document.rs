use crate::error::BatchError;

use super::{DocumentError, TextDocumentStatistics, Warning, WarningSet};

/// The result of one action for one document: either a value or a service-reported error.
///
/// A `DocumentOutcome` is built once by the collaborator that maps a result page, through
/// [`DocumentOutcome::builder`], and is immutable afterwards. There is no way to turn an
/// errored document into a successful one.
///
/// # Example
///
/// ```rust
/// use textbatch_core::{DocumentError, DocumentOutcome, ErrorCode};
///
/// # fn example() -> Result<(), textbatch_core::BatchError> {
/// let ok = DocumentOutcome::builder("1").success("positive")?;
/// assert_eq!(ok.value()?, &"positive");
///
/// let failed = DocumentOutcome::builder("2")
///     .failure::<&str>(DocumentError::new(ErrorCode::InvalidDocument, "empty text"))?;
/// assert!(failed.is_error());
/// assert!(failed.value().is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome<T> {
    id: String,
    statistics: Option<TextDocumentStatistics>,
    warnings: WarningSet,
    result: Result<T, DocumentError>,
}

impl DocumentOutcome<()> {
    /// Starts building the outcome of the document `id`.
    pub fn builder(id: impl Into<String>) -> DocumentOutcomeBuilder {
        DocumentOutcomeBuilder {
            id: id.into(),
            statistics: None,
            warnings: WarningSet::new(),
        }
    }
}

impl<T> DocumentOutcome<T> {
    /// The document id, as submitted.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The document counters, when statistics were requested.
    pub fn statistics(&self) -> Option<&TextDocumentStatistics> {
        self.statistics.as_ref()
    }

    /// The warnings reported for this document; empty when there are none.
    pub fn warnings(&self) -> &WarningSet {
        &self.warnings
    }

    /// Returns `true` if the service failed to process this document.
    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }

    /// The service-reported error, if the document failed. Never faults.
    pub fn error(&self) -> Option<&DocumentError> {
        self.result.as_ref().err()
    }

    /// The analysis value.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::ResultIsError`] if the document failed.
    pub fn value(&self) -> Result<&T, BatchError> {
        self.result
            .as_ref()
            .map_err(|error| BatchError::ResultIsError {
                document_id: self.id.clone(),
                error: error.clone(),
            })
    }

    /// Consumes the outcome and returns the analysis value.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::ResultIsError`] if the document failed.
    pub fn into_value(self) -> Result<T, BatchError> {
        let Self { id, result, .. } = self;
        result.map_err(|error| BatchError::ResultIsError {
            document_id: id,
            error,
        })
    }

    /// Borrows the outcome as a plain `Result`, for pattern matching.
    pub fn as_result(&self) -> Result<&T, &DocumentError> {
        self.result.as_ref()
    }

    /// Consumes the outcome into a plain `Result`, dropping id, statistics and warnings.
    pub fn into_result(self) -> Result<T, DocumentError> {
        self.result
    }

    /// Transforms the value, keeping the id, statistics, warnings, or the error.
    pub fn map<U>(self, mapper: impl FnOnce(T) -> U) -> DocumentOutcome<U> {
        let Self {
            id,
            statistics,
            warnings,
            result,
        } = self;
        DocumentOutcome {
            id,
            statistics,
            warnings,
            result: result.map(mapper),
        }
    }
}

/// Builds a [`DocumentOutcome`].
///
/// Intended for the collaborator mapping service responses. The terminal methods
/// [`success`](Self::success) and [`failure`](Self::failure) decide once and for all
/// whether the document carries a value or an error.
#[derive(Debug, Clone)]
#[must_use]
pub struct DocumentOutcomeBuilder {
    id: String,
    statistics: Option<TextDocumentStatistics>,
    warnings: WarningSet,
}

impl DocumentOutcomeBuilder {
    /// Sets the document counters.
    pub fn with_statistics(mut self, statistics: TextDocumentStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Adds a warning.
    pub fn add_warning(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Replaces the warnings.
    pub fn with_warnings(mut self, warnings: impl Into<WarningSet>) -> Self {
        self.warnings = warnings.into();
        self
    }

    /// Builds a successful outcome.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidInput`] if the document id is empty.
    pub fn success<T>(self, value: T) -> Result<DocumentOutcome<T>, BatchError> {
        self.build(Ok(value))
    }

    /// Builds a failed outcome.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidInput`] if the document id is empty.
    pub fn failure<T>(self, error: DocumentError) -> Result<DocumentOutcome<T>, BatchError> {
        self.build(Err(error))
    }

    fn build<T>(self, result: Result<T, DocumentError>) -> Result<DocumentOutcome<T>, BatchError> {
        let Self {
            id,
            statistics,
            warnings,
        } = self;
        if id.trim().is_empty() {
            return Err(BatchError::invalid_input("document id must not be empty"));
        }

        Ok(DocumentOutcome {
            id,
            statistics,
            warnings,
            result,
        })
    }
}
