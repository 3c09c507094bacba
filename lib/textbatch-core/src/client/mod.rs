use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{BatchError, TimedOperation};
use crate::operation::{BatchOperation, PollOptions};
use crate::paging::PaginationOptions;
use crate::service::{AnalysisAction, BatchRequest, BatchService, JobId, TextDocumentInput};
use crate::timeout::within;

mod builder;
pub use self::builder::BatchClientBuilder;

/// Per-submission options of [`BatchClient::begin_analyze`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// A name for the job, reported back in its status.
    pub display_name: Option<String>,
    /// Asks the service for document and batch statistics.
    pub include_statistics: bool,
}

impl AnalyzeOptions {
    /// Creates options without display name nor statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the job display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Asks for statistics.
    #[must_use]
    pub fn with_statistics(mut self) -> Self {
        self.include_statistics = true;
        self
    }
}

/// Entry point: submits batches and follows their jobs.
///
/// The client is cheap to clone; clones share the same service.
///
/// ```rust
/// # use textbatch_core::{ActionKind, AnalysisAction, AnalyzeOptions, BatchClient, BatchError, BatchService, TextDocumentInput};
/// # async fn example<S: BatchService>(service: S) -> Result<(), BatchError> {
/// let client = BatchClient::new(service);
///
/// let mut operation = client
///     .begin_analyze(
///         vec![TextDocumentInput::new("1", "The food was great.")],
///         vec![AnalysisAction::new(ActionKind::SentimentAnalysis)],
///         AnalyzeOptions::new().with_statistics(),
///     )
///     .await?;
/// operation.wait_until_done().await?;
/// # Ok(())
/// # }
/// ```
pub struct BatchClient<S> {
    service: Arc<S>,
    poll_options: PollOptions,
    pagination: PaginationOptions,
    submit_timeout: Option<Duration>,
}

impl<S> Clone for BatchClient<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            poll_options: self.poll_options,
            pagination: self.pagination,
            submit_timeout: self.submit_timeout,
        }
    }
}

impl<S> fmt::Debug for BatchClient<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BatchClient")
            .field("poll_options", &self.poll_options)
            .field("pagination", &self.pagination)
            .field("submit_timeout", &self.submit_timeout)
            .finish_non_exhaustive()
    }
}

impl<S> BatchClient<S>
where
    S: BatchService,
{
    /// Creates a client with the default options.
    pub fn new(service: S) -> Self {
        Self::builder(service).build()
    }

    /// Starts configuring a client.
    pub fn builder(service: S) -> BatchClientBuilder<S> {
        BatchClientBuilder::new(service)
    }

    /// The service the client talks to.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submits a batch and returns the operation following its job.
    ///
    /// The returned operation is [`NotStarted`](crate::JobState::NotStarted) until its
    /// first poll.
    ///
    /// # Errors
    ///
    /// - [`BatchError::InvalidInput`] if there is no document, no action, a blank or
    ///   duplicated document id, or a duplicated action name
    /// - [`BatchError::TimedOut`] if the submission exceeds the submit timeout
    /// - [`BatchError::Service`] if the service rejects the submission
    pub async fn begin_analyze(
        &self,
        documents: Vec<TextDocumentInput>,
        actions: Vec<AnalysisAction>,
        options: AnalyzeOptions,
    ) -> Result<BatchOperation<S>, BatchError> {
        validate_documents(&documents)?;
        validate_actions(&actions)?;

        let AnalyzeOptions {
            display_name,
            include_statistics,
        } = options;
        let request = BatchRequest {
            documents,
            actions,
            display_name,
            include_statistics,
        };

        debug!(
            documents = request.documents.len(),
            actions = request.actions.len(),
            "submitting batch"
        );
        let job_id = within(
            TimedOperation::Submit,
            self.submit_timeout,
            self.service.submit_batch(&request),
        )
        .await??;
        info!(%job_id, "batch submitted");

        Ok(self.operation(job_id, request.actions))
    }

    /// Follows a job submitted earlier, knowing its id and its actions in request order.
    ///
    /// The operation starts as [`NotStarted`](crate::JobState::NotStarted); poll it to
    /// learn the actual state.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidInput`] if there is no action or a duplicated
    /// action name.
    pub fn resume(
        &self,
        job_id: impl Into<JobId>,
        actions: Vec<AnalysisAction>,
    ) -> Result<BatchOperation<S>, BatchError> {
        validate_actions(&actions)?;
        let job_id = job_id.into();
        debug!(%job_id, "resuming job");

        Ok(self.operation(job_id, actions))
    }

    fn operation(&self, job_id: JobId, actions: Vec<AnalysisAction>) -> BatchOperation<S> {
        BatchOperation::new(
            Arc::clone(&self.service),
            job_id,
            actions,
            self.poll_options,
            self.pagination,
        )
    }
}

fn validate_documents(documents: &[TextDocumentInput]) -> Result<(), BatchError> {
    if documents.is_empty() {
        return Err(BatchError::invalid_input("at least one document is required"));
    }

    let mut ids = HashSet::with_capacity(documents.len());
    for (index, document) in documents.iter().enumerate() {
        if document.id().trim().is_empty() {
            return Err(BatchError::invalid_input(format!(
                "document #{index} has a blank id"
            )));
        }
        if !ids.insert(document.id()) {
            return Err(BatchError::invalid_input(format!(
                "duplicated document id '{}'",
                document.id()
            )));
        }
    }
    Ok(())
}

fn validate_actions(actions: &[AnalysisAction]) -> Result<(), BatchError> {
    if actions.is_empty() {
        return Err(BatchError::invalid_input("at least one action is required"));
    }

    let mut names = HashSet::new();
    for name in actions.iter().filter_map(AnalysisAction::name) {
        if !names.insert(name) {
            return Err(BatchError::invalid_input(format!(
                "duplicated action name '{name}'"
            )));
        }
    }
    Ok(())
}
