//! The boundary with the remote service.
//!
//! Transport, authentication, request bodies and JSON mapping live behind
//! [`BatchService`]. Implementations hand the core fully built values: statuses
//! through [`JobStatus::builder`], pages through [`Page::builder`], and documents
//! through [`DocumentOutcome::builder`](crate::DocumentOutcome::builder).

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::DocumentOutcome;
use crate::model::expandable::expandable_enum;
use crate::operation::JobStatus;
use crate::paging::{Page, PageRequest};

/// Opaque identifier of a submitted job.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct JobId(String);

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl JobId {
    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

expandable_enum! {
    /// The kind of analysis an action performs.
    pub enum ActionKind {
        /// Named entity recognition.
        EntityRecognition => "EntityRecognition",
        /// Personally identifiable information detection.
        PiiEntityRecognition => "PiiEntityRecognition",
        /// Key phrase extraction.
        KeyPhraseExtraction => "KeyPhraseExtraction",
        /// Linking entities to a knowledge base.
        EntityLinking => "EntityLinking",
        /// Sentiment analysis and opinion mining.
        SentimentAnalysis => "SentimentAnalysis",
        /// Language detection.
        LanguageDetection => "LanguageDetection",
        /// Healthcare entity extraction.
        Healthcare => "Healthcare",
        /// Entity recognition with a custom model.
        CustomEntityRecognition => "CustomEntityRecognition",
        /// Single label classification with a custom model.
        CustomSingleLabelClassification => "CustomSingleLabelClassification",
        /// Multi label classification with a custom model.
        CustomMultiLabelClassification => "CustomMultiLabelClassification",
        /// Extractive summarization.
        ExtractiveSummarization => "ExtractiveSummarization",
        /// Abstractive summarization.
        AbstractiveSummarization => "AbstractiveSummarization",
    }
}

/// One analysis requested for every document of a batch.
///
/// Action-specific parameters are the collaborator's concern; the core only needs
/// to identify the action and keep it in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisAction {
    kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_version: Option<String>,
}

impl AnalysisAction {
    /// Creates an action of the given kind.
    pub fn new(kind: impl Into<ActionKind>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            model_version: None,
        }
    }

    /// Names the action, so its results can be looked up by name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Pins the model version used by the service.
    #[must_use]
    pub fn with_model_version(mut self, model_version: impl Into<String>) -> Self {
        self.model_version = Some(model_version.into());
        self
    }

    /// The kind of analysis.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The action name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The requested model version, if pinned.
    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }
}

/// A document submitted for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentInput {
    id: String,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

impl TextDocumentInput {
    /// Creates a document input.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            language: None,
        }
    }

    /// Sets the language hint (ISO 639-1 code).
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// The document id, unique within the batch.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The language hint, if any.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

/// A validated batch, handed to [`BatchService::submit_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub(crate) documents: Vec<TextDocumentInput>,
    pub(crate) actions: Vec<AnalysisAction>,
    pub(crate) display_name: Option<String>,
    pub(crate) include_statistics: bool,
}

impl BatchRequest {
    /// The documents, in submission order.
    pub fn documents(&self) -> &[TextDocumentInput] {
        &self.documents
    }

    /// The actions, in request order.
    pub fn actions(&self) -> &[AnalysisAction] {
        &self.actions
    }

    /// The display name of the job, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Whether statistics were requested.
    pub fn include_statistics(&self) -> bool {
        self.include_statistics
    }
}

/// The service answer to a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAck {
    /// The service accepted the request.
    Accepted,
    /// The job had already finished on the service side.
    AlreadyFinished,
}

/// The remote batch analysis service.
///
/// Implementations are shared between an operation and all its result collections,
/// and must therefore be usable concurrently through a shared reference.
pub trait BatchService: Send + Sync + 'static {
    /// The action-specific value carried by a successful document.
    type Payload: Send + 'static;

    /// Submits a batch and returns the id of the created job.
    fn submit_batch(
        &self,
        request: &BatchRequest,
    ) -> impl Future<Output = Result<JobId, ServiceError>> + Send;

    /// Reads the current status of a job.
    fn poll_status(
        &self,
        job_id: &JobId,
    ) -> impl Future<Output = Result<JobStatus, ServiceError>> + Send;

    /// Fetches one page of results of the action at `action_index`.
    ///
    /// Documents in the returned page must already be in submission order.
    fn fetch_result_page(
        &self,
        job_id: &JobId,
        action_index: usize,
        request: PageRequest<'_>,
    ) -> impl Future<Output = Result<Page<DocumentOutcome<Self::Payload>>, ServiceError>> + Send;

    /// Asks the service to cancel a job.
    fn cancel(&self, job_id: &JobId) -> impl Future<Output = Result<CancelAck, ServiceError>> + Send;
}
