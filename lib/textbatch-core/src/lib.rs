//! # Textbatch Core
//!
//! Follow long-running batch text analysis jobs and read their results.
//!
//! A batch submits many documents and asks for several analyses ("actions") at once.
//! The service runs it as a job, then serves the results of each action as pages chained
//! by continuation tokens. This crate handles that life-cycle on top of any
//! [`BatchService`] implementation:
//!
//! - **[`BatchClient`]** validates and submits batches
//! - **[`BatchOperation`]** polls the job state machine, with a bounded exponential backoff,
//!   and cancels jobs
//! - **[`ActionResults`]** gives one handle per requested action, in request order
//! - **[`ResultCollection`]** lazily walks the result pages, yielding one
//!   [`DocumentOutcome`] per document
//!
//! ## Reading the results of a job
//!
//! ```rust
//! use textbatch_core::{
//!     ActionKind, AnalysisAction, AnalyzeOptions, BatchClient, BatchError, BatchService,
//!     TextDocumentInput,
//! };
//!
//! # async fn example<S: BatchService>(service: S) -> Result<(), BatchError>
//! # where S::Payload: std::fmt::Debug {
//! let client = BatchClient::new(service);
//! let mut operation = client
//!     .begin_analyze(
//!         vec![
//!             TextDocumentInput::new("1", "The food was great."),
//!             TextDocumentInput::new("2", "The service was slow."),
//!         ],
//!         vec![
//!             AnalysisAction::new(ActionKind::SentimentAnalysis),
//!             AnalysisAction::new(ActionKind::EntityRecognition),
//!         ],
//!         AnalyzeOptions::default(),
//!     )
//!     .await?;
//!
//! operation.wait_until_done().await?;
//!
//! for handle in &operation.action_results()? {
//!     let mut documents = handle.collection()?;
//!     while let Some(document) = documents.next().await? {
//!         // a failed document does not stop the enumeration
//!         match document.as_result() {
//!             Ok(value) => println!("{}: {value:?}", document.id()),
//!             Err(error) => println!("{} failed: {error}", document.id()),
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Polling budget
//!
//! Waiting always has a bound. [`PollOptions`] sets the backoff delays, the number of polls,
//! and optional timeouts:
//!
//! ```rust
//! use std::time::Duration;
//! use textbatch_core::{BatchClient, BatchService, PollOptions};
//!
//! # fn example<S: BatchService>(service: S) {
//! let client = BatchClient::builder(service)
//!     .with_poll_options(PollOptions {
//!         min_delay: Duration::from_secs(1),
//!         max_delay: Duration::from_secs(10),
//!         max_attempts: 30,
//!         max_wait: Some(Duration::from_secs(300)),
//!         ..PollOptions::default()
//!     })
//!     .build();
//! # }
//! ```
//!
//! Running out of polls gives [`BatchError::PollingExhausted`]; exceeding a timeout gives
//! [`BatchError::TimedOut`].
//!
//! ## Errors
//!
//! Every fault is a [`BatchError`] variant. Per-document failures are not faults: they
//! are yielded in place as errored [`DocumentOutcome`]s, carrying a [`DocumentError`].

mod client;
pub use self::client::{AnalyzeOptions, BatchClient, BatchClientBuilder};

mod error;
pub use self::error::{BatchError, FailureReason, ServiceError, TimedOperation};

mod model;
pub use self::model::{
    BatchStatistics, DocumentError, DocumentOutcome, DocumentOutcomeBuilder, ErrorCode,
    TextDocumentStatistics, Warning, WarningCode, WarningSet,
};

pub mod operation;
pub use self::operation::{
    ActionResultCollection, ActionResultHandle, ActionResults, BatchOperation, CancelOutcome,
    JobState, JobStatus, PollOptions,
};

pub mod paging;
pub use self::paging::{
    ContinuationToken, Page, PageRequest, PageSource, PaginationOptions, ResultCollection,
};

mod service;
pub use self::service::{
    ActionKind, AnalysisAction, BatchRequest, BatchService, CancelAck, JobId, TextDocumentInput,
};

mod timeout;
