use std::fmt;
use std::time::Duration;

use crate::model::DocumentError;
use crate::operation::JobState;
use crate::paging::ContinuationToken;
use crate::service::JobId;

/// Errors raised by the batch core.
///
/// Every fault is typed so callers can branch on the variant instead of matching messages.
/// Collection-level faults are scoped to one [`ResultCollection`](crate::ResultCollection),
/// job-level faults to one [`BatchOperation`](crate::BatchOperation).
///
/// The error is `Clone`: a collection that faulted hands the same error back on every
/// later attempt.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum BatchError {
    /// A value accessor was used on a document the service reported as failed.
    ///
    /// This is a contract violation on the caller side: check
    /// [`DocumentOutcome::is_error`](crate::DocumentOutcome::is_error) or match on
    /// [`DocumentOutcome::as_result`](crate::DocumentOutcome::as_result) instead.
    #[display("Document '{document_id}' has no value, it failed with {error}")]
    ResultIsError {
        /// The id of the errored document.
        document_id: String,
        /// The error the service reported for the document.
        error: DocumentError,
    },

    /// The service no longer accepts the continuation token.
    ///
    /// Not retried automatically: obtain a fresh collection to restart the enumeration.
    #[display("Continuation token '{token}' for action #{action_index} has expired")]
    ContinuationExpired {
        /// Index of the action whose results were being fetched.
        action_index: usize,
        /// The rejected token.
        token: ContinuationToken,
    },

    /// The polling budget ran out before the job reached a terminal state.
    #[display("Job {job_id} still {last_state} after {attempts} poll attempts")]
    PollingExhausted {
        /// The polled job.
        job_id: JobId,
        /// Number of polls issued, failed ones included.
        attempts: usize,
        /// The last state observed.
        last_state: JobState,
    },

    /// A single call did not complete within the caller-supplied timeout.
    #[display("{operation} timed out after {timeout:?}")]
    TimedOut {
        /// What was being awaited.
        operation: TimedOperation,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The job ended in the `failed` state.
    #[display("Job {job_id} failed: {reason}")]
    OperationFailed {
        /// The failed job.
        job_id: JobId,
        /// The errors reported by the service.
        reason: FailureReason,
    },

    /// Results were requested while the job cannot provide any.
    #[display("Results of job {job_id} are not available in state {state}")]
    ResultsUnavailable {
        /// The job.
        job_id: JobId,
        /// The state of the job when results were requested.
        state: JobState,
    },

    /// The service reported a state that cannot follow the current one.
    #[display("Job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The job.
        job_id: JobId,
        /// The current state.
        from: JobState,
        /// The reported state.
        to: JobState,
    },

    /// The input given to the core is invalid.
    #[display("Invalid input: {reason}")]
    InvalidInput {
        /// Why the input was rejected.
        reason: String,
    },

    /// The service collaborator failed.
    #[display("Service error: {_0}")]
    #[from]
    Service(ServiceError),
}

impl BatchError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures that another poll may get past.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Service(ServiceError::Transport { .. })
                | Self::TimedOut {
                    operation: TimedOperation::Poll,
                    ..
                }
        )
    }
}

/// Errors reported by the [`BatchService`](crate::BatchService) collaborator.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum ServiceError {
    /// The continuation token was rejected (expired, already used, or unknown).
    #[display("Continuation token rejected")]
    ContinuationRejected,

    /// The service does not know the job.
    #[display("Job {job_id} not found")]
    JobNotFound {
        /// The unknown job.
        job_id: JobId,
    },

    /// The request could not be completed.
    ///
    /// The collaborator already applied its own retry policy.
    #[display("Request failed: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },
}

impl ServiceError {
    /// Creates a [`ServiceError::Transport`] from any displayable failure.
    pub fn transport(error: impl fmt::Display) -> Self {
        Self::Transport {
            message: error.to_string(),
        }
    }
}

/// The call a [`BatchError::TimedOut`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TimedOperation {
    /// Submitting the batch.
    #[display("Submitting the batch")]
    Submit,
    /// A single status poll.
    #[display("Polling the job status")]
    Poll,
    /// Waiting for the job to reach a terminal state.
    #[display("Waiting for the job")]
    Wait,
    /// Fetching one page of results.
    #[display("Fetching a result page")]
    FetchPage,
    /// Requesting the cancellation.
    #[display("Cancelling the job")]
    Cancel,
}

/// The errors the service gave for a failed job.
#[derive(Debug, Clone, Default, PartialEq, derive_more::Deref)]
pub struct FailureReason(Vec<DocumentError>);

impl From<Vec<DocumentError>> for FailureReason {
    fn from(errors: Vec<DocumentError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return formatter.write_str("no reason given by the service");
        }
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                formatter.write_str("; ")?;
            }
            write!(formatter, "{error}")?;
        }
        Ok(())
    }
}
