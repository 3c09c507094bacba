use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JobState;
use crate::model::DocumentError;
use crate::paging::ContinuationToken;
use crate::service::ActionKind;

/// A snapshot of a job, as returned by one status poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    state: JobState,
    created_at: DateTime<Utc>,
    last_updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(default)]
    actions: Vec<ActionStatus>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

impl JobStatus {
    /// Starts building a status snapshot.
    pub fn builder(state: JobState, created_at: DateTime<Utc>) -> JobStatusBuilder {
        JobStatusBuilder {
            status: Self {
                state,
                created_at,
                last_updated_at: created_at,
                expires_at: None,
                display_name: None,
                actions: Vec::new(),
                errors: Vec::new(),
            },
        }
    }

    /// The job state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// When the job was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the job last changed.
    pub fn last_updated_at(&self) -> DateTime<Utc> {
        self.last_updated_at
    }

    /// When the service will discard the job and its results.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns `true` if the job results have been discarded at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// The job display name, if one was given at submission.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The per-action states, in request order.
    pub fn actions(&self) -> &[ActionStatus] {
        &self.actions
    }

    /// The state of the action at `index`.
    pub fn action(&self, index: usize) -> Option<&ActionStatus> {
        self.actions.get(index)
    }

    /// The job-level errors reported by the service.
    pub fn errors(&self) -> &[DocumentError] {
        &self.errors
    }

    /// Counts the actions by progress.
    pub fn action_counts(&self) -> ActionCounts {
        self.actions
            .iter()
            .fold(ActionCounts::default(), |mut counts, action| {
                counts.total += 1;
                match action.state {
                    JobState::Succeeded | JobState::PartiallyCompleted => counts.completed += 1,
                    JobState::Failed => counts.failed += 1,
                    JobState::Cancelled => counts.cancelled += 1,
                    JobState::NotStarted | JobState::Running | JobState::Cancelling => {
                        counts.in_progress += 1;
                    }
                }
                counts
            })
    }
}

/// Builds a [`JobStatus`].
#[derive(Debug, Clone)]
#[must_use]
pub struct JobStatusBuilder {
    status: JobStatus,
}

impl JobStatusBuilder {
    /// Sets the last update time; defaults to the creation time.
    pub fn with_last_updated_at(mut self, last_updated_at: DateTime<Utc>) -> Self {
        self.status.last_updated_at = last_updated_at;
        self
    }

    /// Sets the expiration time.
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.status.expires_at = Some(expires_at);
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.status.display_name = Some(display_name.into());
        self
    }

    /// Adds the state of the next action, in request order.
    pub fn add_action(mut self, action: ActionStatus) -> Self {
        self.status.actions.push(action);
        self
    }

    /// Adds a job-level error.
    pub fn add_error(mut self, error: DocumentError) -> Self {
        self.status.errors.push(error);
        self
    }

    /// Builds the snapshot.
    pub fn build(self) -> JobStatus {
        self.status
    }
}

/// The state of one action of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStatus {
    kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    state: JobState,
    last_updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    results_seed: Option<ContinuationToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<DocumentError>,
}

impl ActionStatus {
    /// Creates the state of an action.
    pub fn new(kind: impl Into<ActionKind>, state: JobState, last_updated_at: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            state,
            last_updated_at,
            results_seed: None,
            error: None,
        }
    }

    /// Sets the action name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the token to start reading results from, when the service gives one.
    #[must_use]
    pub fn with_results_seed(mut self, seed: impl Into<ContinuationToken>) -> Self {
        self.results_seed = Some(seed.into());
        self
    }

    /// Sets the action-level error.
    #[must_use]
    pub fn with_error(mut self, error: DocumentError) -> Self {
        self.error = Some(error);
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

    /// The action state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// When the action last changed.
    pub fn last_updated_at(&self) -> DateTime<Utc> {
        self.last_updated_at
    }

    /// The token the first result page is read with, `None` for the first page.
    pub fn results_seed(&self) -> Option<&ContinuationToken> {
        self.results_seed.as_ref()
    }

    /// The action-level error, if the action failed as a whole.
    pub fn error(&self) -> Option<&DocumentError> {
        self.error.as_ref()
    }
}

/// Number of actions of a job per progress bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCounts {
    /// Actions that completed, fully or partially.
    pub completed: usize,
    /// Actions that failed.
    pub failed: usize,
    /// Actions that were cancelled.
    pub cancelled: usize,
    /// Actions not finished yet.
    pub in_progress: usize,
    /// All actions.
    pub total: usize,
}
