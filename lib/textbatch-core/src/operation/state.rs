use serde::{Deserialize, Serialize};

/// The life-cycle state of a batch job.
///
/// ```text
/// NotStarted ──► Running ──┬──► Succeeded
///                          ├──► PartiallyCompleted
///                          ├──► Failed
///                          └──► Cancelling ──► Cancelled
/// ```
///
/// `Succeeded`, `PartiallyCompleted`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    /// The job is queued.
    #[display("notStarted")]
    NotStarted,
    /// The job is being processed.
    #[display("running")]
    Running,
    /// A cancellation was requested and is in progress.
    #[display("cancelling")]
    Cancelling,
    /// Every action completed.
    #[display("succeeded")]
    Succeeded,
    /// The job completed, but some actions or documents failed.
    #[display("partiallyCompleted")]
    #[serde(alias = "partiallySucceeded")]
    PartiallyCompleted,
    /// The job failed as a whole.
    #[display("failed")]
    Failed,
    /// The job was cancelled.
    #[display("cancelled")]
    #[serde(alias = "canceled")]
    Cancelled,
}

impl JobState {
    /// Returns `true` for states no transition leaves.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::PartiallyCompleted | Self::Failed | Self::Cancelled
        )
    }

    /// Returns `true` if results can be read in this state.
    pub fn has_results(self) -> bool {
        matches!(self, Self::Succeeded | Self::PartiallyCompleted)
    }

    /// The states directly reachable from this one.
    pub fn successors(self) -> &'static [Self] {
        match self {
            Self::NotStarted => &[Self::Running],
            Self::Running => &[
                Self::Succeeded,
                Self::PartiallyCompleted,
                Self::Failed,
                Self::Cancelling,
            ],
            Self::Cancelling => &[Self::Cancelled],
            Self::Succeeded | Self::PartiallyCompleted | Self::Failed | Self::Cancelled => &[],
        }
    }

    /// Returns `true` if a poll may report `next` while the job is in this state.
    ///
    /// Polls are coarse: a job may go through several edges between two polls, so any
    /// state reachable through the transition graph is accepted, and so is the
    /// current state itself.
    pub fn can_advance_to(self, next: Self) -> bool {
        self == next
            || self
                .successors()
                .iter()
                .any(|&successor| successor.can_advance_to(next))
    }
}
