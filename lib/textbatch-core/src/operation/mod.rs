//! Job life-cycle: polling, cancellation, and access to the per-action results.

mod state;
pub use self::state::JobState;

mod status;
pub use self::status::{ActionCounts, ActionStatus, JobStatus, JobStatusBuilder};

mod options;
pub use self::options::{
    DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_MAX_POLL_DELAY, DEFAULT_MIN_POLL_DELAY, PollOptions,
};

mod batch_operation;
pub use self::batch_operation::{BatchOperation, CancelOutcome};

mod dispatch;
pub use self::dispatch::{ActionPages, ActionResultCollection, ActionResultHandle, ActionResults};
