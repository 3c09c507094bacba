use std::time::Duration;

use backon::ExponentialBuilder;

/// Default minimum delay between two polls.
pub const DEFAULT_MIN_POLL_DELAY: Duration = Duration::from_millis(500);

/// Default maximum delay between two polls.
pub const DEFAULT_MAX_POLL_DELAY: Duration = Duration::from_secs(30);

/// Default number of polls before giving up.
pub const DEFAULT_MAX_POLL_ATTEMPTS: usize = 60;

/// How [`BatchOperation::wait_until_done`](crate::BatchOperation::wait_until_done) polls.
///
/// Delays grow exponentially from `min_delay` to `max_delay`. The attempt budget is
/// mandatory: once `max_attempts` polls did not observe a terminal state, waiting fails
/// with [`BatchError::PollingExhausted`](crate::BatchError::PollingExhausted).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use textbatch_core::PollOptions;
///
/// let options = PollOptions {
///     min_delay: Duration::from_secs(1),
///     max_attempts: 10,
///     call_timeout: Some(Duration::from_secs(5)),
///     ..PollOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay before the second poll.
    pub min_delay: Duration,

    /// Upper bound of the delay between two polls.
    pub max_delay: Duration,

    /// Randomizes the delays, to spread the load of many waiting clients.
    pub jitter: bool,

    /// Maximum number of polls issued by one wait, failed polls included.
    ///
    /// A value of `0` behaves like `1`.
    pub max_attempts: usize,

    /// Upper bound of the whole wait.
    ///
    /// Exceeding it fails with [`BatchError::TimedOut`](crate::BatchError::TimedOut).
    pub max_wait: Option<Duration>,

    /// Timeout of each status poll and cancellation call.
    pub call_timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_MIN_POLL_DELAY,
            max_delay: DEFAULT_MAX_POLL_DELAY,
            jitter: false,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            max_wait: None,
            call_timeout: None,
        }
    }
}

impl PollOptions {
    pub(crate) fn backoff(&self) -> ExponentialBuilder {
        // the first poll happens immediately, only the following ones are delayed
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1));

        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}
