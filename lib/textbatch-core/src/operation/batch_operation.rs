use std::fmt;
use std::sync::Arc;

use backon::BackoffBuilder;
use tracing::{debug, info, warn};

use super::dispatch::{ActionResults, DispatchContext, dispatch};
use super::{JobState, JobStatus, PollOptions};
use crate::error::{BatchError, TimedOperation};
use crate::paging::PaginationOptions;
use crate::service::{AnalysisAction, BatchService, CancelAck, JobId};
use crate::timeout::within;

/// What a [`BatchOperation::cancel`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The cancellation was sent and accepted by the service.
    Requested,
    /// A cancellation was already in progress, nothing was sent.
    AlreadyCancelling,
    /// The job had already reached this terminal state, nothing was sent.
    AlreadyTerminal(JobState),
    /// The service answered that the job had already finished.
    ///
    /// The next poll reports its final state.
    AlreadyFinished,
}

/// A submitted batch job.
///
/// The local state only moves forward:
/// - a [`poll`](Self::poll) adopts the state reported by the service,
/// - an accepted [`cancel`](Self::cancel) on a running job enters [`JobState::Cancelling`],
///   on a job that has not started it does so once a poll reports the job running.
///
/// Once terminal, the operation no longer contacts the service to poll or cancel.
pub struct BatchOperation<S> {
    service: Arc<S>,
    job_id: JobId,
    actions: Vec<AnalysisAction>,
    state: JobState,
    status: Option<JobStatus>,
    poll_options: PollOptions,
    pagination: PaginationOptions,
    polls: usize,
    cancel_requested: bool,
}

impl<S> fmt::Debug for BatchOperation<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BatchOperation")
            .field("job_id", &self.job_id)
            .field("state", &self.state)
            .field("actions", &self.actions.len())
            .field("polls", &self.polls)
            .field("cancel_requested", &self.cancel_requested)
            .finish_non_exhaustive()
    }
}

impl<S> BatchOperation<S>
where
    S: BatchService,
{
    pub(crate) fn new(
        service: Arc<S>,
        job_id: JobId,
        actions: Vec<AnalysisAction>,
        poll_options: PollOptions,
        pagination: PaginationOptions,
    ) -> Self {
        Self {
            service,
            job_id,
            actions,
            state: JobState::NotStarted,
            status: None,
            poll_options,
            pagination,
            polls: 0,
            cancel_requested: false,
        }
    }

    /// The id of the job on the service.
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// The requested actions, in request order.
    pub fn actions(&self) -> &[AnalysisAction] {
        &self.actions
    }

    /// The last known state. Never contacts the service.
    pub fn current_state(&self) -> JobState {
        self.state
    }

    /// Returns `true` once the job reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The snapshot returned by the last successful poll.
    pub fn status(&self) -> Option<&JobStatus> {
        self.status.as_ref()
    }

    /// Number of status requests sent to the service so far.
    pub fn poll_count(&self) -> usize {
        self.polls
    }

    /// Refreshes the state from the service.
    ///
    /// A terminal operation returns its state without contacting the service.
    ///
    /// # Errors
    ///
    /// - [`BatchError::InvalidTransition`] if the reported state cannot follow the current one
    /// - [`BatchError::TimedOut`] if the poll exceeds [`PollOptions::call_timeout`]
    /// - [`BatchError::Service`] if the service fails
    pub async fn poll(&mut self) -> Result<JobState, BatchError> {
        if self.state.is_terminal() {
            debug!(job_id = %self.job_id, state = %self.state, "job already terminal, not polling");
            return Ok(self.state);
        }

        self.polls += 1;
        let status = within(
            TimedOperation::Poll,
            self.poll_options.call_timeout,
            self.service.poll_status(&self.job_id),
        )
        .await??;

        self.apply(status)
    }

    fn apply(&mut self, status: JobStatus) -> Result<JobState, BatchError> {
        let current = self.state;
        let reported = status.state();

        if current == JobState::Cancelling && reported == JobState::Running {
            // the service has not processed the cancellation yet
            debug!(job_id = %self.job_id, "cancellation pending on the service side");
        } else if current.can_advance_to(reported) {
            self.state = reported;
            if reported.is_terminal() {
                info!(job_id = %self.job_id, from = %current, to = %reported, "job finished");
            } else if reported != current {
                debug!(job_id = %self.job_id, from = %current, to = %reported, "job state changed");
            }
            if self.cancel_requested && reported == JobState::Running {
                debug!(job_id = %self.job_id, "job started after its cancellation was accepted");
                self.state = JobState::Cancelling;
            }
        } else {
            warn!(job_id = %self.job_id, from = %current, to = %reported, "unexpected job state");
            return Err(BatchError::InvalidTransition {
                job_id: self.job_id.clone(),
                from: current,
                to: reported,
            });
        }

        self.status = Some(status);
        Ok(self.state)
    }

    /// Polls until the job reaches a terminal state.
    ///
    /// Polls are spaced with an exponential backoff configured by [`PollOptions`].
    /// Transient failures are logged and retried; they count as attempts.
    ///
    /// # Errors
    ///
    /// - [`BatchError::PollingExhausted`] when `max_attempts` polls did not observe a
    ///   terminal state
    /// - [`BatchError::TimedOut`] when the whole wait exceeds [`PollOptions::max_wait`]
    /// - any non-transient [`poll`](Self::poll) error
    pub async fn wait_until_done(&mut self) -> Result<JobState, BatchError> {
        let max_wait = self.poll_options.max_wait;
        within(TimedOperation::Wait, max_wait, self.poll_until_terminal()).await?
    }

    async fn poll_until_terminal(&mut self) -> Result<JobState, BatchError> {
        let mut delays = self.poll_options.backoff().build();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.poll().await {
                Ok(state) if state.is_terminal() => return Ok(state),
                Ok(state) => debug!(job_id = %self.job_id, %state, attempts, "job not done yet"),
                Err(error) if error.is_transient() => {
                    warn!(job_id = %self.job_id, %error, attempts, "poll failed, will retry");
                }
                Err(error) => return Err(error),
            }

            let Some(delay) = delays.next() else {
                warn!(job_id = %self.job_id, attempts, state = %self.state, "polling budget exhausted");
                return Err(BatchError::PollingExhausted {
                    job_id: self.job_id.clone(),
                    attempts,
                    last_state: self.state,
                });
            };
            tokio::time::sleep(delay).await;
        }
    }

    /// Asks the service to cancel the job.
    ///
    /// Nothing is sent when the job is terminal or already cancelling. When the job is
    /// running and the service accepts, the operation enters [`JobState::Cancelling`];
    /// a job that has not started keeps its state until the next poll, but later calls
    /// report [`CancelOutcome::AlreadyCancelling`].
    ///
    /// Collections obtained before the cancellation stay usable.
    ///
    /// # Errors
    ///
    /// - [`BatchError::TimedOut`] if the call exceeds [`PollOptions::call_timeout`]
    /// - [`BatchError::Service`] if the service fails
    pub async fn cancel(&mut self) -> Result<CancelOutcome, BatchError> {
        match self.state {
            JobState::Cancelling => return Ok(CancelOutcome::AlreadyCancelling),
            state if state.is_terminal() => {
                debug!(job_id = %self.job_id, %state, "job already terminal, not cancelling");
                return Ok(CancelOutcome::AlreadyTerminal(state));
            }
            _ if self.cancel_requested => {
                debug!(job_id = %self.job_id, "cancellation already accepted, not sending again");
                return Ok(CancelOutcome::AlreadyCancelling);
            }
            _ => {}
        }

        let ack = within(
            TimedOperation::Cancel,
            self.poll_options.call_timeout,
            self.service.cancel(&self.job_id),
        )
        .await??;

        match ack {
            CancelAck::Accepted => {
                self.cancel_requested = true;
                if self.state == JobState::Running {
                    self.state = JobState::Cancelling;
                }
                info!(job_id = %self.job_id, state = %self.state, "cancellation requested");
                Ok(CancelOutcome::Requested)
            }
            CancelAck::AlreadyFinished => {
                debug!(job_id = %self.job_id, "job finished before the cancellation");
                Ok(CancelOutcome::AlreadyFinished)
            }
        }
    }

    /// The result handles, one per requested action, in request order.
    ///
    /// When the job failed, the handles are returned but every collection request
    /// fails with [`BatchError::OperationFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::ResultsUnavailable`] if the job is not finished, or was cancelled.
    pub fn action_results(&self) -> Result<ActionResults<S>, BatchError> {
        dispatch(&DispatchContext {
            service: &self.service,
            job_id: &self.job_id,
            actions: &self.actions,
            state: self.state,
            status: self.status.as_ref(),
            pagination: self.pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::error::ServiceError;
    use crate::model::DocumentOutcome;
    use crate::paging::{Page, PageRequest};
    use crate::service::{ActionKind, BatchRequest};

    /// Answers polls with the scripted replies, then repeats the last state.
    #[derive(Debug, Default)]
    struct ScriptedService {
        replies: Mutex<VecDeque<Result<JobState, ServiceError>>>,
        last: Mutex<Option<JobState>>,
        polls: AtomicUsize,
        cancels: AtomicUsize,
        cancel_ack: Option<CancelAck>,
        poll_delay: Option<Duration>,
    }

    impl ScriptedService {
        fn replying(replies: impl IntoIterator<Item = Result<JobState, ServiceError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Self::default()
            }
        }

        fn states(states: impl IntoIterator<Item = JobState>) -> Self {
            Self::replying(states.into_iter().map(Ok))
        }
    }

    impl BatchService for ScriptedService {
        type Payload = ();

        async fn submit_batch(&self, _request: &BatchRequest) -> Result<JobId, ServiceError> {
            Ok(JobId::from("job"))
        }

        async fn poll_status(&self, _job_id: &JobId) -> Result<JobStatus, ServiceError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.poll_delay {
                tokio::time::sleep(delay).await;
            }
            let reply = self.replies.lock().expect("lock").pop_front();
            let state = match reply {
                Some(reply) => reply?,
                None => self.last.lock().expect("lock").unwrap_or(JobState::Running),
            };
            *self.last.lock().expect("lock") = Some(state);
            let created_at = Utc
                .with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
                .single()
                .expect("valid date");
            Ok(JobStatus::builder(state, created_at).build())
        }

        async fn fetch_result_page(
            &self,
            _job_id: &JobId,
            _action_index: usize,
            _request: PageRequest<'_>,
        ) -> Result<Page<DocumentOutcome<()>>, ServiceError> {
            Ok(Page::builder("v1").build(vec![]))
        }

        async fn cancel(&self, _job_id: &JobId) -> Result<CancelAck, ServiceError> {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            Ok(self.cancel_ack.unwrap_or(CancelAck::Accepted))
        }
    }

    fn fast_polls(max_attempts: usize) -> PollOptions {
        PollOptions {
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_attempts,
            ..PollOptions::default()
        }
    }

    fn operation(service: ScriptedService, options: PollOptions) -> BatchOperation<ScriptedService> {
        BatchOperation::new(
            Arc::new(service),
            JobId::from("job"),
            vec![AnalysisAction::new(ActionKind::SentimentAnalysis)],
            options,
            PaginationOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_new_operation_is_not_started() {
        let operation = operation(ScriptedService::default(), fast_polls(3));

        assert_eq!(operation.current_state(), JobState::NotStarted);
        assert!(!operation.is_terminal());
        assert!(operation.status().is_none());
    }

    #[tokio::test]
    async fn test_poll_may_skip_intermediate_states() {
        let mut operation = operation(ScriptedService::states([JobState::Succeeded]), fast_polls(3));

        let state = operation.poll().await.expect("poll");

        assert_eq!(state, JobState::Succeeded);
        assert!(operation.status().is_some());
    }

    #[tokio::test]
    async fn test_poll_after_terminal_does_not_contact_service() {
        let mut operation = operation(ScriptedService::states([JobState::Failed]), fast_polls(3));

        operation.poll().await.expect("first poll");
        operation.poll().await.expect("second poll");
        operation.poll().await.expect("third poll");

        assert_eq!(operation.service.polls.load(Ordering::SeqCst), 1);
        assert_eq!(operation.poll_count(), 1);
    }

    #[rstest]
    #[case(JobState::Running, JobState::NotStarted)]
    #[case(JobState::Cancelling, JobState::Succeeded)]
    #[tokio::test]
    async fn test_poll_rejects_unreachable_state(#[case] first: JobState, #[case] second: JobState) {
        let service = ScriptedService::states([JobState::Running, second]);
        let mut operation = operation(service, fast_polls(3));
        operation.poll().await.expect("running");
        if first == JobState::Cancelling {
            operation.cancel().await.expect("cancel");
        }

        let error = operation.poll().await.expect_err("invalid transition");

        assert!(matches!(
            error,
            BatchError::InvalidTransition { from, to, .. } if from == first && to == second
        ));
        assert_eq!(operation.current_state(), first);
    }

    #[tokio::test]
    async fn test_wait_until_done() {
        let service = ScriptedService::states([
            JobState::NotStarted,
            JobState::Running,
            JobState::Running,
            JobState::PartiallyCompleted,
        ]);
        let mut operation = operation(service, fast_polls(10));

        let state = operation.wait_until_done().await.expect("done");

        assert_eq!(state, JobState::PartiallyCompleted);
        assert_eq!(operation.poll_count(), 4);
    }

    #[tokio::test]
    async fn test_wait_retries_transport_failures() {
        let service = ScriptedService::replying([
            Err(ServiceError::transport("connection reset")),
            Ok(JobState::Running),
            Err(ServiceError::transport("connection reset")),
            Ok(JobState::Succeeded),
        ]);
        let mut operation = operation(service, fast_polls(4));

        let state = operation.wait_until_done().await.expect("done");

        assert_eq!(state, JobState::Succeeded);
    }

    #[tokio::test]
    async fn test_wait_stops_on_non_transient_failure() {
        let service = ScriptedService::replying([Err(ServiceError::JobNotFound {
            job_id: JobId::from("job"),
        })]);
        let mut operation = operation(service, fast_polls(5));

        let error = operation.wait_until_done().await.expect_err("not found");

        assert!(matches!(error, BatchError::Service(ServiceError::JobNotFound { .. })));
        assert_eq!(operation.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_wait_exhausts_budget() {
        let mut operation = operation(ScriptedService::states([JobState::Running]), fast_polls(3));

        let error = operation.wait_until_done().await.expect_err("exhausted");

        insta::assert_snapshot!(error, @"Job job still running after 3 poll attempts");
        assert_eq!(operation.service.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let service = ScriptedService {
            poll_delay: Some(Duration::from_millis(50)),
            ..ScriptedService::states([JobState::Running])
        };
        let options = PollOptions {
            max_wait: Some(Duration::from_millis(20)),
            ..fast_polls(100)
        };
        let mut operation = operation(service, options);

        let error = operation.wait_until_done().await.expect_err("timed out");

        assert!(matches!(
            error,
            BatchError::TimedOut {
                operation: TimedOperation::Wait,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        let mut operation = operation(
            ScriptedService::states([JobState::Running, JobState::Running, JobState::Cancelled]),
            fast_polls(3),
        );
        operation.poll().await.expect("running");

        let outcome = operation.cancel().await.expect("cancel");
        assert_eq!(outcome, CancelOutcome::Requested);
        assert_eq!(operation.current_state(), JobState::Cancelling);

        let again = operation.cancel().await.expect("cancel again");
        assert_eq!(again, CancelOutcome::AlreadyCancelling);
        assert_eq!(operation.service.cancels.load(Ordering::SeqCst), 1);

        // the service still reports the job as running
        assert_eq!(operation.poll().await.expect("stale"), JobState::Cancelling);
        assert_eq!(operation.poll().await.expect("cancelled"), JobState::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_not_started_job_waits_for_poll() {
        let mut operation = operation(ScriptedService::states([JobState::Cancelled]), fast_polls(3));

        let outcome = operation.cancel().await.expect("cancel");

        assert_eq!(outcome, CancelOutcome::Requested);
        assert_eq!(operation.current_state(), JobState::NotStarted);
        assert_eq!(operation.poll().await.expect("poll"), JobState::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_not_started_job_is_sent_once() {
        let mut operation = operation(
            ScriptedService::states([JobState::NotStarted, JobState::Running, JobState::Cancelled]),
            fast_polls(3),
        );

        assert_eq!(operation.cancel().await.expect("cancel"), CancelOutcome::Requested);
        assert_eq!(
            operation.cancel().await.expect("cancel again"),
            CancelOutcome::AlreadyCancelling
        );
        assert_eq!(operation.service.cancels.load(Ordering::SeqCst), 1);

        assert_eq!(operation.poll().await.expect("not started"), JobState::NotStarted);
        assert_eq!(
            operation.cancel().await.expect("still pending"),
            CancelOutcome::AlreadyCancelling
        );
        assert_eq!(operation.poll().await.expect("started"), JobState::Cancelling);
        assert_eq!(operation.poll().await.expect("cancelled"), JobState::Cancelled);
        assert_eq!(operation.service.cancels.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_terminal_job_is_a_no_op() {
        let mut operation = operation(ScriptedService::states([JobState::Succeeded]), fast_polls(3));
        operation.poll().await.expect("succeeded");

        let outcome = operation.cancel().await.expect("cancel");

        assert_eq!(outcome, CancelOutcome::AlreadyTerminal(JobState::Succeeded));
        assert_eq!(operation.service.cancels.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_finished_on_service_side() {
        let service = ScriptedService {
            cancel_ack: Some(CancelAck::AlreadyFinished),
            ..ScriptedService::states([JobState::Running])
        };
        let mut operation = operation(service, fast_polls(3));
        operation.poll().await.expect("running");

        let outcome = operation.cancel().await.expect("cancel");

        assert_eq!(outcome, CancelOutcome::AlreadyFinished);
        assert_eq!(operation.current_state(), JobState::Running);
    }

    #[tokio::test]
    async fn test_action_results_require_terminal_state() {
        let mut operation = operation(ScriptedService::states([JobState::Running]), fast_polls(3));
        operation.poll().await.expect("running");

        let error = operation.action_results().expect_err("unavailable");

        insta::assert_snapshot!(error, @"Results of job job are not available in state running");
    }
}
