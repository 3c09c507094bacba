use std::fmt;
use std::future::Future;
use std::slice;
use std::sync::Arc;

use crate::error::{BatchError, FailureReason, ServiceError};
use crate::model::DocumentOutcome;
use crate::operation::{ActionStatus, JobState, JobStatus};
use crate::paging::{Page, PageRequest, PageSource, PaginationOptions, Paginator, ResultCollection};
use crate::service::{ActionKind, AnalysisAction, BatchService, JobId};

/// The result pages of one action of a job.
pub struct ActionPages<S> {
    service: Arc<S>,
    job_id: JobId,
    action_index: usize,
}

impl<S> fmt::Debug for ActionPages<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ActionPages")
            .field("job_id", &self.job_id)
            .field("action_index", &self.action_index)
            .finish_non_exhaustive()
    }
}

impl<S> PageSource for ActionPages<S>
where
    S: BatchService,
{
    type Item = DocumentOutcome<S::Payload>;

    fn fetch_page(
        &self,
        request: PageRequest<'_>,
    ) -> impl Future<Output = Result<Page<Self::Item>, ServiceError>> + Send {
        self.service
            .fetch_result_page(&self.job_id, self.action_index, request)
    }

    fn action_index(&self) -> usize {
        self.action_index
    }

    fn item_key(item: &Self::Item) -> Option<&str> {
        Some(item.id())
    }
}

/// The documents produced by one action, fetched lazily.
pub type ActionResultCollection<S> = ResultCollection<ActionPages<S>>;

/// Gives access to the results of one requested action.
///
/// A handle is cheap: nothing is fetched until its collection is read.
pub struct ActionResultHandle<S> {
    service: Arc<S>,
    job_id: JobId,
    index: usize,
    action: AnalysisAction,
    status: Option<ActionStatus>,
    failure: Option<BatchError>,
    pagination: PaginationOptions,
}

impl<S> Clone for ActionResultHandle<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            job_id: self.job_id.clone(),
            index: self.index,
            action: self.action.clone(),
            status: self.status.clone(),
            failure: self.failure.clone(),
            pagination: self.pagination,
        }
    }
}

impl<S> fmt::Debug for ActionResultHandle<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ActionResultHandle")
            .field("job_id", &self.job_id)
            .field("index", &self.index)
            .field("action", &self.action)
            .field("status", &self.status)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl<S> ActionResultHandle<S>
where
    S: BatchService,
{
    /// The position of the action in the request.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The requested action.
    pub fn action(&self) -> &AnalysisAction {
        &self.action
    }

    /// The action state reported by the last poll, if the service reported one.
    pub fn status(&self) -> Option<&ActionStatus> {
        self.status.as_ref()
    }

    /// Creates a new collection over the action results, starting from the first page.
    ///
    /// Every call gives an independent collection with its own cursor, so an
    /// enumeration that faulted can be restarted by asking for a new one.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::OperationFailed`] when the job failed.
    pub fn collection(&self) -> Result<ActionResultCollection<S>, BatchError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        let pages = ActionPages {
            service: Arc::clone(&self.service),
            job_id: self.job_id.clone(),
            action_index: self.index,
        };
        let seed = self.status.as_ref().and_then(|status| status.results_seed().cloned());

        Ok(ResultCollection::new(Paginator::new(pages, seed, self.pagination)))
    }
}

/// The result handles of a job, one per requested action, in request order.
pub struct ActionResults<S> {
    handles: Vec<ActionResultHandle<S>>,
}

impl<S> fmt::Debug for ActionResults<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(&self.handles).finish()
    }
}

impl<S> ActionResults<S>
where
    S: BatchService,
{
    /// The handle of the action at `index`.
    pub fn get(&self, index: usize) -> Option<&ActionResultHandle<S>> {
        self.handles.get(index)
    }

    /// The handle of the action named `name`.
    pub fn by_name(&self, name: &str) -> Option<&ActionResultHandle<S>> {
        self.handles
            .iter()
            .find(|handle| handle.action.name() == Some(name))
    }

    /// The handles of the actions of `kind`, in request order.
    pub fn by_kind<'a>(
        &'a self,
        kind: &'a ActionKind,
    ) -> impl Iterator<Item = &'a ActionResultHandle<S>> + 'a {
        self.handles
            .iter()
            .filter(move |handle| handle.action.kind() == kind)
    }

    /// Iterates over the handles in request order.
    pub fn iter(&self) -> slice::Iter<'_, ActionResultHandle<S>> {
        self.handles.iter()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if the job has no action.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<S> IntoIterator for ActionResults<S> {
    type Item = ActionResultHandle<S>;
    type IntoIter = std::vec::IntoIter<ActionResultHandle<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.into_iter()
    }
}

impl<'a, S> IntoIterator for &'a ActionResults<S> {
    type Item = &'a ActionResultHandle<S>;
    type IntoIter = slice::Iter<'a, ActionResultHandle<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.iter()
    }
}

/// What a job exposes to [`dispatch`].
pub(crate) struct DispatchContext<'a, S> {
    pub(crate) service: &'a Arc<S>,
    pub(crate) job_id: &'a JobId,
    pub(crate) actions: &'a [AnalysisAction],
    pub(crate) state: JobState,
    pub(crate) status: Option<&'a JobStatus>,
    pub(crate) pagination: PaginationOptions,
}

/// Builds one handle per requested action.
///
/// A failed job still gets its handles, all of them carrying the same
/// [`BatchError::OperationFailed`].
pub(crate) fn dispatch<S>(context: &DispatchContext<'_, S>) -> Result<ActionResults<S>, BatchError>
where
    S: BatchService,
{
    let failure = match context.state {
        JobState::Succeeded | JobState::PartiallyCompleted => None,
        JobState::Failed => Some(BatchError::OperationFailed {
            job_id: context.job_id.clone(),
            reason: failure_reason(context.status),
        }),
        state @ (JobState::NotStarted
        | JobState::Running
        | JobState::Cancelling
        | JobState::Cancelled) => {
            return Err(BatchError::ResultsUnavailable {
                job_id: context.job_id.clone(),
                state,
            });
        }
    };

    let handles = context
        .actions
        .iter()
        .enumerate()
        .map(|(index, action)| ActionResultHandle {
            service: Arc::clone(context.service),
            job_id: context.job_id.clone(),
            index,
            action: action.clone(),
            status: context.status.and_then(|status| status.action(index)).cloned(),
            failure: failure.clone(),
            pagination: context.pagination,
        })
        .collect();

    Ok(ActionResults { handles })
}

/// The job-level errors, or the action-level ones when the job reported none.
fn failure_reason(status: Option<&JobStatus>) -> FailureReason {
    let Some(status) = status else {
        return FailureReason::default();
    };
    if !status.errors().is_empty() {
        return FailureReason::from(status.errors().to_vec());
    }
    status
        .actions()
        .iter()
        .filter_map(|action| action.error().cloned())
        .collect::<Vec<_>>()
        .into()
}
