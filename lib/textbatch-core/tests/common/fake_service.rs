use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use textbatch_core::operation::ActionStatus;
use textbatch_core::{
    BatchRequest, BatchService, BatchStatistics, CancelAck, DocumentError, DocumentOutcome,
    ErrorCode, JobId, JobState, JobStatus, Page, PageRequest, ServiceError,
    TextDocumentStatistics, Warning, WarningCode,
};

pub const MODEL_VERSION: &str = "2024-11-01";

/// An in-memory batch service.
///
/// - polls report the scripted states in order, then repeat the last one
/// - result pages hold `page_size` documents, the payload is `"<kind>:<document id>"`
/// - continuation tokens are single-use, and can all be expired at once
#[derive(Debug)]
pub struct FakeService {
    page_size: usize,
    poll_latency: Option<Duration>,
    document_failures: Vec<(usize, String, DocumentError)>,
    job_errors: Vec<DocumentError>,
    script: Mutex<VecDeque<JobState>>,
    job: Mutex<Option<Job>>,
    polls: AtomicUsize,
    fetches: AtomicUsize,
    cancels: AtomicUsize,
}

#[derive(Debug)]
struct Job {
    id: JobId,
    request: BatchRequest,
    state: JobState,
    issued_tokens: usize,
    live_tokens: HashMap<String, usize>,
}

impl Default for FakeService {
    fn default() -> Self {
        Self {
            page_size: 2,
            poll_latency: None,
            document_failures: Vec::new(),
            job_errors: Vec::new(),
            script: Mutex::default(),
            job: Mutex::default(),
            polls: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }
}

impl FakeService {
    pub fn with_states(states: impl IntoIterator<Item = JobState>) -> Self {
        Self {
            script: Mutex::new(states.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_poll_latency(mut self, latency: Duration) -> Self {
        self.poll_latency = Some(latency);
        self
    }

    /// Makes the document fail in the action at `action_index`.
    pub fn with_document_failure(
        mut self,
        action_index: usize,
        document_id: &str,
        error: DocumentError,
    ) -> Self {
        self.document_failures
            .push((action_index, document_id.to_string(), error));
        self
    }

    pub fn with_job_error(mut self, error: DocumentError) -> Self {
        self.job_errors.push(error);
        self
    }

    /// Invalidates every continuation token issued so far.
    pub fn expire_tokens(&self) {
        if let Some(job) = self.job.lock().expect("lock").as_mut() {
            job.live_tokens.clear();
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    fn status_of(&self, job: &Job) -> JobStatus {
        let now = Utc::now();
        let action_state = match job.state {
            JobState::PartiallyCompleted => JobState::Succeeded,
            state => state,
        };

        let mut builder = JobStatus::builder(job.state, now);
        if let Some(display_name) = job.request.display_name() {
            builder = builder.with_display_name(display_name);
        }
        for action in job.request.actions() {
            let mut status = ActionStatus::new(action.kind().clone(), action_state, now);
            if let Some(name) = action.name() {
                status = status.with_name(name);
            }
            builder = builder.add_action(status);
        }
        if job.state == JobState::Failed {
            for error in &self.job_errors {
                builder = builder.add_error(error.clone());
            }
        }
        builder.build()
    }

    fn outcome(
        &self,
        action_index: usize,
        kind: &str,
        document_id: &str,
        include_statistics: bool,
    ) -> DocumentOutcome<String> {
        let failure = self
            .document_failures
            .iter()
            .find(|(index, id, _)| *index == action_index && id == document_id);

        let mut builder = DocumentOutcome::builder(document_id);
        if include_statistics {
            builder = builder.with_statistics(TextDocumentStatistics {
                character_count: 42,
                transaction_count: 1,
            });
        }
        let outcome = match failure {
            Some((_, _, error)) => builder.failure(error.clone()),
            None => builder.success(format!("{kind}:{document_id}")),
        };
        outcome.expect("valid document id")
    }
}

impl BatchService for FakeService {
    type Payload = String;

    async fn submit_batch(&self, request: &BatchRequest) -> Result<JobId, ServiceError> {
        let id = JobId::from("job-1");
        *self.job.lock().expect("lock") = Some(Job {
            id: id.clone(),
            request: request.clone(),
            state: JobState::NotStarted,
            issued_tokens: 0,
            live_tokens: HashMap::new(),
        });
        Ok(id)
    }

    async fn poll_status(&self, job_id: &JobId) -> Result<JobStatus, ServiceError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.poll_latency {
            tokio::time::sleep(latency).await;
        }

        let mut guard = self.job.lock().expect("lock");
        let job = guard
            .as_mut()
            .filter(|job| &job.id == job_id)
            .ok_or_else(|| ServiceError::JobNotFound {
                job_id: job_id.clone(),
            })?;
        if let Some(state) = self.script.lock().expect("lock").pop_front() {
            job.state = state;
        }
        Ok(self.status_of(job))
    }

    async fn fetch_result_page(
        &self,
        job_id: &JobId,
        action_index: usize,
        request: PageRequest<'_>,
    ) -> Result<Page<DocumentOutcome<String>>, ServiceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let mut guard = self.job.lock().expect("lock");
        let job = guard
            .as_mut()
            .filter(|job| &job.id == job_id)
            .ok_or_else(|| ServiceError::JobNotFound {
                job_id: job_id.clone(),
            })?;
        let page_index = match request.continuation {
            None => 0,
            Some(token) => job
                .live_tokens
                .remove(token.as_str())
                .ok_or(ServiceError::ContinuationRejected)?,
        };
        let action = job
            .request
            .actions()
            .get(action_index)
            .ok_or_else(|| ServiceError::transport(format!("no action #{action_index}")))?;

        let page_size = request
            .max_page_size
            .and_then(|size| usize::try_from(size.get()).ok())
            .map_or(self.page_size, |size| self.page_size.min(size));
        let documents = job.request.documents();
        let start = page_index * page_size;
        let include_statistics = job.request.include_statistics();
        let items = documents
            .iter()
            .skip(start)
            .take(page_size)
            .map(|document| {
                self.outcome(action_index, action.kind().as_str(), document.id(), include_statistics)
            })
            .collect::<Vec<_>>();

        let mut builder = Page::builder(MODEL_VERSION);
        if include_statistics {
            let count = u32::try_from(items.len()).expect("small page");
            let invalid = u32::try_from(items.iter().filter(|item| item.is_error()).count())
                .expect("small page");
            builder = builder.with_statistics(BatchStatistics {
                document_count: count,
                valid_document_count: count - invalid,
                invalid_document_count: invalid,
                transaction_count: u64::from(count),
            });
        }
        if documents
            .iter()
            .skip(start)
            .take(page_size)
            .any(|document| document.text().is_empty())
        {
            builder = builder.add_warning(Warning::new(
                WarningCode::DocumentTruncated,
                format!("page {page_index} has empty documents"),
            ));
        }
        if start + page_size < documents.len() {
            job.issued_tokens += 1;
            let token = format!("a{action_index}-p{}-t{}", page_index + 1, job.issued_tokens);
            job.live_tokens.insert(token.clone(), page_index + 1);
            builder = builder.with_continuation(token);
        }

        Ok(builder.build(items))
    }

    async fn cancel(&self, job_id: &JobId) -> Result<CancelAck, ServiceError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);

        let guard = self.job.lock().expect("lock");
        let job = guard
            .as_ref()
            .filter(|job| &job.id == job_id)
            .ok_or_else(|| ServiceError::JobNotFound {
                job_id: job_id.clone(),
            })?;
        if job.state.is_terminal() {
            Ok(CancelAck::AlreadyFinished)
        } else {
            Ok(CancelAck::Accepted)
        }
    }
}

pub fn invalid_document(message: &str) -> DocumentError {
    DocumentError::new(ErrorCode::InvalidDocument, message)
}
