//! In-memory collaborators.
//!
//! [`InMemoryBackend`] stands in for a real execution backend: it serves a
//! fixed job list, resolves control jobs by run id, and completes each
//! submitted replay after a configurable number of polls while logging every
//! submission. [`RecordingSleeper`] returns immediately and remembers how long
//! it was asked to wait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rerun_core::{JobDefinition, JobProgress};

use crate::backend::{
    ControlLookup, ControlSignal, DispatchState, Dispatcher, JobHandle, JobRegistry, ReplayRequest,
};
use crate::error::BackendError;
use crate::sleeper::Sleeper;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Control job ─────────────────────────────────────────────────────

struct ControlState {
    state: String,
    /// Polls left before the job reports `DONE` on its own.
    running_polls: Option<usize>,
}

/// A control job whose dispatch state string can be changed from outside.
pub struct ControlJob {
    inner: Mutex<ControlState>,
}

impl ControlJob {
    pub fn with_state(state: &str) -> Self {
        Self {
            inner: Mutex::new(ControlState {
                state: state.to_string(),
                running_polls: None,
            }),
        }
    }

    pub fn running() -> Self {
        Self::with_state("RUNNING")
    }

    /// Running for the first `polls` checks, `DONE` afterwards.
    pub fn running_for(polls: usize) -> Self {
        let job = Self::running();
        lock(&job.inner).running_polls = Some(polls);
        job
    }

    pub fn set_state(&self, state: &str) {
        lock(&self.inner).state = state.to_string();
    }

    pub fn state(&self) -> DispatchState {
        DispatchState::from(lock(&self.inner).state.as_str())
    }
}

#[async_trait]
impl ControlSignal for ControlJob {
    async fn is_active(&self) -> Result<bool, BackendError> {
        let mut inner = lock(&self.inner);
        if let Some(remaining) = inner.running_polls.as_mut() {
            if *remaining == 0 {
                inner.state = "DONE".to_string();
                inner.running_polls = None;
            } else {
                *remaining -= 1;
            }
        }
        Ok(DispatchState::from(inner.state.as_str()).is_running())
    }
}

// ── Backend ─────────────────────────────────────────────────────────

/// One replay submitted to an [`InMemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub sid: String,
    pub job_name: String,
    pub request: ReplayRequest,
}

/// Registry, control lookup and dispatcher backed by plain memory.
pub struct InMemoryBackend {
    jobs: Vec<JobDefinition>,
    controls: HashMap<String, Arc<ControlJob>>,
    submissions: Arc<Mutex<Vec<Submission>>>,
    polls_until_done: u32,
    counts: (u64, u64, u64),
    next_sid: AtomicU64,
    unreachable: bool,
}

impl InMemoryBackend {
    pub fn new(jobs: Vec<JobDefinition>) -> Self {
        Self {
            jobs,
            controls: HashMap::new(),
            submissions: Arc::new(Mutex::new(Vec::new())),
            polls_until_done: 0,
            counts: (0, 0, 0),
            next_sid: AtomicU64::new(1),
            unreachable: false,
        }
    }

    /// Register a control job under `run_id`.
    pub fn with_control(mut self, run_id: &str, job: ControlJob) -> Self {
        self.controls.insert(run_id.to_string(), Arc::new(job));
        self
    }

    /// Number of refreshes that report "not done" before a replay completes.
    pub fn with_polls_until_done(mut self, polls: u32) -> Self {
        self.polls_until_done = polls;
        self
    }

    /// Scan, event and result counts reported by completed replays.
    pub fn with_counts(mut self, scan: u64, event: u64, result: u64) -> Self {
        self.counts = (scan, event, result);
        self
    }

    /// Make every registry call fail as if the backend could not be reached.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn control(&self, run_id: &str) -> Option<Arc<ControlJob>> {
        self.controls.get(run_id).cloned()
    }

    /// Every replay submitted so far, in submission order.
    pub fn submissions(&self) -> Vec<Submission> {
        lock(&self.submissions).clone()
    }
}

#[async_trait]
impl JobRegistry for InMemoryBackend {
    async fn job_definitions(&self) -> Result<Vec<JobDefinition>, BackendError> {
        if self.unreachable {
            return Err(BackendError::Connection("in-memory backend marked unreachable".into()));
        }
        Ok(self.jobs.clone())
    }
}

#[async_trait]
impl ControlLookup for InMemoryBackend {
    async fn control_job(
        &self,
        run_id: &str,
    ) -> Result<Option<Arc<dyn ControlSignal>>, BackendError> {
        Ok(self
            .controls
            .get(run_id)
            .map(|job| Arc::clone(job) as Arc<dyn ControlSignal>))
    }
}

#[async_trait]
impl Dispatcher for InMemoryBackend {
    async fn submit(
        &self,
        job_name: &str,
        request: &ReplayRequest,
    ) -> Result<Box<dyn JobHandle>, BackendError> {
        let sid = format!("replay_{}", self.next_sid.fetch_add(1, Ordering::Relaxed));
        lock(&self.submissions).push(Submission {
            sid: sid.clone(),
            job_name: job_name.to_string(),
            request: *request,
        });
        Ok(Box::new(MemoryHandle {
            sid,
            polls_left: self.polls_until_done,
            total_polls: self.polls_until_done,
            counts: self.counts,
        }))
    }
}

struct MemoryHandle {
    sid: String,
    polls_left: u32,
    total_polls: u32,
    counts: (u64, u64, u64),
}

#[async_trait]
impl JobHandle for MemoryHandle {
    fn id(&self) -> &str {
        &self.sid
    }

    async fn refresh(&mut self) -> Result<JobProgress, BackendError> {
        let (scan, event, result) = self.counts;
        if self.polls_left == 0 {
            return Ok(JobProgress::done(scan, event, result));
        }
        let elapsed = self.total_polls - self.polls_left;
        self.polls_left -= 1;
        Ok(JobProgress {
            is_done: false,
            done_progress: f64::from(elapsed) / f64::from(self.total_polls + 1),
            scan_count: scan / 2,
            event_count: event / 2,
            result_count: 0,
        })
    }
}

// ── Sleeper ─────────────────────────────────────────────────────────

/// Returns immediately, keeping a log of requested durations.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        lock(&self.slept).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.slept).push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn control_job_runs_for_n_polls() {
        let job = ControlJob::running_for(2);
        assert!(job.is_active().await.unwrap());
        assert!(job.is_active().await.unwrap());
        assert!(!job.is_active().await.unwrap());
        assert_eq!(job.state(), DispatchState::Done);
    }

    #[tokio::test]
    async fn control_state_can_be_flipped() {
        let job = ControlJob::running();
        job.set_state("FAILED");
        assert!(!job.is_active().await.unwrap());
    }

    #[tokio::test]
    async fn handle_completes_after_configured_polls() {
        let backend = InMemoryBackend::new(vec![]).with_polls_until_done(2).with_counts(8, 4, 1);
        let request = ReplayRequest { earliest: 0, latest: 60, trigger_actions: false };
        let mut handle = backend.submit("job", &request).await.unwrap();

        assert!(!handle.refresh().await.unwrap().is_done);
        assert!(!handle.refresh().await.unwrap().is_done);
        let done = handle.refresh().await.unwrap();
        assert!(done.is_done);
        assert_eq!((done.scan_count, done.event_count, done.result_count), (8, 4, 1));

        let subs = backend.submissions();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].sid, handle.id());
        assert_eq!(subs[0].request, request);
    }

    #[tokio::test]
    async fn unreachable_backend_fails_registry_calls() {
        let backend = InMemoryBackend::new(vec![]).unreachable();
        assert!(matches!(
            backend.job_definitions().await,
            Err(BackendError::Connection(_))
        ));
    }
}
