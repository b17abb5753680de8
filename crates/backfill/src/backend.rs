//! Contracts for the collaborators a backfill run talks to.
//!
//! The execution backend is reached through these traits only. A session is
//! expected to be opened once and shared (`Arc`) for the whole run; nothing
//! here is called concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use rerun_core::{EpochSeconds, JobDefinition, JobProgress};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Time bounds and options for one replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRequest {
    pub earliest: EpochSeconds,
    pub latest: EpochSeconds,
    pub trigger_actions: bool,
}

/// Source of job definitions, in the order they should be processed.
///
/// Implementations convert the registry's string-encoded flags before
/// returning.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    async fn job_definitions(&self) -> Result<Vec<JobDefinition>, BackendError>;
}

/// Whether the run that started the backfill is still alive.
#[async_trait]
pub trait ControlSignal: Send + Sync {
    async fn is_active(&self) -> Result<bool, BackendError>;
}

/// Direct lookup of the control job by run identifier.
#[async_trait]
pub trait ControlLookup: Send + Sync {
    async fn control_job(
        &self,
        run_id: &str,
    ) -> Result<Option<Arc<dyn ControlSignal>>, BackendError>;
}

/// A submitted replay.
#[async_trait]
pub trait JobHandle: Send {
    /// Backend identifier, for logging.
    fn id(&self) -> &str;

    /// Fetch the job's current progress.
    async fn refresh(&mut self) -> Result<JobProgress, BackendError>;
}

/// Submits replays to the execution backend.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn submit(
        &self,
        job_name: &str,
        request: &ReplayRequest,
    ) -> Result<Box<dyn JobHandle>, BackendError>;
}

/// Dispatch state of a backend job, parsed from its state string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    Queued,
    Parsing,
    Running,
    Paused,
    Finalizing,
    Failed,
    Done,
    Other(String),
}

impl DispatchState {
    /// Only a running control job keeps a backfill going.
    pub fn is_running(&self) -> bool {
        matches!(self, DispatchState::Running)
    }
}

impl From<&str> for DispatchState {
    fn from(s: &str) -> Self {
        match s {
            "QUEUED" => DispatchState::Queued,
            "PARSING" => DispatchState::Parsing,
            "RUNNING" => DispatchState::Running,
            "PAUSED" => DispatchState::Paused,
            "FINALIZING" => DispatchState::Finalizing,
            "FAILED" => DispatchState::Failed,
            "DONE" => DispatchState::Done,
            other => DispatchState::Other(other.to_string()),
        }
    }
}
