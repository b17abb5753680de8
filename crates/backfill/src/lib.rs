//! Replays scheduled jobs that were missed during an outage.
//!
//! This crate provides:
//! - Collaborator traits for the job registry, control job and dispatch backend
//! - Cron occurrence enumeration over an outage window
//! - [`BackfillScheduler`], which walks every matching job's missed runs,
//!   dispatches each replay with reconstructed time bounds and waits for it
//! - A YAML file registry, an in-memory backend and a dry-run dispatcher

pub mod backend;
pub mod control;
pub mod dry_run;
pub mod error;
pub mod memory;
pub mod occurrence;
pub mod registry;
pub mod scheduler;
pub mod sleeper;

pub use backend::{ControlLookup, ControlSignal, DispatchState, Dispatcher, JobHandle, JobRegistry, ReplayRequest};
pub use control::{resolve_control, FlagSignal};
pub use dry_run::DryRunDispatcher;
pub use error::{BackendError, BackfillError};
pub use occurrence::OccurrenceEnumerator;
pub use registry::{parse_registry, FileRegistry};
pub use scheduler::{BackfillRequest, BackfillRun, BackfillScheduler, RunOutcome, RunStats};
pub use sleeper::{Sleeper, TokioSleeper};
