//! Backfill error types.

use rerun_reltime::TimeExprError;
use thiserror::Error;

/// Failures reported by an external collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("registry error: {0}")]
    Registry(String),
}

/// Errors that end a backfill run.
#[derive(Debug, Error)]
pub enum BackfillError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("control job {0} not found")]
    ControlJobNotFound(String),

    /// Only surfaced when invalid jobs are not being skipped.
    #[error("job {job}: {source}")]
    Expression {
        job: String,
        #[source]
        source: TimeExprError,
    },

    /// Only surfaced when invalid jobs are not being skipped.
    #[error("job {job}: invalid cron schedule {schedule:?}: {reason}")]
    Schedule {
        job: String,
        schedule: String,
        reason: String,
    },
}
