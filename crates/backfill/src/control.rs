use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::backend::{ControlLookup, ControlSignal};
use crate::error::{BackendError, BackfillError};

/// Resolve the control job for `run_id`.
///
/// A missing control job is fatal: without it the run cannot be cancelled.
pub async fn resolve_control(
    lookup: &dyn ControlLookup,
    run_id: &str,
) -> Result<Arc<dyn ControlSignal>, BackfillError> {
    match lookup.control_job(run_id).await? {
        Some(signal) => {
            info!(run_id = %run_id, "control job located");
            Ok(signal)
        }
        None => {
            error!(run_id = %run_id, "control job not found");
            Err(BackfillError::ControlJobNotFound(run_id.to_string()))
        }
    }
}

/// A local control signal: active until [`cancel`](FlagSignal::cancel) is called.
#[derive(Debug)]
pub struct FlagSignal {
    active: AtomicBool,
}

impl FlagSignal {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
        }
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::Relaxed);
    }
}

impl Default for FlagSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlSignal for FlagSignal {
    async fn is_active(&self) -> Result<bool, BackendError> {
        Ok(self.active.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ControlJob, InMemoryBackend};

    #[tokio::test]
    async fn flag_signal_flips_once() {
        let signal = FlagSignal::new();
        assert!(signal.is_active().await.unwrap());
        signal.cancel();
        assert!(!signal.is_active().await.unwrap());
    }

    #[tokio::test]
    async fn resolves_known_run() {
        let backend = InMemoryBackend::new(vec![]).with_control("1700000000.42", ControlJob::running());
        let signal = resolve_control(&backend, "1700000000.42").await.unwrap();
        assert!(signal.is_active().await.unwrap());
    }

    #[tokio::test]
    async fn unknown_run_is_fatal() {
        let backend = InMemoryBackend::new(vec![]);
        let err = resolve_control(&backend, "missing").await.err().unwrap();
        assert!(matches!(err, BackfillError::ControlJobNotFound(id) if id == "missing"));
    }
}
