//! A dispatcher that only logs what it would submit.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rerun_core::JobProgress;
use tracing::info;

use crate::backend::{Dispatcher, JobHandle, ReplayRequest};
use crate::error::BackendError;

/// Logs each replay and reports it finished on the first refresh.
#[derive(Debug, Default)]
pub struct DryRunDispatcher {
    next_id: AtomicU64,
}

impl DryRunDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many replays have been "submitted" so far.
    pub fn submitted(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Dispatcher for DryRunDispatcher {
    async fn submit(
        &self,
        job_name: &str,
        request: &ReplayRequest,
    ) -> Result<Box<dyn JobHandle>, BackendError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("dry_run_{}", n);
        info!(
            id = %id,
            job = %job_name,
            earliest = request.earliest,
            latest = request.latest,
            trigger_actions = request.trigger_actions,
            "would dispatch replay"
        );
        Ok(Box::new(DryRunHandle { id }))
    }
}

struct DryRunHandle {
    id: String,
}

#[async_trait]
impl JobHandle for DryRunHandle {
    fn id(&self) -> &str {
        &self.id
    }

    async fn refresh(&mut self) -> Result<JobProgress, BackendError> {
        Ok(JobProgress::done(0, 0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_handle_is_done_immediately() {
        let dispatcher = DryRunDispatcher::new();
        let request = ReplayRequest { earliest: 10, latest: 20, trigger_actions: true };

        let mut first = dispatcher.submit("a", &request).await.unwrap();
        let second = dispatcher.submit("b", &request).await.unwrap();

        assert_eq!(first.id(), "dry_run_1");
        assert_eq!(second.id(), "dry_run_2");
        assert_eq!(dispatcher.submitted(), 2);

        let progress = first.refresh().await.unwrap();
        assert!(progress.is_done);
        assert_eq!(progress.completion_percentage(), 100.0);
    }
}
