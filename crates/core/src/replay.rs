use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::EpochSeconds;

/// Snapshot of a dispatched replay as reported by the execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JobProgress {
    pub is_done: bool,
    /// Fraction complete, `0.0..=1.0`.
    pub done_progress: f64,
    pub scan_count: u64,
    pub event_count: u64,
    pub result_count: u64,
}

impl JobProgress {
    /// A finished job with the given counts.
    pub fn done(scan_count: u64, event_count: u64, result_count: u64) -> Self {
        Self {
            is_done: true,
            done_progress: 1.0,
            scan_count,
            event_count,
            result_count,
        }
    }

    /// Progress as a percentage, clamped to `0..=100`.
    pub fn completion_percentage(&self) -> f64 {
        (self.done_progress * 100.0).clamp(0.0, 100.0)
    }
}

/// One record per replay that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub emitted_at: DateTime<Utc>,
    pub message: String,
    pub job_name: String,
    pub missed_run_time: EpochSeconds,
    pub missed_earliest: EpochSeconds,
    pub missed_latest: EpochSeconds,
    pub trigger_actions: bool,
    pub finished: bool,
    pub completion_percentage: f64,
    pub scan_count: u64,
    pub event_count: u64,
    pub result_count: u64,
}

impl ReplayResult {
    pub fn new(
        job_name: &str,
        run_time: EpochSeconds,
        earliest: EpochSeconds,
        latest: EpochSeconds,
        trigger_actions: bool,
        progress: &JobProgress,
    ) -> Self {
        Self {
            emitted_at: Utc::now(),
            message: format!("{} ran successfully for scheduled time {}", job_name, run_time),
            job_name: job_name.to_string(),
            missed_run_time: run_time,
            missed_earliest: earliest,
            missed_latest: latest,
            trigger_actions,
            finished: progress.is_done,
            completion_percentage: progress.completion_percentage(),
            scan_count: progress.scan_count,
            event_count: progress.event_count,
            result_count: progress.result_count,
        }
    }
}
