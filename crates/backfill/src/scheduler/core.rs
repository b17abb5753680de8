//! [`BackfillScheduler`] and the per-run [`BackfillRequest`].

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use regex::Regex;
use rerun_core::{BackfillConfig, OutageWindow};
use rerun_reltime::RelativeTimeEvaluator;
use tracing::{debug, info};

use crate::backend::{ControlSignal, Dispatcher, JobRegistry};
use crate::error::BackfillError;
use crate::sleeper::{Sleeper, TokioSleeper};

use super::run::{BackfillRun, RunStats};

/// What to replay.
#[derive(Debug, Clone)]
pub struct BackfillRequest {
    /// Jobs whose name matches anywhere are replayed.
    pub filter: Regex,
    pub window: OutageWindow,
    pub trigger_actions: bool,
}

impl BackfillRequest {
    pub fn new(filter: Regex, window: OutageWindow) -> Self {
        Self {
            filter,
            window,
            trigger_actions: false,
        }
    }

    pub fn with_trigger_actions(mut self, trigger_actions: bool) -> Self {
        self.trigger_actions = trigger_actions;
        self
    }
}

/// Replays missed scheduled runs through a dispatch backend.
///
/// Snap boundaries and cron occurrences are computed in `Tz`.
pub struct BackfillScheduler<Tz: TimeZone = Local> {
    registry: Arc<dyn JobRegistry>,
    dispatcher: Arc<dyn Dispatcher>,
    control: Arc<dyn ControlSignal>,
    sleeper: Arc<dyn Sleeper>,
    evaluator: RelativeTimeEvaluator<Tz>,
    config: BackfillConfig,
}

impl BackfillScheduler<Local> {
    /// A scheduler working in the process's local timezone.
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        dispatcher: Arc<dyn Dispatcher>,
        control: Arc<dyn ControlSignal>,
    ) -> Self {
        Self::with_timezone(registry, dispatcher, control, Local)
    }
}

impl<Tz: TimeZone> BackfillScheduler<Tz> {
    pub fn with_timezone(
        registry: Arc<dyn JobRegistry>,
        dispatcher: Arc<dyn Dispatcher>,
        control: Arc<dyn ControlSignal>,
        tz: Tz,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            control,
            sleeper: Arc::new(TokioSleeper),
            evaluator: RelativeTimeEvaluator::new(tz),
            config: BackfillConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BackfillConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Load the registry and select the jobs to replay.
    ///
    /// A job is selected when its name matches the filter and it is
    /// scheduled and not disabled. Nothing is dispatched until the returned
    /// run is polled.
    pub async fn start(&self, request: BackfillRequest) -> Result<BackfillRun<Tz>, BackfillError> {
        let definitions = self.registry.job_definitions().await?;
        let jobs_considered = definitions.len();

        let jobs: VecDeque<_> = definitions
            .into_iter()
            .filter(|job| {
                let selected = request.filter.is_match(&job.name) && job.is_replayable();
                if !selected {
                    debug!(job = %job.name, "job not selected for backfill");
                }
                selected
            })
            .collect();

        info!(
            filter = %request.filter,
            start = request.window.start(),
            end = request.window.end(),
            trigger_actions = request.trigger_actions,
            jobs_considered,
            jobs_matched = jobs.len(),
            "starting backfill"
        );

        let stats = RunStats {
            jobs_considered,
            jobs_matched: jobs.len(),
            ..RunStats::default()
        };

        Ok(BackfillRun {
            jobs,
            current: None,
            request,
            dispatcher: Arc::clone(&self.dispatcher),
            control: Arc::clone(&self.control),
            sleeper: Arc::clone(&self.sleeper),
            evaluator: self.evaluator.clone(),
            config: self.config.clone(),
            stats,
        })
    }
}
