//! [`BackfillRun`]: the lazy sequence of replays for one request.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use futures::stream::{self, Stream};
use rerun_core::{BackfillConfig, EpochSeconds, JobDefinition, JobProgress, ReplayResult};
use rerun_reltime::{RelativeTimeEvaluator, TimeExprError};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{ControlSignal, Dispatcher, JobHandle, ReplayRequest};
use crate::error::{BackendError, BackfillError};
use crate::occurrence::OccurrenceEnumerator;
use crate::sleeper::Sleeper;

use super::core::BackfillRequest;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every selected job was walked to the end of the window.
    Completed,
    /// The control signal went inactive.
    Stopped,
    /// A collaborator or strict-mode job error ended the run.
    Failed,
}

/// Counters for a run. `outcome` stays `None` while the run is live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub jobs_considered: usize,
    pub jobs_matched: usize,
    pub jobs_skipped: usize,
    pub replays_completed: usize,
    pub outcome: Option<RunOutcome>,
}

pub(super) struct ActiveJob<Tz: TimeZone> {
    job: JobDefinition,
    occurrences: OccurrenceEnumerator<Tz>,
    cursor: EpochSeconds,
}

/// One backfill in progress. Obtain with
/// [`BackfillScheduler::start`](super::BackfillScheduler::start).
pub struct BackfillRun<Tz: TimeZone = Local> {
    pub(super) jobs: VecDeque<JobDefinition>,
    pub(super) current: Option<ActiveJob<Tz>>,
    pub(super) request: BackfillRequest,
    pub(super) dispatcher: Arc<dyn Dispatcher>,
    pub(super) control: Arc<dyn ControlSignal>,
    pub(super) sleeper: Arc<dyn Sleeper>,
    pub(super) evaluator: RelativeTimeEvaluator<Tz>,
    pub(super) config: BackfillConfig,
    pub(super) stats: RunStats,
}

impl<Tz: TimeZone> BackfillRun<Tz> {
    /// Replay the next missed run and wait for it to finish.
    ///
    /// Returns `Ok(None)` once every job is exhausted or the control signal
    /// has gone inactive. Replays already submitted are never cancelled.
    /// After `None` or an error the run is over and keeps returning `None`.
    pub async fn next(&mut self) -> Result<Option<ReplayResult>, BackfillError> {
        if self.stats.outcome.is_some() {
            return Ok(None);
        }
        match self.advance().await {
            Ok(Some(result)) => {
                self.stats.replays_completed += 1;
                Ok(Some(result))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, "backfill failed");
                self.stats.outcome = Some(RunOutcome::Failed);
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Name of the job currently being replayed, if any.
    pub fn current_job(&self) -> Option<&str> {
        self.current.as_ref().map(|active| active.job.name.as_str())
    }

    /// Adapt the run into a [`Stream`]. The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<ReplayResult, BackfillError>> {
        stream::try_unfold(self, |mut run| async move {
            let item = run.next().await?;
            Ok::<_, BackfillError>(item.map(|result| (result, run)))
        })
    }

    async fn advance(&mut self) -> Result<Option<ReplayResult>, BackfillError> {
        let window = self.request.window;
        loop {
            if self.current.is_none() {
                match self.jobs.pop_front() {
                    Some(job) => {
                        self.current = self.activate(job)?;
                        continue;
                    }
                    None => {
                        info!(
                            replays_completed = self.stats.replays_completed,
                            jobs_skipped = self.stats.jobs_skipped,
                            "backfill complete"
                        );
                        self.stats.outcome = Some(RunOutcome::Completed);
                        return Ok(None);
                    }
                }
            }

            // Checked before every advance; a stop abandons the rest of the run.
            if !self.control.is_active().await? {
                info!(
                    job = self.current_job().unwrap_or_default(),
                    replays_completed = self.stats.replays_completed,
                    "control job no longer running, stopping backfill"
                );
                self.stats.outcome = Some(RunOutcome::Stopped);
                return Ok(None);
            }

            let Some(active) = self.current.as_mut() else {
                continue;
            };
            let next = active
                .occurrences
                .next_after(active.cursor)
                .filter(|run_time| window.admits(*run_time));
            let Some(run_time) = next else {
                info!(job = %active.job.name, "no further missed runs in window");
                self.current = None;
                continue;
            };
            active.cursor = run_time;
            let job = active.job.clone();

            match self.bounds(&job, run_time) {
                Ok((earliest, latest)) => {
                    return self.replay(&job.name, run_time, earliest, latest).await.map(Some);
                }
                Err(e) if self.config.skip_invalid_jobs => {
                    warn!(job = %job.name, run_time, error = %e, "skipping job with invalid time pattern");
                    self.stats.jobs_skipped += 1;
                    self.current = None;
                }
                Err(e) => {
                    return Err(BackfillError::Expression {
                        job: job.name,
                        source: e,
                    });
                }
            }
        }
    }

    fn activate(&mut self, job: JobDefinition) -> Result<Option<ActiveJob<Tz>>, BackfillError> {
        let tz = self.evaluator.timezone().clone();
        match OccurrenceEnumerator::new(&job.cron_schedule, tz) {
            Ok(occurrences) => {
                info!(job = %job.name, cron = %job.cron_schedule, "backfilling job");
                Ok(Some(ActiveJob {
                    cursor: self.request.window.start(),
                    job,
                    occurrences,
                }))
            }
            Err(e) if self.config.skip_invalid_jobs => {
                warn!(job = %job.name, cron = %job.cron_schedule, error = %e, "skipping job with invalid cron schedule");
                self.stats.jobs_skipped += 1;
                Ok(None)
            }
            Err(e) => Err(BackfillError::Schedule {
                job: job.name,
                schedule: job.cron_schedule,
                reason: e.to_string(),
            }),
        }
    }

    fn bounds(
        &self,
        job: &JobDefinition,
        run_time: EpochSeconds,
    ) -> Result<(EpochSeconds, EpochSeconds), TimeExprError> {
        let earliest = self.evaluator.evaluate(&job.earliest_pattern, run_time)?;
        let latest = self.evaluator.evaluate(&job.latest_pattern, run_time)?;
        Ok((earliest, latest))
    }

    async fn replay(
        &self,
        job_name: &str,
        run_time: EpochSeconds,
        earliest: EpochSeconds,
        latest: EpochSeconds,
    ) -> Result<ReplayResult, BackfillError> {
        let request = ReplayRequest {
            earliest,
            latest,
            trigger_actions: self.request.trigger_actions,
        };
        let mut handle = self.dispatcher.submit(job_name, &request).await?;
        info!(
            job = %job_name,
            id = %handle.id(),
            run_time,
            earliest,
            latest,
            trigger_actions = request.trigger_actions,
            "dispatched replay"
        );

        let progress = self.await_completion(handle.as_mut()).await?;
        let result = ReplayResult::new(
            job_name,
            run_time,
            earliest,
            latest,
            request.trigger_actions,
            &progress,
        );
        info!(id = %handle.id(), "{}", result.message);
        Ok(result)
    }

    /// Settle, then poll at a fixed interval until the backend reports done.
    async fn await_completion(&self, handle: &mut dyn JobHandle) -> Result<JobProgress, BackendError> {
        self.sleeper.sleep(self.config.settle_delay()).await;
        loop {
            let progress = handle.refresh().await?;
            if progress.is_done {
                return Ok(progress);
            }
            debug!(
                id = %handle.id(),
                percent = progress.completion_percentage(),
                "replay still running"
            );
            self.sleeper.sleep(self.config.poll_interval()).await;
        }
    }
}
