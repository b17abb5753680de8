//! End-to-end backfill runs over a YAML registry.
//!
//! The registry is read from disk; dispatch and control go through the
//! in-memory backend so no real time passes.

use std::io::Write;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use rerun_backfill::dry_run::DryRunDispatcher;
use rerun_backfill::memory::{ControlJob, InMemoryBackend, RecordingSleeper};
use rerun_backfill::registry::FileRegistry;
use rerun_backfill::*;
use rerun_core::{EpochSeconds, OutageWindow};

const RUN_ID: &str = "scheduler__admin__search__RMD5rerun_at_1548821829_42";

fn at(s: &str) -> EpochSeconds {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .unwrap()
        .and_utc()
        .timestamp()
}

fn write_registry(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

fn example_registry() -> FileRegistry {
    FileRegistry::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/jobs.example.yml"))
}

fn request(filter: &str, start: &str, end: &str) -> BackfillRequest {
    BackfillRequest::new(
        Regex::new(filter).unwrap(),
        OutageWindow::new(at(start), at(end)).unwrap(),
    )
}

// ── Registry + control ──────────────────────────────────────────────

#[tokio::test]
async fn file_registry_drives_a_full_run() {
    let file = write_registry(
        r#"
jobs:
  - name: "TEST-0001-test search"
    cron_schedule: "0 4 * * *"
    earliest: "-1d@d"
    latest: "@d"
    is_scheduled: "1"
    disabled: "0"
  - name: "TEST-0002-disabled"
    cron_schedule: "0 4 * * *"
    earliest: "-1d@d"
    latest: "@d"
    is_scheduled: "1"
    disabled: "1"
"#,
    );

    let backend = Arc::new(
        InMemoryBackend::new(vec![])
            .with_control(RUN_ID, ControlJob::running())
            .with_polls_until_done(3),
    );
    let control = resolve_control(backend.as_ref(), RUN_ID).await.unwrap();

    let scheduler = BackfillScheduler::with_timezone(
        Arc::new(FileRegistry::new(file.path())),
        backend.clone(),
        control,
        Utc,
    )
    .with_sleeper(Arc::new(RecordingSleeper::new()));

    let mut run = scheduler
        .start(request("^TEST-", "2019-01-01 00:00", "2019-01-03 00:00"))
        .await
        .unwrap();

    let mut results = Vec::new();
    while let Some(result) = run.next().await.unwrap() {
        results.push(result);
    }

    let bounds: Vec<_> = results
        .iter()
        .map(|r| (r.missed_run_time, r.missed_earliest, r.missed_latest))
        .collect();
    assert_eq!(
        bounds,
        [
            (at("2019-01-01 04:00"), at("2018-12-31 00:00"), at("2019-01-01 00:00")),
            (at("2019-01-02 04:00"), at("2019-01-01 00:00"), at("2019-01-02 00:00")),
        ]
    );
    assert!(results.iter().all(|r| r.job_name == "TEST-0001-test search"));
    assert_eq!(backend.submissions().len(), 2);
    assert_eq!(run.stats().jobs_considered, 2);
    assert_eq!(run.stats().jobs_matched, 1);
    assert_eq!(run.stats().outcome, Some(RunOutcome::Completed));
}

#[tokio::test]
async fn stopping_the_control_job_ends_the_run() {
    let backend = Arc::new(
        InMemoryBackend::new(vec![]).with_control(RUN_ID, ControlJob::running()),
    );
    let control = resolve_control(backend.as_ref(), RUN_ID).await.unwrap();
    let scheduler =
        BackfillScheduler::with_timezone(Arc::new(example_registry()), backend.clone(), control, Utc)
            .with_sleeper(Arc::new(RecordingSleeper::new()));

    let mut run = scheduler
        .start(request("Hourly", "2019-01-01 00:00", "2019-01-01 12:00"))
        .await
        .unwrap();

    assert!(run.next().await.unwrap().is_some());
    assert!(run.next().await.unwrap().is_some());

    if let Some(job) = backend.control(RUN_ID) {
        job.set_state("FINALIZING");
    }
    assert!(run.next().await.unwrap().is_none());
    assert_eq!(run.stats().replays_completed, 2);
    assert_eq!(run.stats().outcome, Some(RunOutcome::Stopped));
}

#[tokio::test]
async fn missing_control_job_is_fatal() {
    let backend = InMemoryBackend::new(vec![]);
    let err = resolve_control(&backend, RUN_ID).await.err().unwrap();
    assert!(matches!(err, BackfillError::ControlJobNotFound(_)));
}

// ── Example registry ────────────────────────────────────────────────

#[tokio::test]
async fn example_registry_replays_weekday_report() {
    let scheduler = BackfillScheduler::with_timezone(
        Arc::new(example_registry()),
        Arc::new(DryRunDispatcher::new()),
        Arc::new(FlagSignal::new()),
        Utc,
    )
    .with_sleeper(Arc::new(RecordingSleeper::new()));

    // Fri 2019-01-04 through Mon 2019-01-07: the weekend is not scheduled.
    let mut run = scheduler
        .start(request("Weekday", "2019-01-04 00:00", "2019-01-07 23:00"))
        .await
        .unwrap();

    let mut results = Vec::new();
    while let Some(result) = run.next().await.unwrap() {
        results.push(result);
    }

    let runs: Vec<_> = results.iter().map(|r| r.missed_run_time).collect();
    assert_eq!(runs, [at("2019-01-04 07:30"), at("2019-01-07 07:30")]);
    assert_eq!(results[1].missed_earliest, at("2019-01-06 07:00"));
    assert_eq!(results[1].missed_latest, at("2019-01-07 07:00"));
}

#[tokio::test]
async fn disabled_monthly_export_is_never_replayed() {
    let backend = Arc::new(InMemoryBackend::new(vec![]));
    let scheduler = BackfillScheduler::with_timezone(
        Arc::new(example_registry()),
        backend.clone(),
        Arc::new(FlagSignal::new()),
        Utc,
    )
    .with_sleeper(Arc::new(RecordingSleeper::new()));

    let mut run = scheduler
        .start(request("Monthly", "2019-01-01 00:00", "2019-06-01 00:00"))
        .await
        .unwrap();

    assert!(run.next().await.unwrap().is_none());
    assert!(backend.submissions().is_empty());
}
