//! rerun: replay scheduled jobs missed during an outage.
//!
//! Loads job definitions from the YAML registry, walks every matching job's
//! cron schedule across the outage window and dispatches one replay per
//! missed run through the dry-run dispatcher. Each completed replay is
//! printed to stdout as one JSON line; logs go to stderr.
//!
//! Ctrl-C flips the control signal. The replay in flight is left to finish
//! and nothing further is dispatched.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use clap::Parser;
use regex::Regex;
use tracing::{info, warn};

use rerun_backfill::dry_run::DryRunDispatcher;
use rerun_backfill::registry::FileRegistry;
use rerun_backfill::{BackfillRequest, BackfillScheduler, FlagSignal};
use rerun_core::config::{self, Config};
use rerun_core::{BackfillConfig, EpochSeconds, OutageWindow};
use rerun_reltime::RelativeTimeEvaluator;

// ── CLI ─────────────────────────────────────────────────────────────

/// Replay scheduled jobs that were missed during an outage.
#[derive(Parser, Debug)]
#[command(name = "rerun", version, about)]
struct Cli {
    /// Regular expression selecting jobs by name (matches anywhere).
    #[arg(long)]
    regex: String,

    /// Outage start: epoch seconds, `YYYY-MM-DD HH:MM[:SS]`, or a relative
    /// time expression such as `-2d@d`.
    #[arg(long)]
    start: String,

    /// Outage end, in the same forms as `--start`.
    #[arg(long, default_value = "now")]
    end: String,

    /// Trigger each job's actions on replay. Also enabled by
    /// `RERUN_TRIGGER_ACTIONS`.
    #[arg(long)]
    trigger: bool,

    /// Job registry file. Overrides `RERUN_JOBS_FILE`.
    #[arg(long)]
    jobs: Option<PathBuf>,

    /// Abort the whole run on the first job with an invalid schedule or
    /// time pattern instead of skipping it.
    #[arg(long)]
    strict: bool,

    /// Compute schedules and snap boundaries in UTC instead of local time.
    #[arg(long)]
    utc: bool,
}

// ── Time arguments ──────────────────────────────────────────────────

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Resolve a `--start`/`--end` argument against `now` in `tz`.
fn resolve_instant<Tz: TimeZone>(
    evaluator: &RelativeTimeEvaluator<Tz>,
    arg: &str,
    now: EpochSeconds,
) -> anyhow::Result<EpochSeconds> {
    let arg = arg.trim();
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(arg, format) {
            return evaluator
                .timezone()
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.timestamp())
                .with_context(|| format!("{arg} does not exist in the selected timezone"));
        }
    }
    evaluator
        .evaluate(arg, now)
        .with_context(|| format!("invalid time argument {arg:?}"))
}

// ── Run ─────────────────────────────────────────────────────────────

async fn execute<Tz: TimeZone>(
    cli: &Cli,
    config: &Config,
    backfill: BackfillConfig,
    tz: Tz,
) -> anyhow::Result<()> {
    let evaluator = RelativeTimeEvaluator::new(tz.clone());
    let now = Utc::now().timestamp();
    let start = resolve_instant(&evaluator, &cli.start, now)?;
    let end = resolve_instant(&evaluator, &cli.end, now)?;
    let window = OutageWindow::new(start, end)?;

    let filter = Regex::new(&cli.regex).with_context(|| format!("invalid --regex {:?}", cli.regex))?;
    let trigger_actions = cli.trigger || backfill.trigger_actions;

    let jobs_file = cli.jobs.clone().unwrap_or_else(|| config.registry.jobs_file.clone());
    let registry = Arc::new(FileRegistry::new(jobs_file));
    let dispatcher = Arc::new(DryRunDispatcher::new());
    let control = Arc::new(FlagSignal::new());

    let ctrl_c = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current replay");
            ctrl_c.cancel();
        }
    });

    let scheduler = BackfillScheduler::with_timezone(registry, dispatcher, control, tz)
        .with_config(backfill);
    let mut run = scheduler
        .start(BackfillRequest::new(filter, window).with_trigger_actions(trigger_actions))
        .await?;

    while let Some(result) = run.next().await? {
        println!("{}", serde_json::to_string(&result)?);
    }

    let stats = run.stats();
    info!(
        jobs_considered = stats.jobs_considered,
        jobs_matched = stats.jobs_matched,
        jobs_skipped = stats.jobs_skipped,
        replays_completed = stats.replays_completed,
        outcome = ?stats.outcome,
        "backfill finished"
    );
    Ok(())
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    config::load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let mut backfill = config.backfill.clone();
    if cli.strict {
        backfill.skip_invalid_jobs = false;
    }
    if backfill.poll_interval_ms == 0 {
        bail!("RERUN_POLL_INTERVAL_MS must be greater than zero");
    }

    if cli.utc {
        execute(&cli, &config, backfill, Utc).await
    } else {
        execute(&cli, &config, backfill, Local).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_arguments_accept_all_forms() {
        let utc = RelativeTimeEvaluator::new(Utc);
        let now = 1_548_821_829; // 2019-01-30 04:17:09Z

        assert_eq!(resolve_instant(&utc, "2019-01-02 04:00", now).unwrap(), 1_546_401_600);
        assert_eq!(resolve_instant(&utc, "2019-01-02T04:00:30", now).unwrap(), 1_546_401_630);
        assert_eq!(resolve_instant(&utc, "1546300800", now).unwrap(), 1_546_300_800);
        assert_eq!(resolve_instant(&utc, "now", now).unwrap(), now);
        assert_eq!(resolve_instant(&utc, "-1d@d", now).unwrap(), 1_548_720_000);
        assert!(resolve_instant(&utc, "yesterday", now).is_err());
    }
}
