use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.as_str(), "true" | "1"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub backfill: BackfillConfig,
    pub registry: RegistryConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RERUN_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RERUN_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            backfill: BackfillConfig::from_env_profiled(p),
            registry: RegistryConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  backfill:  settle={}ms, poll={}ms, trigger_actions={}, skip_invalid_jobs={}",
            self.backfill.settle_delay_ms,
            self.backfill.poll_interval_ms,
            self.backfill.trigger_actions,
            self.backfill.skip_invalid_jobs,
        );
        tracing::info!("  registry:  jobs_file={}", self.registry.jobs_file.display());
    }
}

// ── Backfill loop ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Delay between submitting a replay and its first completion poll.
    pub settle_delay_ms: u64,
    /// Fixed delay between subsequent completion polls.
    pub poll_interval_ms: u64,
    /// Default for "trigger the job's actions on replay".
    pub trigger_actions: bool,
    /// Skip a job whose time patterns fail to evaluate instead of aborting the run.
    pub skip_invalid_jobs: bool,
}

impl BackfillConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            settle_delay_ms: profiled_env_u64(p, "RERUN_SETTLE_MS", 250),
            poll_interval_ms: profiled_env_u64(p, "RERUN_POLL_INTERVAL_MS", 1000),
            trigger_actions: profiled_env_bool(p, "RERUN_TRIGGER_ACTIONS", false),
            skip_invalid_jobs: profiled_env_bool(p, "RERUN_SKIP_INVALID_JOBS", true),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 250,
            poll_interval_ms: 1000,
            trigger_actions: false,
            skip_invalid_jobs: true,
        }
    }
}

// ── Job registry ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub jobs_file: PathBuf,
}

impl RegistryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            jobs_file: PathBuf::from(profiled_env_or(p, "RERUN_JOBS_FILE", "config/jobs.yml")),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-based tests must run serially to avoid interfering with each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: &[&str] = &[
        "RERUN_SETTLE_MS",
        "RERUN_POLL_INTERVAL_MS",
        "RERUN_TRIGGER_ACTIONS",
        "RERUN_SKIP_INVALID_JOBS",
        "RERUN_JOBS_FILE",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
            env::remove_var(format!("TEST_{}", key));
        }
    }

    #[test]
    fn defaults_when_env_empty() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let cfg = Config::for_profile("");
        assert_eq!(cfg.backfill, BackfillConfig::default());
        assert_eq!(cfg.backfill.settle_delay(), Duration::from_millis(250));
        assert_eq!(cfg.backfill.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.registry.jobs_file, PathBuf::from("config/jobs.yml"));
        assert_eq!(cfg.profile_label(), "default");
    }

    #[test]
    fn profiled_key_wins_over_plain_key() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("RERUN_POLL_INTERVAL_MS", "2000");
        env::set_var("TEST_RERUN_POLL_INTERVAL_MS", "500");
        env::set_var("RERUN_TRIGGER_ACTIONS", "1");

        let cfg = Config::for_profile("test");
        assert_eq!(cfg.profile, "TEST");
        assert_eq!(cfg.backfill.poll_interval_ms, 500);
        assert!(cfg.backfill.trigger_actions);

        clear_env();
    }

    #[test]
    fn invalid_number_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("RERUN_SETTLE_MS", "soon");
        env::set_var("RERUN_SKIP_INVALID_JOBS", "false");

        let cfg = Config::for_profile("");
        assert_eq!(cfg.backfill.settle_delay_ms, 250);
        assert!(!cfg.backfill.skip_invalid_jobs);

        clear_env();
    }
}
