use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Parse a registry flag encoded as `"1"` / `"0"`.
///
/// Surrounding whitespace is ignored; anything else is rejected rather than
/// guessed at, so a typo in the registry never enables a job by accident.
pub fn parse_flag(field: &'static str, value: &str) -> Result<bool, CoreError> {
    match value.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(CoreError::InvalidFlag {
            field,
            value: other.to_string(),
        }),
    }
}

/// A job definition exactly as the registry hands it over.
///
/// Flags stay string-encoded here; convert with
/// [`JobDefinition::try_from`] before handing the job to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub name: String,
    #[serde(alias = "cron")]
    pub cron_schedule: String,
    #[serde(alias = "dispatch.earliest_time")]
    pub earliest: String,
    #[serde(alias = "dispatch.latest_time")]
    pub latest: String,
    pub is_scheduled: String,
    pub disabled: String,
}

/// A scheduled job that may be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    /// Five-field cron schedule (`min hour day-of-month month day-of-week`).
    pub cron_schedule: String,
    /// Relative-time expression for the replay's earliest bound.
    pub earliest_pattern: String,
    /// Relative-time expression for the replay's latest bound.
    pub latest_pattern: String,
    pub is_scheduled: bool,
    pub is_disabled: bool,
}

impl JobDefinition {
    /// Whether the job runs on a schedule at all: scheduled and not disabled.
    pub fn is_replayable(&self) -> bool {
        self.is_scheduled && !self.is_disabled
    }
}

impl TryFrom<JobRecord> for JobDefinition {
    type Error = CoreError;

    fn try_from(record: JobRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            is_scheduled: parse_flag("is_scheduled", &record.is_scheduled)?,
            is_disabled: parse_flag("disabled", &record.disabled)?,
            name: record.name,
            cron_schedule: record.cron_schedule,
            earliest_pattern: record.earliest,
            latest_pattern: record.latest,
        })
    }
}
