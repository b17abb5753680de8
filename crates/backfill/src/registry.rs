//! YAML job registry.
//!
//! ```yaml
//! jobs:
//!   - name: "Nightly Rollup"
//!     cron_schedule: "0 4 * * *"
//!     earliest: "-1d@d"
//!     latest: "@d"
//!     is_scheduled: "1"
//!     disabled: "0"
//! ```
//!
//! Flags are the registry's string-encoded booleans and must be quoted.
//! Records that fail to decode or convert are logged and skipped; the rest
//! keep their file order.

use std::path::PathBuf;

use async_trait::async_trait;
use rerun_core::{JobDefinition, JobRecord};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::JobRegistry;
use crate::error::BackendError;

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    jobs: Vec<serde_yaml::Value>,
}

/// Parse a registry document into job definitions.
pub fn parse_registry(yaml: &str) -> Result<Vec<JobDefinition>, BackendError> {
    let file: RegistryFile =
        serde_yaml::from_str(yaml).map_err(|e| BackendError::Registry(e.to_string()))?;

    let mut jobs = Vec::with_capacity(file.jobs.len());
    for (index, value) in file.jobs.into_iter().enumerate() {
        let record: JobRecord = match serde_yaml::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(index, error = %e, "skipping malformed job record");
                continue;
            }
        };
        let name = record.name.clone();
        match JobDefinition::try_from(record) {
            Ok(job) => jobs.push(job),
            Err(e) => warn!(job = %name, error = %e, "skipping job with invalid flags"),
        }
    }
    Ok(jobs)
}

/// Reads job definitions from a YAML file on every call.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl JobRegistry for FileRegistry {
    async fn job_definitions(&self) -> Result<Vec<JobDefinition>, BackendError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            BackendError::Connection(format!("{}: {}", self.path.display(), e))
        })?;
        let jobs = parse_registry(&contents)?;
        debug!(path = %self.path.display(), count = jobs.len(), "loaded job registry");
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REGISTRY: &str = r#"
jobs:
  - name: "TEST-0001-test search"
    cron_schedule: "0 4 * * *"
    earliest: "-1d@d"
    latest: "@d"
    is_scheduled: "1"
    disabled: "0"
  - name: "bad flag"
    cron_schedule: "0 4 * * *"
    earliest: "-1d@d"
    latest: "@d"
    is_scheduled: "yes"
    disabled: "0"
  - name: "missing fields"
    cron_schedule: "0 4 * * *"
  - name: "Hourly Rollup"
    cron: "0 * * * *"
    dispatch.earliest_time: "-1h@h"
    dispatch.latest_time: "@h"
    is_scheduled: "1"
    disabled: "1"
"#;

    #[test]
    fn invalid_records_are_skipped_in_order() {
        let jobs = parse_registry(REGISTRY).unwrap();
        let names: Vec<_> = jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, ["TEST-0001-test search", "Hourly Rollup"]);
        assert!(jobs[0].is_replayable());
        assert!(!jobs[1].is_replayable());
        assert_eq!(jobs[1].earliest_pattern, "-1h@h");
    }

    #[test]
    fn empty_document_has_no_jobs() {
        assert!(parse_registry("jobs: []").unwrap().is_empty());
        assert!(parse_registry("{}").unwrap().is_empty());
    }

    #[test]
    fn broken_yaml_is_a_registry_error() {
        assert!(matches!(
            parse_registry("jobs: [unclosed"),
            Err(BackendError::Registry(_))
        ));
    }

    #[tokio::test]
    async fn file_registry_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REGISTRY.as_bytes()).unwrap();

        let registry = FileRegistry::new(file.path());
        let jobs = registry.job_definitions().await.unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_a_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileRegistry::new(dir.path().join("absent.yml"));
        assert!(matches!(
            registry.job_definitions().await,
            Err(BackendError::Connection(_))
        ));
    }
}
