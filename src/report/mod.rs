//! Run report
//!
//! After every worker has joined, the [`RunAggregate`] is logged as a short
//! summary and written to disk as a pretty-printed JSON document. Field names
//! are camelCase and stable, so dashboards reading earlier reports keep
//! working:
//!
//! ```json
//! {
//!   "timestamp": "2024-05-02T10:00:00+00:00",
//!   "threads": 2,
//!   "usersPerThread": 4,
//!   "createUserTimeAvg": 0.42,
//!   "errors": [{ "errorNumber": 3, "latestMessage": "...", "count": 1 }]
//! }
//! ```

use crate::core::LoadgenError;
use crate::metrics::{ErrorOccurrence, RunAggregate, StageSummary};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Completion status written when every worker joined.
pub const STATUS_COMPLETED: &str = "Completed";

/// JSON document describing one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestReport {
    /// Start of the run, RFC 3339
    pub timestamp: String,
    /// End of the run, RFC 3339
    pub end_timestamp: String,
    /// Host the run was executed on
    pub machine_name: String,
    /// Build information of this binary
    pub binary_details: String,
    /// Number of workers
    pub threads: usize,
    /// Users per worker
    pub users_per_thread: usize,
    /// Cohort size
    #[serde(rename = "threadBatchSize")]
    pub batch_size: usize,
    /// Users attempted
    pub total_users: u64,
    /// Completion status
    pub status: String,
    /// Average identity creation time in seconds
    pub create_user_time_avg: f64,
    /// Average resource creation time in seconds
    pub create_resources_time_avg: f64,
    /// Average build wall time in seconds
    pub run_pipeline_time_avg: f64,
    /// Stage 1 failures
    pub create_user_failures: u64,
    /// Stage 1 failure percentage
    pub create_user_failure_rate: f64,
    /// Stage 2 failures
    pub create_resources_failures: u64,
    /// Stage 2 failure percentage
    pub create_resources_failure_rate: f64,
    /// Stage 3 failures
    pub run_pipeline_failures: u64,
    /// Stage 3 failure percentage
    pub run_pipeline_failure_rate: f64,
    /// Occurrences per error class, ordered by error number
    pub errors: Vec<ErrorOccurrence>,
}

impl LoadTestReport {
    /// Build the report for `aggregate`, run between `started` and `finished`.
    ///
    /// A run without build observation reports zeros for the build figures.
    pub fn new(aggregate: &RunAggregate, started: DateTime<Utc>, finished: DateTime<Utc>) -> Self {
        let builds = aggregate.builds.unwrap_or_default();
        Self {
            timestamp: started.to_rfc3339_opts(SecondsFormat::Secs, false),
            end_timestamp: finished.to_rfc3339_opts(SecondsFormat::Secs, false),
            machine_name: machine_name(),
            binary_details: binary_details(),
            threads: aggregate.threads,
            users_per_thread: aggregate.users_per_thread,
            batch_size: aggregate.batch_size,
            total_users: aggregate.total_users,
            status: STATUS_COMPLETED.to_string(),
            create_user_time_avg: aggregate.identity.average_secs,
            create_resources_time_avg: aggregate.resources.average_secs,
            run_pipeline_time_avg: builds.average_secs,
            create_user_failures: aggregate.identity.failures,
            create_user_failure_rate: aggregate.identity.failure_percentage,
            create_resources_failures: aggregate.resources.failures,
            create_resources_failure_rate: aggregate.resources.failure_percentage,
            run_pipeline_failures: builds.failures,
            run_pipeline_failure_rate: builds.failure_percentage,
            errors: aggregate.errors.clone(),
        }
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LoadgenError::ReportWriteError`] if serialization or the
    /// write fails.
    pub async fn write(&self, path: &Path) -> Result<(), LoadgenError> {
        let write_error = |reason: String| LoadgenError::ReportWriteError {
            path: path.display().to_string(),
            reason,
        };
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| write_error(format!("error marshalling JSON: {e}")))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| write_error(format!("error writing JSON file: {e}")))?;
        info!("Report written to {}", path.display());
        Ok(())
    }
}

/// Log the result lines of a finished run.
pub fn log_summary(aggregate: &RunAggregate) {
    let builds = aggregate.builds.unwrap_or_default();
    info!("Load Test Completed!");
    info!("Average Time taken to spin up users: {:.2} s", aggregate.identity.average_secs);
    info!("Average Time taken to Create Resources: {:.2} s", aggregate.resources.average_secs);
    info!("Average Time taken to Run Pipelines: {:.2} s", builds.average_secs);
    log_failures("user creation", &aggregate.identity);
    log_failures("resource creation", &aggregate.resources);
    log_failures("pipeline run", &builds);
    for occurrence in &aggregate.errors {
        info!("Number of error #{} occurred: {}", occurrence.error_number, occurrence.count);
    }
}

fn log_failures(what: &str, summary: &StageSummary) {
    info!(
        "Number of times {what} failed: {} ({:.2} %)",
        summary.failures, summary.failure_percentage
    );
}

/// Host name from `HOSTNAME`, falling back to `/etc/hostname`.
fn machine_name() -> String {
    if let Some(name) = std::env::var("HOSTNAME").ok().filter(|name| !name.trim().is_empty()) {
        return name.trim().to_string();
    }
    match std::fs::read_to_string("/etc/hostname") {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        Ok(_) => "unknown".to_string(),
        Err(e) => {
            warn!("error getting hostname: {e}");
            "unknown".to_string()
        }
    }
}

fn binary_details() -> String {
    format!(
        "Built with {} {} for {}/{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
