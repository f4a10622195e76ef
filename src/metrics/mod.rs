//! Failure and latency accumulation
//!
//! Every stage attempt for one user ends in a [`StageOutcome`]. Failures are
//! written into the process-wide [`ErrorLedger`]; durations and per-stage
//! counters are written into a [`StageTally`] owned exclusively by the stage
//! task that produced them. When a worker finishes, its three tallies are
//! returned as a [`WorkerTally`], and after all workers have joined the
//! orchestrator folds them into one [`RunAggregate`].
//!
//! The only cross-worker mutable structure is the ledger, a single map behind
//! one mutex. Live display counters live in [`progress`].

pub mod progress;

pub use progress::{RunProgress, StageProgress};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::error;

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Stage 1: identity provisioning and namespace readiness
    Identity,
    /// Stage 2: credential, application, gitops repository and component
    Resources,
    /// Stage 3: build observation
    Build,
}

/// Closed set of failure classes, one per failure point of the pipeline.
///
/// The numeric values are stable and appear in logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    /// The identity could not be provisioned
    IdentityProvisioning = 1,
    /// A cohort member's namespace did not become ready in time
    NamespaceReadiness = 2,
    /// The image-pull credential could not be created
    SecretCreation = 3,
    /// The application could not be created
    ApplicationCreation = 4,
    /// The application's gitops repository did not appear in time
    GitopsRepoReadiness = 5,
    /// The component could not be created
    ComponentCreation = 6,
    /// The created component has an unexpected name
    ComponentNameMismatch = 7,
    /// The build run finished in a failed state
    PipelineFailed = 8,
    /// The build run did not finish in time
    PipelineTimeout = 9,
}

impl ErrorCode {
    /// All codes in numeric order.
    pub const ALL: [Self; 9] = [
        Self::IdentityProvisioning,
        Self::NamespaceReadiness,
        Self::SecretCreation,
        Self::ApplicationCreation,
        Self::GitopsRepoReadiness,
        Self::ComponentCreation,
        Self::ComponentNameMismatch,
        Self::PipelineFailed,
        Self::PipelineTimeout,
    ];

    /// Stable numeric value.
    pub const fn number(self) -> u32 {
        self as u32
    }

    /// Look a code up by its numeric value.
    pub fn from_number(number: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.number() == number)
    }

    /// Stage whose failure counter this code increments.
    pub const fn stage(self) -> Stage {
        match self {
            Self::IdentityProvisioning | Self::NamespaceReadiness => Stage::Identity,
            Self::SecretCreation
            | Self::ApplicationCreation
            | Self::GitopsRepoReadiness
            | Self::ComponentCreation
            | Self::ComponentNameMismatch => Stage::Resources,
            Self::PipelineFailed | Self::PipelineTimeout => Stage::Build,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.number())
    }
}

/// A failed stage attempt for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Failure class
    pub code: ErrorCode,
    /// Human readable description
    pub message: String,
}

impl Failure {
    /// Create a failure of class `code`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result of one stage attempt for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage completed for this user
    Success,
    /// The stage failed for this user
    Failure(Failure),
}

impl From<Result<(), Failure>> for StageOutcome {
    fn from(result: Result<(), Failure>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// Count and most recent message for one error class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorOccurrence {
    /// Numeric error class
    #[serde(rename = "errorNumber")]
    pub error_number: u32,
    /// Message of the most recent occurrence
    #[serde(rename = "latestMessage")]
    pub latest_message: String,
    /// Number of occurrences
    pub count: u64,
}

/// Process-wide map from error class to occurrences.
///
/// [`record`](Self::record) is safe to call from any number of stages at
/// once; it is one short critical section behind a single mutex.
/// [`snapshot`](Self::snapshot) is meant to be called after every worker has
/// joined and always returns the occurrences sorted by error number.
#[derive(Debug, Default)]
pub struct ErrorLedger {
    occurrences: Mutex<BTreeMap<ErrorCode, ErrorOccurrence>>,
    fail_fast: bool,
}

impl ErrorLedger {
    /// Create an empty ledger.
    ///
    /// With `fail_fast` set, the first recorded failure terminates the
    /// process with exit status 1 after it has been logged.
    pub fn new(fail_fast: bool) -> Self {
        Self {
            occurrences: Mutex::new(BTreeMap::new()),
            fail_fast,
        }
    }

    /// Record a failure of class `code`.
    pub fn record_error(&self, code: ErrorCode, message: &str) {
        error!("Error {code}: {message}");
        if self.fail_fast {
            error!("Fail-fast enabled, terminating load test");
            std::process::exit(1);
        }

        let mut occurrences = self.occurrences.lock().unwrap_or_else(PoisonError::into_inner);
        occurrences
            .entry(code)
            .and_modify(|occurrence| {
                occurrence.count += 1;
                occurrence.latest_message = message.to_string();
            })
            .or_insert_with(|| ErrorOccurrence {
                error_number: code.number(),
                latest_message: message.to_string(),
                count: 1,
            });
    }

    /// Record a [`Failure`] value.
    pub fn record(&self, failure: &Failure) {
        self.record_error(failure.code, &failure.message);
    }

    /// Occurrences of every class seen so far, ordered by error number.
    pub fn snapshot(&self) -> Vec<ErrorOccurrence> {
        self.occurrences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of occurrences recorded for `code`.
    #[cfg(test)]
    pub fn count(&self, code: ErrorCode) -> u64 {
        self.occurrences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&code)
            .map_or(0, |occurrence| occurrence.count)
    }
}

/// Counters a single stage task accumulates for its own worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTally {
    /// Cumulative duration of successful attempts
    pub duration: Duration,
    /// Failure outcomes recorded by this stage
    pub failures: u64,
    /// Users handed to the next stage
    pub forwarded: u64,
}

impl StageTally {
    /// Record a failed attempt. The failure itself goes to the ledger.
    pub fn fail(&mut self) {
        self.failures += 1;
    }

    /// Add elapsed time of an attempt.
    pub fn add_duration(&mut self, elapsed: Duration) {
        self.duration += elapsed;
    }

    fn merge(&mut self, other: &Self) {
        self.duration += other.duration;
        self.failures += other.failures;
        self.forwarded += other.forwarded;
    }
}

/// Results of one worker pipeline, owned by that worker until it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerTally {
    /// Worker identity
    pub worker: usize,
    /// Stage 1 counters
    pub identity: StageTally,
    /// Stage 2 counters
    pub resources: StageTally,
    /// Stage 3 counters, `None` when builds were not observed
    pub builds: Option<StageTally>,
}

/// Per-stage figures of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageSummary {
    /// Sum of durations across all workers
    pub total_duration: Duration,
    /// `total_duration` divided by the number of attempted users, in seconds
    pub average_secs: f64,
    /// Failure outcomes across all workers
    pub failures: u64,
    /// `failures` as a percentage of attempted users
    pub failure_percentage: f64,
    /// Users handed to the next stage
    pub forwarded: u64,
}

impl StageSummary {
    /// Summarize `tally` over `attempted` users.
    ///
    /// The denominator is the number of attempted users, not the number that
    /// reached this stage, so it stays the same for all three stages.
    pub fn from_tally(tally: &StageTally, attempted: u64) -> Self {
        let denominator = attempted.max(1) as f64;
        Self {
            total_duration: tally.duration,
            average_secs: tally.duration.as_secs_f64() / denominator,
            failures: tally.failures,
            failure_percentage: 100.0 * tally.failures as f64 / denominator,
            forwarded: tally.forwarded,
        }
    }
}

/// Aggregated results of a run, built once after every worker has joined.
#[derive(Debug, Clone, PartialEq)]
pub struct RunAggregate {
    /// Number of workers
    pub threads: usize,
    /// Users per worker
    pub users_per_thread: usize,
    /// Cohort size
    pub batch_size: usize,
    /// Users attempted across the run
    pub total_users: u64,
    /// Stage 1 figures
    pub identity: StageSummary,
    /// Stage 2 figures
    pub resources: StageSummary,
    /// Stage 3 figures, `None` when builds were not observed
    pub builds: Option<StageSummary>,
    /// Occurrences per error class, ordered by error number
    pub errors: Vec<ErrorOccurrence>,
    /// Per-worker tallies, ordered by worker identity
    pub workers: Vec<WorkerTally>,
}

impl RunAggregate {
    /// Fold worker tallies and the ledger snapshot into an aggregate.
    pub fn from_workers(
        threads: usize,
        users_per_thread: usize,
        batch_size: usize,
        mut workers: Vec<WorkerTally>,
        errors: Vec<ErrorOccurrence>,
    ) -> Self {
        workers.sort_by_key(|tally| tally.worker);
        let total_users = (threads * users_per_thread) as u64;

        let mut identity = StageTally::default();
        let mut resources = StageTally::default();
        let mut builds: Option<StageTally> = None;
        for tally in &workers {
            identity.merge(&tally.identity);
            resources.merge(&tally.resources);
            if let Some(build_tally) = &tally.builds {
                builds.get_or_insert_with(StageTally::default).merge(build_tally);
            }
        }

        Self {
            threads,
            users_per_thread,
            batch_size,
            total_users,
            identity: StageSummary::from_tally(&identity, total_users),
            resources: StageSummary::from_tally(&resources, total_users),
            builds: builds.map(|tally| StageSummary::from_tally(&tally, total_users)),
            errors,
            workers,
        }
    }

    /// Total failures across all stages.
    pub fn total_failures(&self) -> u64 {
        self.identity.failures
            + self.resources.failures
            + self.builds.map_or(0, |builds| builds.failures)
    }

    /// Occurrence entry for `code`, if any was recorded.
    pub fn error(&self, code: ErrorCode) -> Option<&ErrorOccurrence> {
        self.errors.iter().find(|occurrence| occurrence.error_number == code.number())
    }
}
