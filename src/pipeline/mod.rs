//! Per-worker three-stage pipeline
//!
//! Each worker runs three concurrent stage tasks connected by two bounded
//! queues whose capacity is the number of users per worker:
//!
//! ```text
//! provision_identities --(queue)--> provision_resources --(queue)--> observe_builds
//! ```
//!
//! - [`identity`] creates identities and releases them downstream in
//!   cohorts through a [`BatchGate`] once every cohort member's namespace is
//!   ready.
//! - [`resources`] creates the credential, application and component of each
//!   released user.
//! - [`builds`] observes the build run triggered by each component. When
//!   build observation is disabled the second queue is drained instead.
//!
//! A stage closes its output queue by dropping the sender once its input is
//! exhausted, which is the only shutdown signal the next stage needs. User
//! failures never stop a stage: they are recorded and the stage moves on.

pub mod batch;
pub mod builds;
pub mod identity;
pub mod resources;
pub mod worker;

pub use batch::{BatchGate, Cohort, CohortVerdict};
pub use worker::WorkerPipeline;

use crate::config::RunConfig;
use crate::metrics::{ErrorLedger, Failure, RunProgress, StageProgress, StageTally};
use std::sync::Arc;

/// Shared state handed to every stage task of every worker.
pub struct StageContext<P> {
    /// Validated run parameters
    pub config: Arc<RunConfig>,
    /// Platform under test
    pub platform: Arc<P>,
    /// Process-wide failure ledger
    pub ledger: Arc<ErrorLedger>,
    /// Live progress counters
    pub progress: Arc<RunProgress>,
}

impl<P> Clone for StageContext<P> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            platform: Arc::clone(&self.platform),
            ledger: Arc::clone(&self.ledger),
            progress: Arc::clone(&self.progress),
        }
    }
}

impl<P> StageContext<P> {
    /// Record one failed user: ledger, stage tally and progress counter.
    pub(crate) fn fail(&self, tally: &mut StageTally, progress: &StageProgress, failure: &Failure) {
        self.record_failure(tally, failure);
        progress.record(true);
    }

    /// Record a failure that did not reach a terminal state.
    ///
    /// The progress counter only advances for users whose stage finished.
    pub(crate) fn record_failure(&self, tally: &mut StageTally, failure: &Failure) {
        self.ledger.record(failure);
        tally.fail();
    }
}
