//! Run orchestration
//!
//! The [`Orchestrator`] validates the run configuration, spawns one
//! [`WorkerPipeline`] per worker identity, waits for every worker to finish
//! and folds their tallies and the ledger snapshot into a [`RunAggregate`].
//!
//! Workers share nothing but the read-only configuration, the platform, the
//! error ledger and the progress counters. Each worker returns its own
//! [`WorkerTally`](crate::metrics::WorkerTally) through its join handle, so
//! per-worker figures are never written by more than one task.
//!
//! There is no partial result: `run` returns only after every worker has
//! joined. In fail-fast mode the first recorded failure ends the process
//! instead (see [`ErrorLedger::new`]).

use crate::config::RunConfig;
use crate::core::LoadgenError;
use crate::metrics::{ErrorLedger, ErrorOccurrence, RunAggregate, RunProgress};
use crate::pipeline::{StageContext, WorkerPipeline};
use crate::platform::Platform;
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

/// Drives a complete load-test run against one platform.
pub struct Orchestrator<P> {
    config: Arc<RunConfig>,
    platform: Arc<P>,
    ledger: Arc<ErrorLedger>,
    progress: Arc<RunProgress>,
}

impl<P: Platform + 'static> Orchestrator<P> {
    /// Validate `config` and prepare a run.
    ///
    /// # Errors
    ///
    /// Returns the validation error; no worker has been started at that point.
    pub fn new(config: RunConfig, platform: Arc<P>) -> Result<Self, LoadgenError> {
        config.validate()?;
        let total = config.total_users() as u64;
        Ok(Self {
            ledger: Arc::new(ErrorLedger::new(config.fail_fast)),
            progress: Arc::new(RunProgress::hidden(total)),
            config: Arc::new(config),
            platform,
        })
    }

    /// Replace the (hidden) progress counters, e.g. with drawn bars.
    #[must_use]
    pub fn with_progress(mut self, progress: RunProgress) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    /// Live progress counters.
    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Error classes recorded so far, ordered by error number.
    pub fn snapshot(&self) -> Vec<ErrorOccurrence> {
        self.ledger.snapshot()
    }

    /// Run every worker to completion.
    ///
    /// # Errors
    ///
    /// Returns [`LoadgenError::WorkerFailed`] if a worker or one of its stage
    /// tasks panicked. User failures are not errors; they are in the
    /// aggregate.
    pub async fn run(&self) -> Result<RunAggregate, LoadgenError> {
        let config = &self.config;
        info!(
            "Starting load test: {} threads x {} users, batch size {}, waiting for builds: {}",
            config.threads, config.users_per_thread, config.batch_size, config.wait_for_builds
        );
        let started = Instant::now();

        let ctx = StageContext {
            config: Arc::clone(&self.config),
            platform: Arc::clone(&self.platform),
            ledger: Arc::clone(&self.ledger),
            progress: Arc::clone(&self.progress),
        };
        let handles: Vec<_> = (0..config.threads)
            .map(|worker| tokio::spawn(WorkerPipeline::new(worker, ctx.clone()).run()))
            .collect();

        let mut workers = Vec::with_capacity(handles.len());
        for (worker, joined) in join_all(handles).await.into_iter().enumerate() {
            let tally = joined.map_err(|e| LoadgenError::WorkerFailed {
                worker,
                reason: e.to_string(),
            })??;
            workers.push(tally);
        }
        self.progress.finish();
        info!("All {} workers finished in {:?}", config.threads, started.elapsed());

        Ok(RunAggregate::from_workers(
            config.threads,
            config.users_per_thread,
            config.batch_size,
            workers,
            self.ledger.snapshot(),
        ))
    }
}

/// Validate `config`, run it against `platform` and return the aggregate.
///
/// # Errors
///
/// See [`Orchestrator::new`] and [`Orchestrator::run`].
pub async fn run_load_test<P: Platform + 'static>(
    config: RunConfig,
    platform: Arc<P>,
) -> Result<RunAggregate, LoadgenError> {
    Orchestrator::new(config, platform)?.run().await
}
