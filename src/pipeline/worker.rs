//! One worker: three stage tasks and their queues.

use super::StageContext;
use super::builds::observe_builds;
use super::identity::provision_identities;
use super::resources::provision_resources;
use crate::core::LoadgenError;
use crate::metrics::WorkerTally;
use crate::naming::UserNames;
use crate::platform::Platform;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, info};

/// The pipeline of a single worker identity.
pub struct WorkerPipeline<P> {
    worker: usize,
    ctx: StageContext<P>,
}

impl<P: Platform + 'static> WorkerPipeline<P> {
    /// Create the pipeline for `worker`.
    pub fn new(worker: usize, ctx: StageContext<P>) -> Self {
        Self { worker, ctx }
    }

    /// Run all stages to completion and return this worker's tallies.
    ///
    /// # Errors
    ///
    /// Returns [`LoadgenError::WorkerFailed`] if a stage task panicked.
    pub async fn run(self) -> Result<WorkerTally, LoadgenError> {
        let Self { worker, ctx } = self;
        let capacity = ctx.config.users_per_thread.max(1);
        let (identity_tx, identity_rx) = mpsc::channel::<UserNames>(capacity);
        let (resources_tx, resources_rx) = mpsc::channel::<UserNames>(capacity);

        debug!("Worker {worker}: starting stages");
        let identity = tokio::spawn(provision_identities(ctx.clone(), worker, identity_tx));
        let resources = tokio::spawn(provision_resources(ctx.clone(), identity_rx, resources_tx));
        let builds = tokio::spawn(async move {
            if ctx.config.wait_for_builds {
                Some(observe_builds(ctx, resources_rx).await)
            } else {
                drain(resources_rx).await;
                None
            }
        });

        let (identity, resources, builds) = tokio::try_join!(identity, resources, builds)
            .map_err(|e| stage_failed(worker, &e))?;

        info!(
            "Worker {worker} finished: {} identities forwarded, {} resource sets forwarded",
            identity.forwarded, resources.forwarded
        );
        Ok(WorkerTally {
            worker,
            identity,
            resources,
            builds,
        })
    }
}

/// Consume a queue without observing its items.
async fn drain(mut queue: mpsc::Receiver<UserNames>) {
    while queue.recv().await.is_some() {}
}

fn stage_failed(worker: usize, error: &JoinError) -> LoadgenError {
    LoadgenError::WorkerFailed {
        worker,
        reason: if error.is_panic() {
            format!("stage task panicked: {error}")
        } else {
            format!("stage task was cancelled: {error}")
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, Scenario};
    use crate::metrics::{ErrorLedger, RunProgress};
    use crate::platform::SimulatedPlatform;
    use std::sync::Arc;

    fn context(config: RunConfig, scenario: Scenario) -> StageContext<SimulatedPlatform> {
        let total = config.total_users() as u64;
        StageContext {
            config: Arc::new(config),
            platform: Arc::new(SimulatedPlatform::new(scenario)),
            ledger: Arc::new(ErrorLedger::new(false)),
            progress: Arc::new(RunProgress::hidden(total)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_all_success() {
        let ctx = context(RunConfig::new(1, 4, 2).with_wait_for_builds(true), Scenario::instant());
        let tally = WorkerPipeline::new(0, ctx.clone()).run().await.unwrap();

        assert_eq!(tally.identity.forwarded, 4);
        assert_eq!(tally.identity.failures, 0);
        assert_eq!(tally.resources.forwarded, 4);
        let builds = tally.builds.unwrap();
        assert_eq!(builds.forwarded, 4);
        assert!(builds.duration > std::time::Duration::ZERO);
        assert_eq!(ctx.progress.builds.attempted(), 4);
        assert!(ctx.ledger.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_without_builds() {
        let ctx = context(RunConfig::new(1, 4, 4), Scenario::instant());
        let tally = WorkerPipeline::new(0, ctx.clone()).run().await.unwrap();

        assert_eq!(tally.resources.forwarded, 4);
        assert!(tally.builds.is_none());
        assert_eq!(ctx.progress.builds.attempted(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_failure_still_closes_cohort() {
        let mut scenario = Scenario::instant();
        scenario.failures.create_identity.insert("testuser-0002".to_string());
        let ctx = context(RunConfig::new(1, 4, 2), scenario);

        let tally = WorkerPipeline::new(0, ctx.clone()).run().await.unwrap();
        assert_eq!(tally.identity.failures, 1);
        assert_eq!(tally.identity.forwarded, 3);
        assert_eq!(tally.resources.forwarded, 3);
    }
}
