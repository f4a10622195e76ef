//! Stage 1: provision identities.

use super::StageContext;
use super::batch::{BatchGate, CohortVerdict};
use crate::metrics::{ErrorCode, Failure, StageTally};
use crate::naming::UserNames;
use crate::platform::Platform;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Create the identities of `worker`'s users and release ready cohorts.
///
/// Ordinals are processed in order. A created identity counts its creation
/// time immediately; it is forwarded only once its cohort is released. The
/// output queue is closed when this function returns.
pub async fn provision_identities<P: Platform>(
    ctx: StageContext<P>,
    worker: usize,
    output: mpsc::Sender<UserNames>,
) -> StageTally {
    let config = &ctx.config;
    let progress = &ctx.progress.identities;
    let mut tally = StageTally::default();
    let mut gate = BatchGate::new(config.batch_size);

    for ordinal in 1..=config.users_per_thread {
        let names =
            UserNames::derive(&config.username_prefix, worker, config.users_per_thread, ordinal);

        let start = Instant::now();
        let member = match ctx.platform.create_identity(&names.username).await {
            Ok(()) => {
                tally.add_duration(start.elapsed());
                debug!("Worker {worker}: identity {} created", names.username);
                Some(names)
            }
            Err(e) => {
                let failure = Failure::new(
                    ErrorCode::IdentityProvisioning,
                    format!("Unable to provision user '{}': {e}", names.username),
                );
                ctx.fail(&mut tally, progress, &failure);
                None
            }
        };

        let Some(cohort) = gate.admit(member) else {
            continue;
        };
        match cohort.checkpoint(ctx.platform.as_ref(), config.timeouts.namespace).await {
            CohortVerdict::Released(members) => {
                for member in members {
                    if output.send(member).await.is_err() {
                        warn!("Worker {worker}: resource stage stopped accepting users");
                        return tally;
                    }
                    tally.forwarded += 1;
                    progress.record(false);
                }
            }
            CohortVerdict::Abandoned(failures) => {
                for failure in &failures {
                    ctx.fail(&mut tally, progress, failure);
                }
            }
        }
    }

    tally
}
