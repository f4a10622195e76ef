//! Stage 3: observe build runs.

use super::StageContext;
use crate::core::LoadgenError;
use crate::metrics::{ErrorCode, Failure, StageTally};
use crate::naming::UserNames;
use crate::platform::{BuildRun, Platform};
use crate::poll::{PollError, WaitPolicy, poll_for};
use tokio::sync::mpsc;
use tracing::debug;

/// Wait for the build run of every user received on `input`.
///
/// The recorded duration is the run's own wall time, completion minus
/// creation, not the time spent polling. `forwarded` counts succeeded builds.
/// Runs that time out are tallied and recorded but leave the progress
/// counter untouched.
pub async fn observe_builds<P: Platform>(
    ctx: StageContext<P>,
    mut input: mpsc::Receiver<UserNames>,
) -> StageTally {
    let progress = &ctx.progress.builds;
    let wait = ctx.config.timeouts.build;
    let mut tally = StageTally::default();

    while let Some(user) = input.recv().await {
        let run = match wait_for_build(ctx.platform.as_ref(), &user, wait).await {
            Ok(run) => run,
            Err(e) => {
                let failure = Failure::new(
                    ErrorCode::PipelineTimeout,
                    format!(
                        "Pipeline run for {}/{} failed to succeed within {:?}: {e}",
                        user.application, user.component, wait.timeout
                    ),
                );
                ctx.record_failure(&mut tally, &failure);
                continue;
            }
        };

        tally.add_duration(run.wall_time());
        if run.is_failed() {
            let (reason, message) = run
                .succeeded
                .as_ref()
                .map(|condition| (condition.reason.as_str(), condition.message.as_str()))
                .unwrap_or_default();
            let failure = Failure::new(
                ErrorCode::PipelineFailed,
                format!(
                    "Pipeline run for {}/{} failed due to {reason}: {message}",
                    user.application, user.component
                ),
            );
            ctx.fail(&mut tally, progress, &failure);
        } else {
            debug!("Build {} for {} succeeded in {:?}", run.name, user.username, run.wall_time());
            tally.forwarded += 1;
            progress.record(false);
        }
    }

    tally
}

async fn wait_for_build<P: Platform>(
    platform: &P,
    user: &UserNames,
    wait: WaitPolicy,
) -> Result<BuildRun, PollError> {
    poll_for(wait.interval, wait.timeout, || async move {
        let run = platform
            .get_build_run(&user.component, &user.application, &user.namespace)
            .await?;
        Ok::<_, LoadgenError>(run.is_done().then_some(run))
    })
    .await
}
