//! Stage 2: provision workload resources.

use super::StageContext;
use crate::constants::REGISTRY_AUTH_SECRET_NAME;
use crate::metrics::{ErrorCode, Failure, StageOutcome, StageTally};
use crate::naming::UserNames;
use crate::platform::{ComponentSpec, Platform};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Create resources for every user received on `input`.
///
/// Successful users are forwarded on `output`, which is closed when `input`
/// is closed and drained.
pub async fn provision_resources<P: Platform>(
    ctx: StageContext<P>,
    mut input: mpsc::Receiver<UserNames>,
    output: mpsc::Sender<UserNames>,
) -> StageTally {
    let progress = &ctx.progress.resources;
    let mut tally = StageTally::default();

    while let Some(user) = input.recv().await {
        let start = Instant::now();
        match StageOutcome::from(provision_user(&ctx, &user).await) {
            StageOutcome::Success => {
                tally.add_duration(start.elapsed());
                progress.record(false);
                if output.send(user).await.is_err() {
                    warn!("Build stage stopped accepting users");
                    break;
                }
                tally.forwarded += 1;
            }
            StageOutcome::Failure(failure) => ctx.fail(&mut tally, progress, &failure),
        }
    }

    tally
}

/// Credential, application, gitops repository, component, name check.
///
/// The first failing step ends the traversal for this user.
async fn provision_user<P: Platform>(ctx: &StageContext<P>, user: &UserNames) -> Result<(), Failure> {
    let config = &ctx.config;
    let platform = ctx.platform.as_ref();

    platform
        .create_registry_credential(REGISTRY_AUTH_SECRET_NAME, &user.namespace, &config.registry_payload)
        .await
        .map_err(|e| {
            Failure::new(
                ErrorCode::SecretCreation,
                format!(
                    "Unable to create the secret {REGISTRY_AUTH_SECRET_NAME} in namespace {}: {e}",
                    user.namespace
                ),
            )
        })?;

    let application = platform
        .create_application(&user.application, &user.namespace)
        .await
        .map_err(|e| {
            Failure::new(
                ErrorCode::ApplicationCreation,
                format!("Unable to create the Application {}: {e}", user.application),
            )
        })?;

    platform
        .wait_for_gitops_repo(&application, config.timeouts.gitops_repo)
        .await
        .map_err(|e| {
            Failure::new(
                ErrorCode::GitopsRepoReadiness,
                format!(
                    "Unable to create application {} gitops repo within {:?}: {e}",
                    user.application, config.timeouts.gitops_repo.timeout
                ),
            )
        })?;

    let spec = ComponentSpec {
        application: application.name.clone(),
        name: user.component.clone(),
        namespace: user.namespace.clone(),
        source_url: config.component_source.clone(),
        image: user.component_image(&config.quay_organization),
    };
    let component = platform.create_component(&spec).await.map_err(|e| {
        Failure::new(
            ErrorCode::ComponentCreation,
            format!("Unable to create the Component {}: {e}", user.component),
        )
    })?;

    if component.name != user.component {
        return Err(Failure::new(
            ErrorCode::ComponentNameMismatch,
            format!(
                "Actual component name ({}) does not match expected ({})",
                component.name, user.component
            ),
        ));
    }

    debug!("Resources for {} created", user.username);
    Ok(())
}
