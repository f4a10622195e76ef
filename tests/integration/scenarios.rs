//! Complete runs against the simulated platform with selected failures.

use std::sync::Arc;
use tenant_loadgen::config::BuildBehavior;
use tenant_loadgen::metrics::ErrorCode;
use tenant_loadgen::orchestrator::{Orchestrator, run_load_test};
use tenant_loadgen::test_utils::{ScenarioBuilder, init_test_logging, test_config};

#[tokio::test(start_paused = true)]
async fn test_all_stages_succeed() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new().identity_latency_ms(5).build_duration_ms(20).platform();
    let config = test_config(2, 4, 2).with_wait_for_builds(true);

    let aggregate = run_load_test(config, Arc::clone(&platform)).await.unwrap();

    assert_eq!(aggregate.total_users, 8);
    assert_eq!(aggregate.total_failures(), 0);
    assert!(aggregate.errors.is_empty());
    assert_eq!(aggregate.identity.forwarded, 8);
    assert_eq!(aggregate.resources.forwarded, 8);

    let builds = aggregate.builds.expect("builds were observed");
    assert_eq!(builds.forwarded, 8);
    assert!(aggregate.identity.average_secs > 0.0);
    assert!(aggregate.resources.average_secs > 0.0);
    assert!(builds.average_secs > 0.0);
    assert_eq!(platform.identities().len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_secret_failure_stops_only_that_user() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new().fail_secret("testuser-0003").platform();
    let config = test_config(1, 4, 2).with_wait_for_builds(true);
    let orchestrator = Orchestrator::new(config, Arc::clone(&platform)).unwrap();

    let aggregate = orchestrator.run().await.unwrap();

    assert_eq!(aggregate.identity.failures, 0);
    assert_eq!(aggregate.resources.failures, 1);
    assert_eq!(aggregate.resources.forwarded, 3);
    assert_eq!(aggregate.resources.failure_percentage, 25.0);

    // The failed user never reached the build stage
    let builds = aggregate.builds.unwrap();
    assert_eq!(builds.failures + builds.forwarded, 3);
    assert_eq!(orchestrator.progress().builds.attempted(), 3);

    let occurrence = aggregate.error(ErrorCode::SecretCreation).unwrap();
    assert_eq!(occurrence.count, 1);
    assert!(occurrence.latest_message.contains("testuser-0003-tenant"));
    assert_eq!(aggregate.errors.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_builds_disabled_leaves_build_metrics_unset() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new()
        .fail_component("testuser-0001")
        .build_outcome("testuser-0002", BuildBehavior::Failed)
        .build_outcome("testuser-0003", BuildBehavior::Never)
        .platform();
    let orchestrator = Orchestrator::new(test_config(1, 4, 4), platform).unwrap();

    let aggregate = orchestrator.run().await.unwrap();

    assert!(aggregate.builds.is_none());
    assert_eq!(aggregate.resources.failures, 1);
    assert!(aggregate.error(ErrorCode::PipelineFailed).is_none());
    assert!(aggregate.error(ErrorCode::PipelineTimeout).is_none());
    assert_eq!(orchestrator.progress().builds.attempted(), 0);
    assert!(aggregate.workers.iter().all(|worker| worker.builds.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_build_timeout_recorded_once() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new()
        .build_outcome("testuser-0002", BuildBehavior::Never)
        .platform();
    let config = test_config(1, 2, 2).with_wait_for_builds(true);
    let orchestrator = Orchestrator::new(config, platform).unwrap();

    let aggregate = orchestrator.run().await.unwrap();

    let timeout = aggregate.error(ErrorCode::PipelineTimeout).unwrap();
    assert_eq!(timeout.count, 1);
    assert!(timeout.latest_message.contains("testuser-0002-component"));
    assert!(timeout.latest_message.contains("failed to succeed within"));

    let builds = aggregate.builds.unwrap();
    assert_eq!(builds.failures, 1);
    assert_eq!(builds.forwarded, 1);

    // Only the build that reached a terminal state advanced the progress
    let progress = &orchestrator.progress().builds;
    assert_eq!(progress.attempted(), 1);
    assert_eq!(progress.failed(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_build_reports_reason() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new()
        .build_duration_ms(40)
        .build_outcome("testuser-0001", BuildBehavior::Failed)
        .platform();
    let config = test_config(1, 1, 1).with_wait_for_builds(true);

    let aggregate = run_load_test(config, platform).await.unwrap();

    let failed = aggregate.error(ErrorCode::PipelineFailed).unwrap();
    assert_eq!(failed.count, 1);
    assert!(failed.latest_message.contains("failed due to Failed"));

    // A failed build still contributes its wall time
    let builds = aggregate.builds.unwrap();
    assert_eq!(builds.failures, 1);
    assert!((builds.average_secs - 0.04).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_each_resource_step_has_its_own_code() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new()
        .fail_application("testuser-0001")
        .fail_gitops_repo("testuser-0002")
        .fail_component("testuser-0003")
        .rename_component("testuser-0004")
        .platform();

    let aggregate = run_load_test(test_config(1, 5, 5), platform).await.unwrap();

    for code in [
        ErrorCode::ApplicationCreation,
        ErrorCode::GitopsRepoReadiness,
        ErrorCode::ComponentCreation,
        ErrorCode::ComponentNameMismatch,
    ] {
        assert_eq!(aggregate.error(code).map(|o| o.count), Some(1), "{code}");
    }
    assert_eq!(aggregate.resources.failures, 4);
    assert_eq!(aggregate.resources.forwarded, 1);

    let mismatch = aggregate.error(ErrorCode::ComponentNameMismatch).unwrap();
    assert_eq!(
        mismatch.latest_message,
        "Actual component name (testuser-0004-component-renamed) does not match expected (testuser-0004-component)"
    );
}

#[tokio::test(start_paused = true)]
async fn test_latest_message_wins() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new()
        .fail_identity("testuser-0001")
        .fail_identity("testuser-0002")
        .platform();

    let aggregate = run_load_test(test_config(1, 2, 1), platform).await.unwrap();

    let occurrence = aggregate.error(ErrorCode::IdentityProvisioning).unwrap();
    assert_eq!(occurrence.count, 2);
    assert!(occurrence.latest_message.starts_with("Unable to provision user 'testuser-0002'"));
    assert_eq!(aggregate.identity.failure_percentage, 100.0);
}
