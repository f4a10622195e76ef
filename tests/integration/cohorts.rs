//! Cohort gating of identity provisioning.

use std::sync::Arc;
use tenant_loadgen::config::RunConfig;
use tenant_loadgen::core::LoadgenError;
use tenant_loadgen::metrics::ErrorCode;
use tenant_loadgen::orchestrator::run_load_test;
use tenant_loadgen::test_utils::{ScenarioBuilder, init_test_logging, test_config};

fn tenants(indices: &[usize]) -> Vec<String> {
    indices.iter().map(|index| format!("testuser-{index:04}-tenant")).collect()
}

#[tokio::test(start_paused = true)]
async fn test_cohort_is_forwarded_all_or_nothing() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new().fail_namespace("testuser-0002").platform();

    let aggregate = run_load_test(test_config(1, 4, 2), Arc::clone(&platform)).await.unwrap();

    // testuser-0001 was ready, but its cohort mate was not
    assert_eq!(platform.secret_namespaces(), tenants(&[3, 4]));
    assert_eq!(aggregate.identity.failures, 2);
    assert_eq!(aggregate.identity.forwarded, 2);
    assert_eq!(aggregate.error(ErrorCode::NamespaceReadiness).unwrap().count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_released_cohort_provisions_while_identities_continue() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new().identity_latency_ms(1000).platform();
    let run = tokio::spawn(run_load_test(test_config(1, 4, 2), Arc::clone(&platform)));

    // The first cohort closes at 2s; the third identity is not created before 3s
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    assert_eq!(platform.identities(), ["testuser-0001", "testuser-0002"]);
    assert_eq!(platform.secret_namespaces(), tenants(&[1, 2]));

    let aggregate = run.await.unwrap().unwrap();
    assert_eq!(aggregate.resources.forwarded, 4);
    assert_eq!(platform.secret_namespaces(), tenants(&[1, 2, 3, 4]));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_cohort_does_not_affect_other_workers() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new().fail_namespace("testuser-0007").platform();

    let aggregate = run_load_test(test_config(2, 4, 2), Arc::clone(&platform)).await.unwrap();

    assert_eq!(platform.secret_namespaces(), tenants(&[1, 2, 3, 4, 5, 6]));
    let worker_one = &aggregate.workers[1];
    assert_eq!(worker_one.identity.failures, 2);
    assert_eq!(worker_one.identity.forwarded, 2);
    assert_eq!(aggregate.workers[0].identity.failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_identity_does_not_block_its_cohort() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new().fail_identity("testuser-0001").platform();

    let aggregate = run_load_test(test_config(1, 4, 2), Arc::clone(&platform)).await.unwrap();

    assert_eq!(platform.secret_namespaces(), tenants(&[2, 3, 4]));
    assert_eq!(aggregate.error(ErrorCode::IdentityProvisioning).unwrap().count, 1);
    assert!(aggregate.error(ErrorCode::NamespaceReadiness).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_single_cohort_per_worker() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new().fail_namespace("testuser-0004").platform();

    let aggregate = run_load_test(test_config(1, 4, 4), Arc::clone(&platform)).await.unwrap();

    assert!(platform.secret_namespaces().is_empty());
    assert_eq!(aggregate.identity.failures, 4);
    assert_eq!(aggregate.identity.forwarded, 0);
    assert_eq!(aggregate.resources.failures, 0);
    assert_eq!(aggregate.identity.failure_percentage, 100.0);
}

#[tokio::test]
async fn test_partial_cohort_rejected_before_any_worker_starts() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new().platform();

    let err = run_load_test(RunConfig::new(2, 5, 2), Arc::clone(&platform)).await.unwrap_err();

    assert!(matches!(err, LoadgenError::InvalidBatchSize { .. }));
    assert!(platform.identities().is_empty());
}
