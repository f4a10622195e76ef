//! Counting invariants that hold for every run shape.

use std::sync::Arc;
use tenant_loadgen::config::BuildBehavior;
use tenant_loadgen::metrics::{ErrorCode, RunAggregate, Stage};
use tenant_loadgen::orchestrator::Orchestrator;
use tenant_loadgen::test_utils::{ScenarioBuilder, init_test_logging, test_config};

fn ledger_count(aggregate: &RunAggregate, stage: Stage) -> u64 {
    aggregate
        .errors
        .iter()
        .filter(|occurrence| {
            ErrorCode::from_number(occurrence.error_number).map(ErrorCode::stage) == Some(stage)
        })
        .map(|occurrence| occurrence.count)
        .sum()
}

fn assert_invariants(aggregate: &RunAggregate) {
    let shape = format!(
        "{} threads x {} users, batch {}",
        aggregate.threads, aggregate.users_per_thread, aggregate.batch_size
    );

    // Every attempted user either failed stage 1 or was forwarded
    assert_eq!(
        aggregate.identity.failures + aggregate.identity.forwarded,
        aggregate.total_users,
        "{shape}"
    );
    assert_eq!(
        aggregate.resources.failures + aggregate.resources.forwarded,
        aggregate.identity.forwarded,
        "{shape}"
    );
    let builds = aggregate.builds.expect("builds observed");
    assert_eq!(builds.failures + builds.forwarded, aggregate.resources.forwarded, "{shape}");

    // Per-worker counters agree with the ledger
    assert_eq!(ledger_count(aggregate, Stage::Identity), aggregate.identity.failures, "{shape}");
    assert_eq!(ledger_count(aggregate, Stage::Resources), aggregate.resources.failures, "{shape}");
    assert_eq!(ledger_count(aggregate, Stage::Build), builds.failures, "{shape}");
}

#[tokio::test(start_paused = true)]
async fn test_invariants_across_shapes() {
    init_test_logging(None);
    let shapes = [(1, 2, 1), (1, 2, 2), (2, 4, 2), (3, 6, 3), (2, 6, 2), (3, 4, 4)];

    for (threads, users, batch) in shapes {
        let platform = ScenarioBuilder::new()
            .fail_identity("testuser-0002")
            .fail_namespace("testuser-0005")
            .fail_secret("testuser-0003")
            .rename_component("testuser-0004")
            .fail_gitops_repo("testuser-0008")
            .build_outcome("testuser-0006", BuildBehavior::Failed)
            .build_outcome("testuser-0001", BuildBehavior::Never)
            .platform();
        let config = test_config(threads, users, batch).with_wait_for_builds(true);
        let orchestrator = Orchestrator::new(config, Arc::clone(&platform)).unwrap();

        let aggregate = orchestrator.run().await.unwrap();
        assert_invariants(&aggregate);
        assert_eq!(aggregate.workers.len(), threads);
        assert_eq!(
            orchestrator.progress().identities.attempted(),
            aggregate.total_users,
            "every user is counted once by the identity progress"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_is_idempotent() {
    init_test_logging(None);
    let platform = ScenarioBuilder::new()
        .fail_secret("testuser-0001")
        .fail_secret("testuser-0003")
        .fail_component("testuser-0002")
        .platform();
    let orchestrator = Orchestrator::new(test_config(2, 2, 1), platform).unwrap();

    let aggregate = orchestrator.run().await.unwrap();
    let first = orchestrator.snapshot();
    let second = orchestrator.snapshot();

    assert_eq!(first, second);
    assert_eq!(first, aggregate.errors);
    let numbers: Vec<u32> = first.iter().map(|occurrence| occurrence.error_number).collect();
    assert_eq!(numbers, vec![3, 6]);
    assert_eq!(first[0].count, 2);
}
