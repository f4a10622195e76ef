//! The `run` command end to end.

use crate::common::{INSTANT_SCENARIO, TestProject};
use predicates::prelude::*;

#[test]
fn test_run_writes_report_and_log() {
    let project = TestProject::new();
    let scenario = project.write_scenario("scenario.toml", INSTANT_SCENARIO);

    project
        .loadgen()
        .args(["run", "-t", "1", "-u", "2", "-b", "2", "-w", "--output", "report.json"])
        .arg("--scenario")
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("Load Test Completed!"))
        .stdout(predicate::str::contains("No failures"));

    let report = project.read_report("report.json");
    assert_eq!(report["threads"], 1);
    assert_eq!(report["usersPerThread"], 2);
    assert_eq!(report["threadBatchSize"], 2);
    assert_eq!(report["totalUsers"], 2);
    assert_eq!(report["status"], "Completed");
    assert_eq!(report["createUserFailures"], 0);
    assert_eq!(report["runPipelineFailures"], 0);
    assert_eq!(report["errors"], serde_json::json!([]));
    assert!(report["timestamp"].as_str().is_some_and(|ts| !ts.is_empty()));

    let log = std::fs::read_to_string(project.file("load-tests.log")).unwrap();
    assert!(log.contains("Average Time taken to spin up users"));
}

#[test]
fn test_run_records_user_failures_without_failing() {
    let project = TestProject::new();
    let scenario = project.write_scenario(
        "scenario.toml",
        &format!("{INSTANT_SCENARIO}\n[failures]\ncreate_secret = [\"testuser-0001\"]\n"),
    );

    project
        .loadgen()
        .args(["run", "-u", "2", "-b", "1", "--log-file", "run.log"])
        .arg("--scenario")
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("Error #3"));

    let report = project.read_report("load-tests.json");
    assert_eq!(report["createResourcesFailures"], 1);
    assert_eq!(report["createResourcesFailureRate"], 50.0);
    assert_eq!(report["errors"][0]["errorNumber"], 3);
    assert_eq!(report["errors"][0]["count"], 1);

    let log = std::fs::read_to_string(project.file("run.log")).unwrap();
    assert!(log.contains("Error #3: Unable to create the secret"));
}

#[test]
fn test_invalid_batch_size_exits_before_running() {
    let project = TestProject::new();

    project
        .loadgen()
        .args(["run", "-u", "5", "-b", "2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Please provide correct batches"));

    assert!(!project.file("load-tests.json").exists());
}

#[test]
fn test_fail_fast_terminates_on_first_error() {
    let project = TestProject::new();
    let scenario = project.write_scenario(
        "scenario.toml",
        &format!("{INSTANT_SCENARIO}\n[failures]\ncreate_identity = [\"testuser-0001\"]\n"),
    );

    project
        .loadgen()
        .args(["run", "-u", "2", "-b", "1", "--fail-fast"])
        .arg("--scenario")
        .arg(&scenario)
        .assert()
        .code(1);

    assert!(!project.file("load-tests.json").exists());
    let log = std::fs::read_to_string(project.file("load-tests.log")).unwrap();
    assert!(log.contains("Error #1: Unable to provision user 'testuser-0001'"));
}

#[test]
fn test_malformed_scenario_is_reported() {
    let project = TestProject::new();
    let scenario = project.write_scenario("scenario.toml", "[latencies]\nunknown_field = 3\n");

    project
        .loadgen()
        .arg("run")
        .arg("--scenario")
        .arg(&scenario)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse scenario file"));
}

#[test]
fn test_help_lists_run_flags() {
    let project = TestProject::new();

    project
        .loadgen()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--waitpipelines"))
        .stdout(predicate::str::contains("--batch"))
        .stdout(predicate::str::contains("--fail-fast"));
}
