//! The `purge` command and `run --purge`.

use crate::common::{INSTANT_SCENARIO, TestProject};
use predicates::prelude::*;

#[test]
fn test_run_with_purge_deletes_users() {
    let project = TestProject::new();
    let scenario = project.write_scenario("scenario.toml", INSTANT_SCENARIO);

    project
        .loadgen()
        .args(["run", "-t", "2", "-u", "1", "-b", "1", "--purge"])
        .arg("--scenario")
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("Purged 2 users"));
}

#[test]
fn test_purge_succeeds_for_absent_users() {
    let project = TestProject::new();

    project
        .loadgen()
        .args(["purge", "-t", "2", "-u", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Purged 6 users"));
}

#[test]
fn test_purge_reports_error_count() {
    let project = TestProject::new();
    let scenario = project.write_scenario(
        "scenario.toml",
        &format!(
            "{INSTANT_SCENARIO}\n[failures]\ndelete_identity = [\"loadtest-0001\", \"loadtest-0002\"]\n"
        ),
    );

    project
        .loadgen()
        .args(["purge", "--username", "loadtest", "-u", "3"])
        .arg("--scenario")
        .arg(&scenario)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Hit 2 errors when purging resources"));
}

#[test]
fn test_purge_rejects_invalid_prefix() {
    let project = TestProject::new();

    project
        .loadgen()
        .args(["purge", "--username", "Not_Valid"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("username prefix"));
}
