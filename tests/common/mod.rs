//! Shared helpers for the integration suite.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch directory to run the binary in.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Create an empty project directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Root of the project directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `name` inside the project.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a scenario file and return its path.
    pub fn write_scenario(&self, name: &str, content: &str) -> PathBuf {
        let path = self.file(name);
        std::fs::write(&path, content).expect("write scenario");
        path
    }

    /// The binary, running inside the project with progress bars disabled.
    pub fn loadgen(&self) -> Command {
        let mut cmd = Command::cargo_bin("tenant-loadgen").expect("binary is built");
        cmd.current_dir(self.path())
            .env("LOADGEN_NO_PROGRESS", "1")
            .env_remove("RUST_LOG")
            .env_remove("QUAY_E2E_ORGANIZATION")
            .env_remove("DOCKER_CONFIG_JSON");
        cmd
    }

    /// Parse the JSON report at `name`.
    pub fn read_report(&self, name: &str) -> serde_json::Value {
        let content = std::fs::read_to_string(self.file(name)).expect("report exists");
        serde_json::from_str(&content).expect("report is valid JSON")
    }
}

/// Scenario where every simulated operation is immediate.
pub const INSTANT_SCENARIO: &str = r#"
[latencies]
create_identity_ms = 0
namespace_ready_ms = 0
create_secret_ms = 0
create_application_ms = 0
gitops_repo_ready_ms = 0
create_component_ms = 0
build_duration_ms = 1
delete_identity_ms = 0
"#;
