//! Scenario files for the simulated platform.
//!
//! A scenario describes how the in-memory platform behaves: how long each
//! operation takes, how long asynchronous objects take to appear, and which
//! users hit which failure. Failures are keyed by username so runs are
//! reproducible.
//!
//! ```toml
//! [latencies]
//! create_identity_ms = 20
//! namespace_ready_ms = 50
//! build_duration_ms = 500
//!
//! [failures]
//! create_identity = ["testuser-0003"]
//! create_secret = ["testuser-0006"]
//!
//! [builds]
//! "testuser-0002" = "failed"
//! "testuser-0004" = "never"
//! ```

use crate::core::LoadgenError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

/// Simulated latencies, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Latencies {
    /// Time spent inside `create_identity`
    pub create_identity_ms: u64,
    /// Delay between identity creation and its namespace appearing
    pub namespace_ready_ms: u64,
    /// Time spent inside `create_registry_credential`
    pub create_secret_ms: u64,
    /// Time spent inside `create_application`
    pub create_application_ms: u64,
    /// Delay between application creation and its gitops repository existing
    pub gitops_repo_ready_ms: u64,
    /// Time spent inside `create_component`
    pub create_component_ms: u64,
    /// Wall time of a build run, from creation to completion
    pub build_duration_ms: u64,
    /// Time spent inside `delete_identity`
    pub delete_identity_ms: u64,
}

impl Default for Latencies {
    fn default() -> Self {
        Self {
            create_identity_ms: 5,
            namespace_ready_ms: 10,
            create_secret_ms: 2,
            create_application_ms: 2,
            gitops_repo_ready_ms: 10,
            create_component_ms: 2,
            build_duration_ms: 50,
            delete_identity_ms: 1,
        }
    }
}

impl Latencies {
    /// Convert a millisecond field into a [`Duration`].
    pub const fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }
}

/// Usernames for which an operation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FailureRules {
    /// `create_identity` is rejected
    pub create_identity: BTreeSet<String>,
    /// The tenant namespace never appears
    pub namespace: BTreeSet<String>,
    /// `create_registry_credential` is rejected
    pub create_secret: BTreeSet<String>,
    /// `create_application` is rejected
    pub create_application: BTreeSet<String>,
    /// The gitops repository never appears
    pub gitops_repo: BTreeSet<String>,
    /// `create_component` is rejected
    pub create_component: BTreeSet<String>,
    /// `create_component` returns a component with an unexpected name
    pub component_name_mismatch: BTreeSet<String>,
    /// `delete_identity` is rejected
    pub delete_identity: BTreeSet<String>,
}

/// Terminal behavior of a user's build run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildBehavior {
    /// The build finishes with a succeeded condition
    #[default]
    Succeeded,
    /// The build finishes with a failed condition
    Failed,
    /// The build never reaches a terminal state
    Never,
}

/// Complete description of the simulated platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    /// Operation latencies
    pub latencies: Latencies,
    /// Per-user failures
    pub failures: FailureRules,
    /// Per-user build outcome; users not listed succeed
    pub builds: BTreeMap<String, BuildBehavior>,
}

impl Scenario {
    /// Parse a scenario from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadgenError::ScenarioParseError`] when the text is not a
    /// valid scenario.
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, LoadgenError> {
        toml::from_str(content).map_err(|e| LoadgenError::ScenarioParseError {
            file: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read and
    /// [`LoadgenError::ScenarioParseError`] if it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self, LoadgenError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// A scenario where every operation is instantaneous and succeeds.
    pub fn instant() -> Self {
        Self {
            latencies: Latencies {
                create_identity_ms: 0,
                namespace_ready_ms: 0,
                create_secret_ms: 0,
                create_application_ms: 0,
                gitops_repo_ready_ms: 0,
                create_component_ms: 0,
                build_duration_ms: 1,
                delete_identity_ms: 0,
            },
            ..Self::default()
        }
    }

    /// Terminal behavior of `username`'s build.
    pub fn build_behavior(&self, username: &str) -> BuildBehavior {
        self.builds.get(username).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_scenario() {
        let scenario = Scenario::from_toml(
            r#"
[latencies]
create_identity_ms = 20
build_duration_ms = 500

[failures]
create_identity = ["testuser-0003"]
component_name_mismatch = ["testuser-0004"]

[builds]
"testuser-0002" = "failed"
"testuser-0005" = "never"
"#,
            "inline",
        )
        .unwrap();

        assert_eq!(scenario.latencies.create_identity_ms, 20);
        assert_eq!(scenario.latencies.build_duration_ms, 500);
        // Unspecified latencies keep their defaults
        assert_eq!(scenario.latencies.namespace_ready_ms, Latencies::default().namespace_ready_ms);
        assert!(scenario.failures.create_identity.contains("testuser-0003"));
        assert!(scenario.failures.component_name_mismatch.contains("testuser-0004"));
        assert_eq!(scenario.build_behavior("testuser-0002"), BuildBehavior::Failed);
        assert_eq!(scenario.build_behavior("testuser-0005"), BuildBehavior::Never);
        assert_eq!(scenario.build_behavior("testuser-0001"), BuildBehavior::Succeeded);
    }

    #[test]
    fn test_empty_scenario_uses_defaults() {
        let scenario = Scenario::from_toml("", "empty").unwrap();
        assert_eq!(scenario, Scenario::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Scenario::from_toml("[latencies]\nbogus_ms = 1\n", "bad.toml").unwrap_err();
        match err {
            LoadgenError::ScenarioParseError { file, .. } => assert_eq!(file, "bad.toml"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        tokio::fs::write(&path, "[failures]\nnamespace = [\"testuser-0001\"]\n").await.unwrap();

        let scenario = Scenario::load(&path).await.unwrap();
        assert!(scenario.failures.namespace.contains("testuser-0001"));
    }
}
