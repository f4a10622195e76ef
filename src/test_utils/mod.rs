//! Test utilities
//!
//! Helpers shared by unit tests and the integration suite: one-time logging
//! initialization, short timeouts, and a builder for simulated-platform
//! scenarios.
//!
//! # Example
//!
//! ```rust,no_run
//! use tenant_loadgen::config::BuildBehavior;
//! use tenant_loadgen::test_utils::{ScenarioBuilder, init_test_logging};
//!
//! init_test_logging(None);
//! let scenario = ScenarioBuilder::new()
//!     .fail_secret("testuser-0002")
//!     .build_outcome("testuser-0003", BuildBehavior::Failed)
//!     .build();
//! ```

use crate::config::{BuildBehavior, RunConfig, Scenario, Timeouts};
use crate::platform::SimulatedPlatform;
use crate::poll::WaitPolicy;
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, otherwise `RUST_LOG`; does nothing if neither is
/// set. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Waits short enough for real-time tests.
pub fn test_timeouts() -> Timeouts {
    Timeouts {
        namespace: WaitPolicy::new(Duration::from_millis(5), Duration::from_millis(500)),
        gitops_repo: WaitPolicy::new(Duration::from_millis(5), Duration::from_millis(500)),
        build: WaitPolicy::new(Duration::from_millis(5), Duration::from_millis(500)),
    }
}

/// A run configuration with [`test_timeouts`].
pub fn test_config(threads: usize, users_per_thread: usize, batch_size: usize) -> RunConfig {
    RunConfig::new(threads, users_per_thread, batch_size).with_timeouts(test_timeouts())
}

/// Fluent construction of a [`Scenario`], starting from [`Scenario::instant`].
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    scenario: Scenario,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    /// Every operation instantaneous and successful.
    pub fn new() -> Self {
        Self {
            scenario: Scenario::instant(),
        }
    }

    /// Reject `create_identity` for `user`.
    #[must_use]
    pub fn fail_identity(mut self, user: &str) -> Self {
        self.scenario.failures.create_identity.insert(user.to_string());
        self
    }

    /// Never make `user`'s namespace ready.
    #[must_use]
    pub fn fail_namespace(mut self, user: &str) -> Self {
        self.scenario.failures.namespace.insert(user.to_string());
        self
    }

    /// Reject the image-pull credential of `user`.
    #[must_use]
    pub fn fail_secret(mut self, user: &str) -> Self {
        self.scenario.failures.create_secret.insert(user.to_string());
        self
    }

    /// Reject the application of `user`.
    #[must_use]
    pub fn fail_application(mut self, user: &str) -> Self {
        self.scenario.failures.create_application.insert(user.to_string());
        self
    }

    /// Never create the gitops repository of `user`'s application.
    #[must_use]
    pub fn fail_gitops_repo(mut self, user: &str) -> Self {
        self.scenario.failures.gitops_repo.insert(user.to_string());
        self
    }

    /// Reject the component of `user`.
    #[must_use]
    pub fn fail_component(mut self, user: &str) -> Self {
        self.scenario.failures.create_component.insert(user.to_string());
        self
    }

    /// Return `user`'s component under a different name.
    #[must_use]
    pub fn rename_component(mut self, user: &str) -> Self {
        self.scenario.failures.component_name_mismatch.insert(user.to_string());
        self
    }

    /// Reject deletion of `user`.
    #[must_use]
    pub fn fail_delete(mut self, user: &str) -> Self {
        self.scenario.failures.delete_identity.insert(user.to_string());
        self
    }

    /// Set the terminal behavior of `user`'s build.
    #[must_use]
    pub fn build_outcome(mut self, user: &str, behavior: BuildBehavior) -> Self {
        self.scenario.builds.insert(user.to_string(), behavior);
        self
    }

    /// Set the wall time of every build.
    #[must_use]
    pub fn build_duration_ms(mut self, ms: u64) -> Self {
        self.scenario.latencies.build_duration_ms = ms;
        self
    }

    /// Set the identity creation latency.
    #[must_use]
    pub fn identity_latency_ms(mut self, ms: u64) -> Self {
        self.scenario.latencies.create_identity_ms = ms;
        self
    }

    /// Finish the scenario.
    pub fn build(self) -> Scenario {
        self.scenario
    }

    /// Finish the scenario and wrap it in a shared simulated platform.
    pub fn platform(self) -> Arc<SimulatedPlatform> {
        Arc::new(SimulatedPlatform::new(self.scenario))
    }
}
