//! Run configuration
//!
//! [`RunConfig`] holds every parameter of a load-test run: the shape of the
//! run (threads, users per thread, cohort size), the optional build
//! observation stage, fail-fast behavior, naming inputs, and the per-operation
//! timeouts. It is validated once, before any worker starts, and shared
//! read-only by every worker afterwards.
//!
//! The simulated platform is configured separately by a [`Scenario`] file.
//!
//! # Example
//!
//! ```rust,no_run
//! use tenant_loadgen::config::RunConfig;
//!
//! let config = RunConfig::new(2, 4, 2).with_wait_for_builds(true);
//! config.validate()?;
//! assert_eq!(config.total_users(), 8);
//! # Ok::<(), tenant_loadgen::core::LoadgenError>(())
//! ```

pub mod scenario;

pub use scenario::{BuildBehavior, FailureRules, Latencies, Scenario};

use crate::constants::{
    BUILD_POLL_INTERVAL, BUILD_TIMEOUT, DEFAULT_COMPONENT_SOURCE, DEFAULT_QUAY_ORGANIZATION,
    DEFAULT_USERNAME_PREFIX, DOCKER_CONFIG_JSON_ENV, GITOPS_REPO_POLL_INTERVAL,
    GITOPS_REPO_TIMEOUT, NAMESPACE_POLL_INTERVAL, NAMESPACE_TIMEOUT, QUAY_ORGANIZATION_ENV,
};
use crate::core::LoadgenError;
use crate::poll::WaitPolicy;
use regex::Regex;
use std::sync::LazyLock;

/// Usernames end up inside namespace names, so the prefix must be a valid
/// DNS-1123 label fragment.
static USERNAME_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

/// Longest prefix that still leaves room for `-NNNN-tenant` in a 63 character label.
const MAX_USERNAME_PREFIX_LEN: usize = 40;

/// Bounded waits used by the pipeline.
///
/// Timeouts are per operation; there is no global run deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Wait for a cohort member's tenant namespace
    pub namespace: WaitPolicy,
    /// Wait for an application's gitops repository
    pub gitops_repo: WaitPolicy,
    /// Wait for a build run to reach a terminal state
    pub build: WaitPolicy,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            namespace: WaitPolicy::new(NAMESPACE_POLL_INTERVAL, NAMESPACE_TIMEOUT),
            gitops_repo: WaitPolicy::new(GITOPS_REPO_POLL_INTERVAL, GITOPS_REPO_TIMEOUT),
            build: WaitPolicy::new(BUILD_POLL_INTERVAL, BUILD_TIMEOUT),
        }
    }
}

/// Parameters of one load-test run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of independent worker pipelines
    pub threads: usize,
    /// Users provisioned by each worker
    pub users_per_thread: usize,
    /// Cohort size used to gate identity provisioning
    pub batch_size: usize,
    /// Whether the build observation stage runs
    pub wait_for_builds: bool,
    /// Terminate the process on the first recorded failure
    pub fail_fast: bool,
    /// Prefix for synthetic usernames
    pub username_prefix: String,
    /// Git source of every component
    pub component_source: String,
    /// quay.io organization used for component images
    pub quay_organization: String,
    /// Payload of the image-pull credential
    pub registry_payload: String,
    /// Per-operation waits
    pub timeouts: Timeouts,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            users_per_thread: 5,
            batch_size: 5,
            wait_for_builds: false,
            fail_fast: false,
            username_prefix: DEFAULT_USERNAME_PREFIX.to_string(),
            component_source: DEFAULT_COMPONENT_SOURCE.to_string(),
            quay_organization: DEFAULT_QUAY_ORGANIZATION.to_string(),
            registry_payload: "{}".to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

impl RunConfig {
    /// Create a configuration with the given shape and default everything else.
    #[must_use]
    pub fn new(threads: usize, users_per_thread: usize, batch_size: usize) -> Self {
        Self {
            threads,
            users_per_thread,
            batch_size,
            ..Self::default()
        }
    }

    /// Enable or disable the build observation stage.
    #[must_use]
    pub fn with_wait_for_builds(mut self, wait_for_builds: bool) -> Self {
        self.wait_for_builds = wait_for_builds;
        self
    }

    /// Replace the per-operation timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Replace the username prefix.
    #[must_use]
    pub fn with_username_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.username_prefix = prefix.into();
        self
    }

    /// Fill the registry payload and quay organization from the environment.
    ///
    /// `DOCKER_CONFIG_JSON` provides the credential payload and
    /// `QUAY_E2E_ORGANIZATION` overrides the image organization. Unset
    /// variables leave the current values untouched.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(payload) = std::env::var(DOCKER_CONFIG_JSON_ENV) {
            self.registry_payload = payload;
        }
        if let Ok(organization) = std::env::var(QUAY_ORGANIZATION_ENV) {
            if !organization.is_empty() {
                self.quay_organization = organization;
            }
        }
        self
    }

    /// Number of users attempted across the run.
    pub fn total_users(&self) -> usize {
        self.threads * self.users_per_thread
    }

    /// Check every invariant of the run shape.
    ///
    /// # Errors
    ///
    /// - [`LoadgenError::InvalidConfig`] for zero counts or a malformed prefix
    /// - [`LoadgenError::InvalidBatchSize`] when `users_per_thread` is not a
    ///   multiple of `batch_size`
    pub fn validate(&self) -> Result<(), LoadgenError> {
        if self.threads == 0 {
            return Err(invalid("--threads must be at least 1"));
        }
        if self.users_per_thread == 0 {
            return Err(invalid("--users must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(invalid("--batch must be at least 1"));
        }
        if self.users_per_thread % self.batch_size != 0 {
            return Err(LoadgenError::InvalidBatchSize {
                users_per_thread: self.users_per_thread,
                batch_size: self.batch_size,
            });
        }
        if self.username_prefix.len() > MAX_USERNAME_PREFIX_LEN
            || !USERNAME_PREFIX_PATTERN.is_match(&self.username_prefix)
        {
            return Err(invalid(format!(
                "username prefix '{}' must be lowercase alphanumerics or '-', at most {MAX_USERNAME_PREFIX_LEN} characters",
                self.username_prefix
            )));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> LoadgenError {
    LoadgenError::InvalidConfig {
        message: message.into(),
    }
}
