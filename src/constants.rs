//! Global constants used throughout the load generator.
//!
//! This module contains poll intervals, timeouts, default names and the
//! environment variables read at runtime. Defining them centrally keeps
//! magic numbers discoverable.

use std::time::Duration;

/// Default prefix for synthetic usernames.
pub const DEFAULT_USERNAME_PREFIX: &str = "testuser";

/// Suffix appended to a username to derive its tenant namespace.
pub const TENANT_NAMESPACE_SUFFIX: &str = "tenant";

/// Name of the image-pull credential created in every tenant namespace.
pub const REGISTRY_AUTH_SECRET_NAME: &str = "redhat-appstudio-registry-pull-secret";

/// Devfile sample used as the component source.
pub const DEFAULT_COMPONENT_SOURCE: &str =
    "https://github.com/devfile-samples/devfile-sample-code-with-quarkus";

/// Default quay.io organization for component images.
pub const DEFAULT_QUAY_ORGANIZATION: &str = "redhat-appstudio-qe";

/// Default log file written for every run.
pub const DEFAULT_LOG_FILE: &str = "load-tests.log";

/// Default JSON report written after every run.
pub const DEFAULT_REPORT_FILE: &str = "load-tests.json";

/// Interval between namespace readiness checks (1 second).
pub const NAMESPACE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timeout for a tenant namespace to appear after identity creation (5 minutes).
pub const NAMESPACE_TIMEOUT: Duration = Duration::from_secs(300);

/// Interval between gitops repository checks (1 second).
pub const GITOPS_REPO_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timeout for an application's gitops repository to exist (60 seconds).
pub const GITOPS_REPO_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between build-run status checks (200 milliseconds).
pub const BUILD_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Timeout for a build run to reach a terminal state (60 minutes).
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Starting delay for collaborator retries (10ms), doubled on every attempt.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Maximum delay between collaborator retries (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Environment variable disabling progress bars when set to any value.
pub const NO_PROGRESS_ENV: &str = "LOADGEN_NO_PROGRESS";

/// Environment variable holding the registry credential payload.
pub const DOCKER_CONFIG_JSON_ENV: &str = "DOCKER_CONFIG_JSON";

/// Environment variable overriding the quay.io organization.
pub const QUAY_ORGANIZATION_ENV: &str = "QUAY_E2E_ORGANIZATION";
