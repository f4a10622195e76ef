//! Collaborator surface of the platform under test
//!
//! The load generator never talks to the cluster directly. Everything it
//! needs (creating identities and workload resources, probing readiness,
//! reading build status) goes through the [`Platform`] trait. The two bounded
//! waits have default implementations built on [`poll_until`], so an
//! implementation only provides the readiness probes.
//!
//! Implementations:
//! - [`SimulatedPlatform`] - in-memory platform driven by a
//!   [`Scenario`](crate::config::Scenario), used by the binary and the tests
//! - [`Retrying`] - decorator adding exponential backoff to the create calls

pub mod retry;
pub mod simulated;

pub use retry::Retrying;
pub use simulated::SimulatedPlatform;

use crate::core::LoadgenError;
use crate::poll::{WaitPolicy, poll_until};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Result type of every platform operation.
pub type PlatformResult<T> = Result<T, LoadgenError>;

/// An image-pull credential stored in a tenant namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySecret {
    /// Secret name
    pub name: String,
    /// Namespace holding the secret
    pub namespace: String,
}

/// An application record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Application name
    pub name: String,
    /// Tenant namespace
    pub namespace: String,
    /// Repository the platform pushes the application's gitops content to
    pub gitops_repo_url: Option<String>,
}

/// Everything needed to create a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    /// Owning application
    pub application: String,
    /// Requested component name
    pub name: String,
    /// Tenant namespace
    pub namespace: String,
    /// Git source of the component
    pub source_url: String,
    /// Output image reference
    pub image: String,
}

/// A component record as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Name assigned by the platform
    pub name: String,
    /// Owning application
    pub application: String,
    /// Tenant namespace
    pub namespace: String,
}

/// Status of a `Succeeded` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The run succeeded
    True,
    /// The run failed
    False,
    /// The run is still in progress
    Unknown,
}

/// The `Succeeded` condition of a build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SucceededCondition {
    /// Condition status
    pub status: ConditionStatus,
    /// Machine readable reason
    pub reason: String,
    /// Human readable message
    pub message: String,
}

/// A build run triggered by component creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRun {
    /// Build run name
    pub name: String,
    /// When the run was created
    pub creation_time: DateTime<Utc>,
    /// When the run finished, if it has
    pub completion_time: Option<DateTime<Utc>>,
    /// The `Succeeded` condition, absent until the run has started
    pub succeeded: Option<SucceededCondition>,
}

impl BuildRun {
    /// Whether the run has reached a terminal state.
    pub fn is_done(&self) -> bool {
        self.succeeded
            .as_ref()
            .is_some_and(|condition| condition.status != ConditionStatus::Unknown)
    }

    /// Whether the run reached a terminal failed state.
    pub fn is_failed(&self) -> bool {
        self.succeeded
            .as_ref()
            .is_some_and(|condition| condition.status == ConditionStatus::False)
    }

    /// Completion minus creation time; zero while the run is unfinished.
    pub fn wall_time(&self) -> std::time::Duration {
        self.completion_time
            .and_then(|completed| (completed - self.creation_time).to_std().ok())
            .unwrap_or_default()
    }
}

/// Operations the pipeline needs from the platform under test.
///
/// Every method is one remote call (or a bounded sequence of them for the
/// waits). Retry and backoff policy, if any, belongs to the implementation.
pub trait Platform: Send + Sync {
    /// Provision the identity (user signup) `name`.
    fn create_identity(&self, name: &str) -> impl Future<Output = PlatformResult<()>> + Send;

    /// Probe whether `namespace` exists and is ready.
    fn namespace_exists(&self, namespace: &str)
    -> impl Future<Output = PlatformResult<bool>> + Send;

    /// Wait until `namespace` is ready.
    fn wait_for_namespace(
        &self,
        namespace: &str,
        wait: WaitPolicy,
    ) -> impl Future<Output = PlatformResult<()>> + Send {
        async move {
            poll_until(wait.interval, wait.timeout, || self.namespace_exists(namespace))
                .await
                .map_err(|e| LoadgenError::PollTimeout {
                    what: format!("namespace {namespace}: {e}"),
                    timeout: wait.timeout,
                })
        }
    }

    /// Create the image-pull credential `name` in `namespace`.
    fn create_registry_credential(
        &self,
        name: &str,
        namespace: &str,
        payload: &str,
    ) -> impl Future<Output = PlatformResult<RegistrySecret>> + Send;

    /// Create the application `name` in `namespace`.
    fn create_application(
        &self,
        name: &str,
        namespace: &str,
    ) -> impl Future<Output = PlatformResult<Application>> + Send;

    /// Probe whether the application's gitops repository exists.
    fn gitops_repo_exists(
        &self,
        application: &Application,
    ) -> impl Future<Output = PlatformResult<bool>> + Send;

    /// Wait until the application's gitops repository exists.
    fn wait_for_gitops_repo(
        &self,
        application: &Application,
        wait: WaitPolicy,
    ) -> impl Future<Output = PlatformResult<()>> + Send {
        async move {
            poll_until(wait.interval, wait.timeout, || self.gitops_repo_exists(application))
                .await
                .map_err(|e| LoadgenError::PollTimeout {
                    what: format!("gitops repository of {}: {e}", application.name),
                    timeout: wait.timeout,
                })
        }
    }

    /// Create a component; this triggers its build run.
    fn create_component(
        &self,
        spec: &ComponentSpec,
    ) -> impl Future<Output = PlatformResult<Component>> + Send;

    /// Fetch the build run of `component`.
    fn get_build_run(
        &self,
        component: &str,
        application: &str,
        namespace: &str,
    ) -> impl Future<Output = PlatformResult<BuildRun>> + Send;

    /// Delete the identity `name` and everything it owns.
    ///
    /// Deleting an identity that does not exist succeeds.
    fn delete_identity(&self, name: &str) -> impl Future<Output = PlatformResult<()>> + Send;
}
