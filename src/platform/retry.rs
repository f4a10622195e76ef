//! Exponential backoff around platform create and delete calls.

use super::{
    Application, BuildRun, Component, ComponentSpec, Platform, PlatformResult, RegistrySecret,
};
use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};
use std::iter::Take;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

/// Wraps a [`Platform`] and retries its create and delete operations.
///
/// Probes and reads are passed through unchanged; the polling loops already
/// repeat them. With `retries == 0` every call is attempted exactly
/// once.
#[derive(Debug)]
pub struct Retrying<P> {
    inner: P,
    retries: usize,
}

impl<P: Platform> Retrying<P> {
    /// Retry each failed call up to `retries` additional times.
    pub fn new(inner: P, retries: usize) -> Self {
        Self { inner, retries }
    }

    /// The wrapped platform.
    #[cfg(test)]
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn strategy(&self) -> Take<ExponentialBackoff> {
        ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .factor(2)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .take(self.retries)
    }
}

impl<P: Platform> Platform for Retrying<P> {
    async fn create_identity(&self, name: &str) -> PlatformResult<()> {
        Retry::start(self.strategy(), || async move {
            self.inner.create_identity(name).await.inspect_err(|e| {
                debug!("create_identity {name} attempt failed: {e}");
            })
        })
        .await
    }

    async fn namespace_exists(&self, namespace: &str) -> PlatformResult<bool> {
        self.inner.namespace_exists(namespace).await
    }

    async fn create_registry_credential(
        &self,
        name: &str,
        namespace: &str,
        payload: &str,
    ) -> PlatformResult<RegistrySecret> {
        Retry::start(self.strategy(), || async move {
            self.inner
                .create_registry_credential(name, namespace, payload)
                .await
                .inspect_err(|e| debug!("create secret {namespace}/{name} attempt failed: {e}"))
        })
        .await
    }

    async fn create_application(&self, name: &str, namespace: &str) -> PlatformResult<Application> {
        Retry::start(self.strategy(), || async move {
            self.inner
                .create_application(name, namespace)
                .await
                .inspect_err(|e| debug!("create application {namespace}/{name} attempt failed: {e}"))
        })
        .await
    }

    async fn gitops_repo_exists(&self, application: &Application) -> PlatformResult<bool> {
        self.inner.gitops_repo_exists(application).await
    }

    async fn create_component(&self, spec: &ComponentSpec) -> PlatformResult<Component> {
        Retry::start(self.strategy(), || async move {
            self.inner.create_component(spec).await.inspect_err(|e| {
                debug!("create component {}/{} attempt failed: {e}", spec.namespace, spec.name);
            })
        })
        .await
    }

    async fn get_build_run(
        &self,
        component: &str,
        application: &str,
        namespace: &str,
    ) -> PlatformResult<BuildRun> {
        self.inner.get_build_run(component, application, namespace).await
    }

    async fn delete_identity(&self, name: &str) -> PlatformResult<()> {
        Retry::start(self.strategy(), || async move {
            self.inner.delete_identity(name).await.inspect_err(|e| {
                debug!("delete_identity {name} attempt failed: {e}");
            })
        })
        .await
    }
}
