//! In-memory platform driven by a [`Scenario`].
//!
//! Objects live in a single mutex-guarded state map. Latencies are simulated
//! with `tokio::time::sleep` and readiness with `tokio::time::Instant`, so the
//! simulation follows a paused test clock as well as the real one. Build
//! timestamps are wall-clock `chrono` values offset by the configured build
//! duration.

use super::{
    Application, BuildRun, Component, ComponentSpec, ConditionStatus, Platform, PlatformResult,
    RegistrySecret, SucceededCondition,
};
use crate::config::{BuildBehavior, Latencies, Scenario};
use crate::constants::TENANT_NAMESPACE_SUFFIX;
use crate::core::LoadgenError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::{Instant, sleep};
use tracing::debug;

#[derive(Debug, Default)]
struct SimState {
    identities: HashMap<String, Instant>,
    applications: HashMap<(String, String), Instant>,
    components: HashMap<(String, String), (Instant, DateTime<Utc>)>,
    secrets: HashMap<(String, String), String>,
}

/// A platform that lives entirely in memory.
#[derive(Debug)]
pub struct SimulatedPlatform {
    scenario: Scenario,
    state: Mutex<SimState>,
}

impl SimulatedPlatform {
    /// Create a platform behaving as described by `scenario`.
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            state: Mutex::new(SimState::default()),
        }
    }

    /// Usernames of all identities that currently exist, sorted.
    pub fn identities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().identities.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of image-pull credentials created so far.
    #[cfg(test)]
    pub fn secret_count(&self) -> usize {
        self.state().secrets.len()
    }

    /// Namespaces holding an image-pull credential, sorted.
    ///
    /// A user's namespace appears here once its resources stage started.
    pub fn secret_namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> =
            self.state().secrets.keys().map(|(namespace, _)| namespace.clone()).collect();
        namespaces.sort();
        namespaces.dedup();
        namespaces
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn latencies(&self) -> &Latencies {
        &self.scenario.latencies
    }

    async fn simulate_latency(&self, ms: u64) {
        if ms > 0 {
            sleep(Latencies::ms(ms)).await;
        }
    }
}

/// Owner of a tenant namespace, e.g. `testuser-0001` for `testuser-0001-tenant`.
fn namespace_owner(namespace: &str) -> &str {
    namespace
        .strip_suffix(TENANT_NAMESPACE_SUFFIX)
        .and_then(|rest| rest.strip_suffix('-'))
        .unwrap_or(namespace)
}

impl Platform for SimulatedPlatform {
    async fn create_identity(&self, name: &str) -> PlatformResult<()> {
        self.simulate_latency(self.latencies().create_identity_ms).await;
        if self.scenario.failures.create_identity.contains(name) {
            return Err(LoadgenError::platform(
                "create identity",
                format!("usersignup {name} was rejected by the registration service"),
            ));
        }

        let mut state = self.state();
        if state.identities.contains_key(name) {
            return Err(LoadgenError::platform(
                "create identity",
                format!("usersignup {name} already exists"),
            ));
        }
        state.identities.insert(name.to_string(), Instant::now());
        debug!("Simulated identity {name} created");
        Ok(())
    }

    async fn namespace_exists(&self, namespace: &str) -> PlatformResult<bool> {
        let owner = namespace_owner(namespace);
        if self.scenario.failures.namespace.contains(owner) {
            return Ok(false);
        }
        let ready_after = Latencies::ms(self.latencies().namespace_ready_ms);
        match self.state().identities.get(owner) {
            Some(created) => Ok(created.elapsed() >= ready_after),
            None => Err(LoadgenError::not_found("namespace", namespace)),
        }
    }

    async fn create_registry_credential(
        &self,
        name: &str,
        namespace: &str,
        payload: &str,
    ) -> PlatformResult<RegistrySecret> {
        self.simulate_latency(self.latencies().create_secret_ms).await;
        let owner = namespace_owner(namespace);
        if self.scenario.failures.create_secret.contains(owner) {
            return Err(LoadgenError::platform(
                "create secret",
                format!("secrets \"{name}\" is forbidden in namespace {namespace}"),
            ));
        }

        let mut state = self.state();
        if !state.identities.contains_key(owner) {
            return Err(LoadgenError::not_found("namespace", namespace));
        }
        state
            .secrets
            .insert((namespace.to_string(), name.to_string()), payload.to_string());
        Ok(RegistrySecret {
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
    }

    async fn create_application(&self, name: &str, namespace: &str) -> PlatformResult<Application> {
        self.simulate_latency(self.latencies().create_application_ms).await;
        if self.scenario.failures.create_application.contains(namespace_owner(namespace)) {
            return Err(LoadgenError::platform(
                "create application",
                format!("application {name} was rejected by the admission webhook"),
            ));
        }

        self.state()
            .applications
            .insert((namespace.to_string(), name.to_string()), Instant::now());
        Ok(Application {
            name: name.to_string(),
            namespace: namespace.to_string(),
            gitops_repo_url: Some(format!("https://github.com/redhat-appstudio-appdata/{name}")),
        })
    }

    async fn gitops_repo_exists(&self, application: &Application) -> PlatformResult<bool> {
        if self.scenario.failures.gitops_repo.contains(namespace_owner(&application.namespace)) {
            return Ok(false);
        }
        let ready_after = Latencies::ms(self.latencies().gitops_repo_ready_ms);
        let key = (application.namespace.clone(), application.name.clone());
        match self.state().applications.get(&key) {
            Some(created) => Ok(created.elapsed() >= ready_after),
            None => Err(LoadgenError::not_found("application", &application.name)),
        }
    }

    async fn create_component(&self, spec: &ComponentSpec) -> PlatformResult<Component> {
        self.simulate_latency(self.latencies().create_component_ms).await;
        let owner = namespace_owner(&spec.namespace);
        if self.scenario.failures.create_component.contains(owner) {
            return Err(LoadgenError::platform(
                "create component",
                format!("component {} could not be detected from {}", spec.name, spec.source_url),
            ));
        }

        let name = if self.scenario.failures.component_name_mismatch.contains(owner) {
            format!("{}-renamed", spec.name)
        } else {
            spec.name.clone()
        };
        self.state()
            .components
            .insert((spec.namespace.clone(), name.clone()), (Instant::now(), Utc::now()));
        Ok(Component {
            name,
            application: spec.application.clone(),
            namespace: spec.namespace.clone(),
        })
    }

    async fn get_build_run(
        &self,
        component: &str,
        _application: &str,
        namespace: &str,
    ) -> PlatformResult<BuildRun> {
        let key = (namespace.to_string(), component.to_string());
        let Some((started, creation_time)) = self.state().components.get(&key).copied() else {
            return Err(LoadgenError::not_found("build run", component));
        };

        let build_duration = Latencies::ms(self.latencies().build_duration_ms);
        let behavior = self.scenario.build_behavior(namespace_owner(namespace));
        let finished = behavior != BuildBehavior::Never && started.elapsed() >= build_duration;

        let (completion_time, condition) = if finished {
            let completion = chrono::Duration::from_std(build_duration)
                .map(|duration| creation_time + duration)
                .unwrap_or(creation_time);
            let condition = match behavior {
                BuildBehavior::Failed => SucceededCondition {
                    status: ConditionStatus::False,
                    reason: "Failed".to_string(),
                    message: "Tasks Completed: 3 (Failed: 1, Cancelled 0), Skipped: 4".to_string(),
                },
                _ => SucceededCondition {
                    status: ConditionStatus::True,
                    reason: "Succeeded".to_string(),
                    message: "Tasks Completed: 7 (Failed: 0, Cancelled 0), Skipped: 0".to_string(),
                },
            };
            (Some(completion), condition)
        } else {
            let condition = SucceededCondition {
                status: ConditionStatus::Unknown,
                reason: "Running".to_string(),
                message: "Tasks Completed: 1 (Failed: 0, Cancelled 0), Incomplete: 6".to_string(),
            };
            (None, condition)
        };

        Ok(BuildRun {
            name: format!("{component}-build"),
            creation_time,
            completion_time,
            succeeded: Some(condition),
        })
    }

    async fn delete_identity(&self, name: &str) -> PlatformResult<()> {
        self.simulate_latency(self.latencies().delete_identity_ms).await;
        if self.scenario.failures.delete_identity.contains(name) {
            return Err(LoadgenError::platform(
                "delete identity",
                format!("usersignup {name} has a finalizer that did not complete"),
            ));
        }

        let mut state = self.state();
        if state.identities.remove(name).is_none() {
            debug!("Simulated identity {name} already absent");
        }
        let namespace = format!("{name}-{TENANT_NAMESPACE_SUFFIX}");
        state.applications.retain(|(ns, _), _| *ns != namespace);
        state.components.retain(|(ns, _), _| *ns != namespace);
        state.secrets.retain(|(ns, _), _| *ns != namespace);
        Ok(())
    }
}
