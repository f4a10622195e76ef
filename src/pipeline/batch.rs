//! Cohort batching for identity provisioning.
//!
//! Ordinals are grouped into cohorts `{k*B+1 ..= k*B+B}`. A cohort is
//! evaluated once its last ordinal has been attempted, over the members
//! whose identity was created. Members are released to the next stage only
//! if every one of their namespaces became ready; otherwise the whole cohort
//! is abandoned.

use crate::metrics::{ErrorCode, Failure};
use crate::naming::UserNames;
use crate::platform::Platform;
use crate::poll::WaitPolicy;
use futures::future::join_all;
use std::mem;
use tracing::{debug, warn};

/// Collects provisioned users until a cohort boundary is reached.
#[derive(Debug)]
pub struct BatchGate {
    batch_size: usize,
    attempted: usize,
    members: Vec<UserNames>,
}

impl BatchGate {
    /// Create a gate releasing cohorts of `batch_size` ordinals.
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            attempted: 0,
            members: Vec::with_capacity(batch_size),
        }
    }

    /// Account for one attempted ordinal.
    ///
    /// `member` is `Some` when the ordinal's identity was created. Returns
    /// the completed cohort when this ordinal closes it.
    pub fn admit(&mut self, member: Option<UserNames>) -> Option<Cohort> {
        self.attempted += 1;
        if let Some(member) = member {
            self.members.push(member);
        }
        if self.attempted % self.batch_size != 0 {
            return None;
        }
        Some(Cohort {
            index: self.attempted / self.batch_size - 1,
            members: mem::replace(&mut self.members, Vec::with_capacity(self.batch_size)),
        })
    }

    /// Members waiting for the current cohort to close.
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.members.len()
    }
}

/// One closed cohort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
    /// Zero-based cohort number within the worker
    pub index: usize,
    /// Members whose identity was created
    pub members: Vec<UserNames>,
}

/// Result of a cohort checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CohortVerdict {
    /// Every member is ready and may be forwarded
    Released(Vec<UserNames>),
    /// At least one namespace was not ready; one failure per member
    Abandoned(Vec<Failure>),
}

impl Cohort {
    /// Wait for every member's namespace and decide the cohort's fate.
    ///
    /// Readiness is awaited for all members concurrently, each bounded by
    /// `wait`. An empty cohort is released trivially.
    pub async fn checkpoint<P: Platform>(self, platform: &P, wait: WaitPolicy) -> CohortVerdict {
        let checks = join_all(
            self.members
                .iter()
                .map(|member| platform.wait_for_namespace(&member.namespace, wait)),
        )
        .await;

        let Some(blocker) = self
            .members
            .iter()
            .zip(&checks)
            .find_map(|(member, check)| check.as_ref().err().map(|_| member.username.clone()))
        else {
            debug!("Cohort {} released with {} members", self.index, self.members.len());
            return CohortVerdict::Released(self.members);
        };

        warn!(
            "Cohort {} abandoned: namespace of {blocker} did not become ready",
            self.index
        );
        let failures = self
            .members
            .iter()
            .zip(checks)
            .map(|(member, check)| {
                let message = match check {
                    Err(e) => format!(
                        "Unable to find namespace '{}' within {:?}: {e}",
                        member.namespace, wait.timeout
                    ),
                    Ok(()) => format!(
                        "Namespace '{}' was ready but cohort {} was abandoned because the namespace of {blocker} was not",
                        member.namespace, self.index
                    ),
                };
                Failure::new(ErrorCode::NamespaceReadiness, message)
            })
            .collect();
        CohortVerdict::Abandoned(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scenario;
    use crate::platform::SimulatedPlatform;
    use std::time::Duration;

    fn names(index: usize) -> UserNames {
        UserNames::for_index("testuser", index)
    }

    #[test]
    fn test_gate_closes_on_ordinal_boundary() {
        let mut gate = BatchGate::new(2);
        assert!(gate.admit(Some(names(1))).is_none());
        assert_eq!(gate.pending(), 1);

        let cohort = gate.admit(Some(names(2))).unwrap();
        assert_eq!(cohort.index, 0);
        assert_eq!(cohort.members, vec![names(1), names(2)]);
        assert_eq!(gate.pending(), 0);
    }

    #[test]
    fn test_failed_ordinals_still_close_cohort() {
        let mut gate = BatchGate::new(3);
        assert!(gate.admit(None).is_none());
        assert!(gate.admit(Some(names(2))).is_none());
        let cohort = gate.admit(None).unwrap();
        assert_eq!(cohort.members, vec![names(2)]);

        assert!(gate.admit(None).is_none());
        assert!(gate.admit(None).is_none());
        let empty = gate.admit(None).unwrap();
        assert_eq!(empty.index, 1);
        assert!(empty.members.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cohort_abandoned_when_one_namespace_missing() {
        let mut scenario = Scenario::instant();
        scenario.failures.namespace.insert("testuser-0002".to_string());
        let platform = SimulatedPlatform::new(scenario);
        for index in 1..=2 {
            platform.create_identity(&names(index).username).await.unwrap();
        }

        let cohort = Cohort {
            index: 0,
            members: vec![names(1), names(2)],
        };
        let wait = WaitPolicy::new(Duration::from_millis(10), Duration::from_millis(100));
        let CohortVerdict::Abandoned(failures) = cohort.checkpoint(&platform, wait).await else {
            panic!("cohort should have been abandoned");
        };

        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|f| f.code == ErrorCode::NamespaceReadiness));
        assert!(failures[0].message.contains("was ready but cohort 0 was abandoned"));
        assert!(failures[1].message.contains("Unable to find namespace 'testuser-0002-tenant'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cohort_released() {
        let platform = SimulatedPlatform::new(Scenario::instant());
        let cohort = Cohort {
            index: 3,
            members: Vec::new(),
        };
        let wait = WaitPolicy::new(Duration::from_millis(10), Duration::from_millis(100));
        assert_eq!(cohort.checkpoint(&platform, wait).await, CohortVerdict::Released(Vec::new()));
    }
}
