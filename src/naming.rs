//! Name derivation for synthetic users.
//!
//! A worker identity and a user ordinal are enough to derive every name a
//! user's pipeline touches, so no coordination between workers is needed.
//! The global index is `worker * users_per_thread + ordinal`, which is unique
//! across the run because ordinals start at 1 and never exceed
//! `users_per_thread`.

use crate::constants::TENANT_NAMESPACE_SUFFIX;

/// Names derived for one synthetic user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNames {
    /// Signup name, e.g. `testuser-0007`
    pub username: String,
    /// Tenant namespace, e.g. `testuser-0007-tenant`
    pub namespace: String,
    /// Application name, e.g. `testuser-0007-app`
    pub application: String,
    /// Component name, e.g. `testuser-0007-component`
    pub component: String,
}

impl UserNames {
    /// Derive the names for `ordinal` (1-based) owned by `worker`.
    pub fn derive(prefix: &str, worker: usize, users_per_thread: usize, ordinal: usize) -> Self {
        Self::for_index(prefix, worker * users_per_thread + ordinal)
    }

    /// Derive the names for a global user index.
    pub fn for_index(prefix: &str, index: usize) -> Self {
        let username = format!("{prefix}-{index:04}");
        Self {
            namespace: format!("{username}-{TENANT_NAMESPACE_SUFFIX}"),
            application: format!("{username}-app"),
            component: format!("{username}-component"),
            username,
        }
    }

    /// Image reference for this user's component.
    ///
    /// The tag carries a random suffix so repeated runs never collide.
    pub fn component_image(&self, quay_organization: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple();
        format!("quay.io/{quay_organization}/test-images:{}-{suffix}", self.username)
    }
}

/// Every username a run with the given shape provisions, in worker order.
pub fn all_usernames(prefix: &str, threads: usize, users_per_thread: usize) -> Vec<String> {
    (0..threads)
        .flat_map(|worker| {
            (1..=users_per_thread)
                .map(move |ordinal| UserNames::derive(prefix, worker, users_per_thread, ordinal))
        })
        .map(|names| names.username)
        .collect()
}
