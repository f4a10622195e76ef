//! Bounded condition polling.
//!
//! The platform only exposes pull-based status, so every asynchronous
//! completion (a namespace appearing, a gitops repository being pushed, a
//! build finishing) is observed by calling a probe at a fixed interval until
//! it reports done or a timeout elapses.
//!
//! The probe is first called one interval after polling starts. A probe error
//! counts as "not done yet" and never ends the loop on its own; only success
//! or the timeout does. The last probe error is kept in the timeout error for
//! diagnosis.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tenant_loadgen::poll::poll_until;
//!
//! # async fn example() -> Result<(), tenant_loadgen::poll::PollError> {
//! poll_until(Duration::from_millis(200), Duration::from_secs(60), || async {
//!     Ok::<bool, std::io::Error>(true)
//! })
//! .await
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::trace;

/// Interval and timeout of one bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Time between two probe calls
    pub interval: Duration,
    /// Maximum total wait
    pub timeout: Duration,
}

impl WaitPolicy {
    /// Create a wait policy.
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Polling ended without the condition being satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// The timeout elapsed first
    #[error("timed out waiting for the condition after {timeout:?}{}", describe_last_error(.last_error))]
    Timeout {
        /// The configured timeout
        timeout: Duration,
        /// Message of the most recent probe error, if any
        last_error: Option<String>,
    },
}

fn describe_last_error(last_error: &Option<String>) -> String {
    last_error.as_ref().map(|e| format!(" (last error: {e})")).unwrap_or_default()
}

/// Call `condition` every `interval` until it reports done or `timeout` elapses.
///
/// # Errors
///
/// Returns [`PollError::Timeout`] if `condition` has not returned `Ok(true)`
/// by the time `timeout` has elapsed.
pub async fn poll_until<F, Fut, E>(
    interval: Duration,
    timeout: Duration,
    mut condition: F,
) -> Result<(), PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    poll_for(interval, timeout, move || {
        let check = condition();
        async move { check.await.map(|done| done.then_some(())) }
    })
    .await
}

/// Like [`poll_until`], but the probe hands back a value once done.
///
/// # Errors
///
/// Returns [`PollError::Timeout`] if `probe` has not returned `Ok(Some(_))`
/// by the time `timeout` has elapsed.
pub async fn poll_for<T, F, Fut, E>(
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    let deadline = Instant::now() + timeout;
    let mut last_error = None;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(PollError::Timeout {
                timeout,
                last_error,
            });
        }
        sleep(interval.min(deadline - now)).await;

        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => {
                trace!("Poll condition not met yet: {e}");
                last_error = Some(e.to_string());
            }
        }
    }
}
