//! tenant-loadgen - load generator for multi-tenant build platforms
//!
//! Provisions synthetic tenants against a platform and measures latency and
//! failure rates of three pipeline stages: identity creation, workload
//! resource creation, and build pipeline execution.
//!
//! # Architecture Overview
//!
//! A run is a fixed number of independent workers. Each worker owns a range
//! of user ordinals and runs three concurrent stage tasks connected by
//! bounded queues:
//!
//! ```text
//!              +-------------------+   queue   +---------------------+   queue   +----------------+
//! worker k --> | provision         | --------> | provision           | --------> | observe        |
//!              | identities        |           | resources           |           | builds         |
//!              | (cohorts of B)    |           | (secret, app, comp) |           | (optional)     |
//!              +-------------------+           +---------------------+           +----------------+
//!                        \                               |                              /
//!                         +------------> ErrorLedger (one mutex) <---------------------+
//! ```
//!
//! Identities are released downstream in cohorts: a cohort of `B` users is
//! forwarded only after every member's namespace is ready. Every user failure
//! is recorded in the [`ErrorLedger`](metrics::ErrorLedger) under one of nine
//! stable error codes and the worker moves on. Durations and failure counts
//! are kept per worker and merged into a
//! [`RunAggregate`](metrics::RunAggregate) after all workers join.
//!
//! # Core Modules
//!
//! - [`orchestrator`] - validation, worker spawning, join and aggregation
//! - [`pipeline`] - the three stages and the cohort [`BatchGate`](pipeline::BatchGate)
//! - [`metrics`] - error codes, the ledger, tallies and progress counters
//! - [`poll`] - bounded interval polling
//! - [`platform`] - the collaborator trait, a simulated platform and a retry decorator
//!
//! # Supporting Modules
//!
//! - [`cli`] - `run` and `purge` commands
//! - [`config`] - run configuration and simulated platform scenarios
//! - [`core`] - error types and user-facing error reporting
//! - [`naming`] - username and resource name derivation
//! - [`purge`] - deletion of synthetic users
//! - [`report`] - JSON report and result summary
//! - [`utils`] - logging and progress bar setup
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenant_loadgen::config::{RunConfig, Scenario};
//! use tenant_loadgen::orchestrator::run_load_test;
//! use tenant_loadgen::platform::SimulatedPlatform;
//!
//! # async fn example() -> Result<(), tenant_loadgen::core::LoadgenError> {
//! let platform = Arc::new(SimulatedPlatform::new(Scenario::default()));
//! let config = RunConfig::new(2, 4, 2).with_wait_for_builds(true);
//! let aggregate = run_load_test(config, platform).await?;
//! println!("{} failures out of {} users", aggregate.total_failures(), aggregate.total_users);
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod platform;
pub mod poll;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod naming;
pub mod purge;
pub mod report;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
