//! Integration test suite for tenant-loadgen
//!
//! End-to-end runs against the simulated platform, through the library API
//! and through the compiled binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scenarios**: complete runs with selected failures
//! - **cohorts**: batch gating and cohort atomicity
//! - **invariants**: counting invariants over many run shapes
//! - **cli_run**: the `run` command, its report and exit codes
//! - **cli_purge**: the `purge` command and `run --purge`

#[path = "../common/mod.rs"]
mod common;

mod cli_purge;
mod cli_run;
mod cohorts;
mod invariants;
mod scenarios;
