//! Command-line interface for the load generator.
//!
//! # Available Commands
//!
//! - `run` - provision synthetic users, create their resources, optionally
//!   observe their builds, then report
//! - `purge` - delete every synthetic user a run with the same shape creates
//!
//! # Usage
//!
//! ```bash
//! # 2 workers x 4 users, cohorts of 2, waiting for builds
//! tenant-loadgen run -t 2 -u 4 -b 2 -w
//!
//! # Simulated platform behavior from a scenario file, report elsewhere
//! tenant-loadgen run --scenario slow-builds.toml --output results.json
//!
//! # Clean up afterwards
//! tenant-loadgen purge -t 2 -u 4
//! ```
//!
//! # Global Options
//!
//! - `--verbose` - log at `debug` instead of `info`
//! - `--no-progress` - hide progress bars (sets `LOADGEN_NO_PROGRESS`)
//! - `--log-file` - log destination, `load-tests.log` by default
//! - `--log-to-console` - also log to stderr

mod purge;
mod run;

pub use purge::PurgeCommand;
pub use run::RunCommand;

use crate::config::Scenario;
use crate::constants::{DEFAULT_LOG_FILE, NO_PROGRESS_ENV};
use crate::utils::{LogSettings, init_logging};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Process-level settings derived from the global flags.
///
/// ```rust,no_run
/// use tenant_loadgen::cli::CliConfig;
///
/// let config = CliConfig {
///     no_progress: true,
///     ..CliConfig::default()
/// };
/// config.apply_to_env();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Whether to hide progress bars.
    ///
    /// When `true`, sets `LOADGEN_NO_PROGRESS` so every bar is created hidden.
    pub no_progress: bool,
}

impl CliConfig {
    /// Apply this configuration to the process environment.
    ///
    /// Must be called before the async runtime starts any thread.
    pub fn apply_to_env(&self) {
        if self.no_progress {
            // SAFETY: called from `main` before the runtime is built, while
            // the process is still single-threaded.
            unsafe { std::env::set_var(NO_PROGRESS_ENV, "1") };
        }
    }
}

/// Load generator for multi-tenant build platforms.
#[derive(Parser, Debug)]
#[command(
    name = "tenant-loadgen",
    about = "Generate synthetic tenants and measure provisioning and build latency",
    version,
    long_about = "Provisions synthetic users in cohorts across concurrent workers, creates their \
                  workload resources, optionally waits for their build pipelines, and reports \
                  average durations, failure rates and every error class encountered."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level.
    ///
    /// Ignored when `RUST_LOG` is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable progress bars.
    #[arg(long, global = true)]
    no_progress: bool,

    /// File the log is written to; truncated at startup.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Also write the log to stderr.
    #[arg(short = 'l', long, global = true)]
    log_to_console: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a load test.
    ///
    /// See [`RunCommand`] for options.
    Run(RunCommand),

    /// Delete the synthetic users of a run.
    ///
    /// See [`PurgeCommand`] for options.
    Purge(PurgeCommand),
}

impl Cli {
    /// Settings to apply before the runtime starts.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        CliConfig {
            no_progress: self.no_progress,
        }
    }

    /// Logging settings from the global flags.
    #[must_use]
    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            log_file: self.log_file.clone(),
            to_console: self.log_to_console,
            verbose: self.verbose,
        }
    }

    /// Initialize logging and run the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's error, or a logging setup error.
    pub async fn execute(self) -> Result<()> {
        init_logging(&self.log_settings())?;
        match self.command {
            Commands::Run(cmd) => cmd.execute().await,
            Commands::Purge(cmd) => cmd.execute().await,
        }
    }
}

/// Load the scenario file if one was given, the default scenario otherwise.
async fn load_scenario(path: Option<&Path>) -> Result<Scenario> {
    match path {
        Some(path) => Scenario::load(path)
            .await
            .with_context(|| format!("Failed to load scenario {}", path.display())),
        None => Ok(Scenario::default()),
    }
}
