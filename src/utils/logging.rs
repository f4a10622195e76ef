//! Logging setup
//!
//! Every run writes its log to a file. Console output is opt-in because the
//! progress bars own the terminal during a run. The level comes from
//! `RUST_LOG` when set, otherwise `info` (or `debug` with `--verbose`).

use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Log file, truncated at startup
    pub log_file: PathBuf,
    /// Also log to stderr
    pub to_console: bool,
    /// Default to `debug` instead of `info`
    pub verbose: bool,
}

impl LogSettings {
    fn filter(&self) -> EnvFilter {
        if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if self.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Fails if the log file cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let file = File::create(&settings.log_file).with_context(|| {
        format!("Error creating log file: {}", settings.log_file.display())
    })?;

    let file_layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).with_target(false);
    let console_layer = settings
        .to_console
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    tracing_subscriber::registry()
        .with(settings.filter())
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
