//! Error handling for the load generator
//!
//! This module provides the error types and user-friendly error reporting for
//! `tenant-loadgen`. The error system is designed around two principles:
//! 1. **Strongly-typed errors** for precise handling inside the library
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! Failures of an individual synthetic user (a secret that could not be created,
//! a build that timed out) are *not* represented here. Those are stage outcomes
//! recorded into the [`ErrorLedger`](crate::metrics::ErrorLedger) and the run
//! continues. [`LoadgenError`] covers the conditions that stop a run or a
//! command: invalid configuration, unreadable scenario files, failed report
//! writes, and collaborator errors surfaced to the caller.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tenant_loadgen::core::{LoadgenError, user_friendly_error};
//!
//! let error = LoadgenError::InvalidBatchSize { users_per_thread: 10, batch_size: 3 };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Prints the error with a suggestion
//! ```

use colored::Colorize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The main error type for load generator operations
///
/// # Error Categories
///
/// ## Configuration
/// - [`InvalidBatchSize`] - users per thread is not a multiple of the batch size
/// - [`InvalidConfig`] - any other rejected run parameter
/// - [`ScenarioParseError`] - the simulated platform scenario file is malformed
///
/// ## Collaborator
/// - [`Platform`] - a platform operation was rejected
/// - [`NotFound`] - a platform object does not exist (yet)
/// - [`PollTimeout`] - a bounded wait elapsed before its condition held
///
/// ## Runtime
/// - [`WorkerFailed`] - a worker pipeline task panicked or was cancelled
/// - [`ReportWriteError`] - the JSON report could not be written
/// - [`PurgeFailed`] - some synthetic users could not be deleted
/// - [`IoError`] - standard I/O errors from [`std::io::Error`]
///
/// [`InvalidBatchSize`]: LoadgenError::InvalidBatchSize
/// [`InvalidConfig`]: LoadgenError::InvalidConfig
/// [`ScenarioParseError`]: LoadgenError::ScenarioParseError
/// [`Platform`]: LoadgenError::Platform
/// [`NotFound`]: LoadgenError::NotFound
/// [`PollTimeout`]: LoadgenError::PollTimeout
/// [`WorkerFailed`]: LoadgenError::WorkerFailed
/// [`ReportWriteError`]: LoadgenError::ReportWriteError
/// [`PurgeFailed`]: LoadgenError::PurgeFailed
/// [`IoError`]: LoadgenError::IoError
#[derive(Error, Debug, Clone)]
pub enum LoadgenError {
    /// Users per thread is not divisible by the batch size
    ///
    /// A partial final cohort could never be checkpointed, so the run is
    /// rejected before any worker starts.
    #[error(
        "Please provide correct batches: {users_per_thread} users per thread is not a multiple of batch size {batch_size}"
    )]
    InvalidBatchSize {
        /// Configured users per thread
        users_per_thread: usize,
        /// Configured cohort size
        batch_size: usize,
    },

    /// A run parameter was rejected during validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the rejected parameter
        message: String,
    },

    /// The scenario file could not be parsed
    #[error("Failed to parse scenario file {file}: {reason}")]
    ScenarioParseError {
        /// Path of the scenario file
        file: String,
        /// Parser error message
        reason: String,
    },

    /// A platform operation was rejected by the collaborator
    #[error("{operation} failed: {message}")]
    Platform {
        /// The collaborator operation that failed (e.g. "create identity")
        operation: String,
        /// The collaborator's error message
        message: String,
    },

    /// A platform object does not exist
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Object kind (e.g. "namespace", "build run")
        kind: String,
        /// Object name
        name: String,
    },

    /// A bounded wait elapsed before its condition was satisfied
    #[error("timed out waiting for {what} after {timeout:?}")]
    PollTimeout {
        /// What was being waited for
        what: String,
        /// The configured timeout
        timeout: Duration,
    },

    /// A worker pipeline did not complete
    #[error("Worker {worker} did not complete: {reason}")]
    WorkerFailed {
        /// Worker identity
        worker: usize,
        /// Join error description
        reason: String,
    },

    /// The JSON report could not be written
    #[error("Failed to write report to {path}: {reason}")]
    ReportWriteError {
        /// Output path
        path: String,
        /// Underlying error message
        reason: String,
    },

    /// Deleting synthetic users failed for some of them
    #[error("Hit {errors} errors when purging resources")]
    PurgeFailed {
        /// Number of users that could not be deleted
        errors: usize,
    },

    /// I/O error
    #[error("IO error: {0}")]
    IoError(String),

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl From<std::io::Error> for LoadgenError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}

impl LoadgenError {
    /// Shorthand for a rejected collaborator operation.
    pub fn platform(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Platform {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Shorthand for a missing collaborator object.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Error wrapper carrying user-facing details and a suggestion
///
/// ```rust,no_run
/// use tenant_loadgen::core::{ErrorContext, LoadgenError};
///
/// let context = ErrorContext::new(LoadgenError::InvalidBatchSize {
///     users_per_thread: 7,
///     batch_size: 5,
/// })
/// .with_suggestion("Use a batch size that divides --users");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: LoadgenError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: LoadgenError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`LoadgenError`], [`std::io::Error`] and [`toml::de::Error`];
/// anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(loadgen_error) = error.downcast_ref::<LoadgenError>() {
        return create_error_context(loadgen_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(LoadgenError::IoError(io_error.to_string()))
                .with_suggestion("Check that the log and report paths are writable")
                .with_details("The load generator writes a log file and a JSON report in the working directory by default");
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(LoadgenError::ScenarioParseError {
            file: "scenario".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the scenario file");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(LoadgenError::Other { message })
}

fn create_error_context(error: LoadgenError) -> ErrorContext {
    match error {
        LoadgenError::InvalidBatchSize { users_per_thread, batch_size } => {
            ErrorContext::new(LoadgenError::InvalidBatchSize { users_per_thread, batch_size })
                .with_suggestion(format!(
                    "Choose a --batch value that divides --users ({users_per_thread}), for example 1 or {users_per_thread}"
                ))
                .with_details("Identities are checkpointed in cohorts of --batch users; a partial final cohort is not allowed")
        }
        e @ LoadgenError::InvalidConfig { .. } => {
            ErrorContext::new(e).with_suggestion("Run with --help to see the accepted values")
        }
        e @ LoadgenError::ScenarioParseError { .. } => ErrorContext::new(e)
            .with_suggestion("Check the TOML syntax and field names of the scenario file"),
        e @ LoadgenError::ReportWriteError { .. } => {
            ErrorContext::new(e).with_suggestion("Pass a writable location with --output")
        }
        e @ LoadgenError::WorkerFailed { .. } => ErrorContext::new(e)
            .with_details("A worker pipeline panicked; results for that worker are lost")
            .with_suggestion("Re-run with --verbose and inspect the log file"),
        e @ LoadgenError::PurgeFailed { .. } => ErrorContext::new(e)
            .with_suggestion("Inspect the log file for the failing users and run purge again"),
        e => ErrorContext::new(e),
    }
}
