//! Progress indicators and user interface utilities
//!
//! Thin wrappers over `indicatif` with one consistent look for every
//! load-test display. All indicators are hidden when the
//! `LOADGEN_NO_PROGRESS` environment variable is set, which keeps CI logs and
//! piped output clean.
//!
//! # Examples
//!
//! ```rust
//! use tenant_loadgen::utils::progress::MultiProgress;
//!
//! let multi = MultiProgress::new();
//! let users = multi.add_bar(10);
//! users.set_message("Creating users (0/10) [0 failed]");
//! users.set_position(1);
//! users.finish_with_message("Users created");
//! ```

use crate::constants::NO_PROGRESS_ENV;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// Checks if progress bars should be disabled.
///
/// Progress bars are disabled when `LOADGEN_NO_PROGRESS` is set to any value.
pub fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

/// A progress bar with consistent styling.
///
/// Cloning is cheap; clones drive the same bar, so a bar can be shared
/// between the stage tasks of every worker.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a new progress bar with a specified total length.
    ///
    /// Returns a hidden bar when progress display is disabled.
    pub fn new(len: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        };
        Self { inner: bar }
    }

    /// Creates a bar that never draws anything.
    pub fn hidden() -> Self {
        Self { inner: IndicatifBar::hidden() }
    }

    /// Sets the message displayed in front of the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Moves the bar to an absolute position.
    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    /// Finishes the bar, leaving `msg` on screen.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }
}

/// A container stacking several progress bars vertically.
pub struct MultiProgress {
    inner: indicatif::MultiProgress,
}

impl MultiProgress {
    /// Creates a new, empty multi-progress container.
    pub fn new() -> Self {
        Self {
            inner: indicatif::MultiProgress::new(),
        }
    }

    /// Adds an existing progress bar to the container.
    pub fn add(&self, pb: ProgressBar) -> ProgressBar {
        ProgressBar {
            inner: self.inner.add(pb.inner),
        }
    }

    /// Creates and adds a new progress bar of length `len`.
    pub fn add_bar(&self, len: u64) -> ProgressBar {
        self.add(ProgressBar::new(len))
    }
}

impl Default for MultiProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{msg:<52} [{bar:40.cyan/blue}] {percent:>3}% ({elapsed_precise})")
        .expect("valid progress template")
        .progress_chars("━╸━")
}
