//! Live progress counters.
//!
//! Each stage has one [`StageProgress`] shared by the matching stage task of
//! every worker. Counters are monotonic atomics and can be read at any time
//! for display; they are not the source of the final report, which comes
//! from the worker tallies.

use crate::utils::progress::{MultiProgress, ProgressBar};
use std::sync::atomic::{AtomicU64, Ordering};

/// Attempted and failed counts for one stage, optionally drawn as a bar.
pub struct StageProgress {
    label: &'static str,
    total: u64,
    attempted: AtomicU64,
    failed: AtomicU64,
    bar: ProgressBar,
}

impl StageProgress {
    fn new(label: &'static str, total: u64, bar: ProgressBar) -> Self {
        let progress = Self {
            label,
            total,
            attempted: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            bar,
        };
        progress.redraw(0, 0);
        progress
    }

    /// Count one processed user.
    pub fn record(&self, failed: bool) {
        let attempted = self.attempted.fetch_add(1, Ordering::Relaxed) + 1;
        let failures = if failed {
            self.failed.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.failed.load(Ordering::Relaxed)
        };
        self.redraw(attempted, failures);
    }

    /// Users processed so far.
    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Relaxed)
    }

    /// Failures so far.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn redraw(&self, attempted: u64, failed: u64) {
        self.bar.set_position(attempted);
        self.bar.set_message(format!("{} ({attempted}/{}) [{failed} failed]", self.label, self.total));
    }

    fn finish(&self) {
        self.bar.finish_with_message(format!(
            "{} ({}/{}) [{} failed]",
            self.label,
            self.attempted(),
            self.total,
            self.failed()
        ));
    }
}

/// Progress of the three stages of a run.
pub struct RunProgress {
    /// Stage 1
    pub identities: StageProgress,
    /// Stage 2
    pub resources: StageProgress,
    /// Stage 3
    pub builds: StageProgress,
    _multi: Option<MultiProgress>,
}

impl RunProgress {
    /// Progress for `total` users, drawn as three stacked bars.
    pub fn with_display(total: u64) -> Self {
        let multi = MultiProgress::new();
        let identities = multi.add_bar(total);
        let resources = multi.add_bar(total);
        let builds = multi.add_bar(total);
        Self {
            identities: StageProgress::new("Creating AppStudio Users", total, identities),
            resources: StageProgress::new("Creating AppStudio User Resources", total, resources),
            builds: StageProgress::new("Waiting for pipelines to finish", total, builds),
            _multi: Some(multi),
        }
    }

    /// Progress for `total` users that is counted but never drawn.
    pub fn hidden(total: u64) -> Self {
        Self {
            identities: StageProgress::new("Creating AppStudio Users", total, ProgressBar::hidden()),
            resources: StageProgress::new(
                "Creating AppStudio User Resources",
                total,
                ProgressBar::hidden(),
            ),
            builds: StageProgress::new("Waiting for pipelines to finish", total, ProgressBar::hidden()),
            _multi: None,
        }
    }

    /// Freeze every bar with its final counts.
    pub fn finish(&self) {
        self.identities.finish();
        self.resources.finish();
        self.builds.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progress_counts() {
        let progress = RunProgress::hidden(4);
        progress.identities.record(false);
        progress.identities.record(true);
        progress.identities.record(false);

        assert_eq!(progress.identities.attempted(), 3);
        assert_eq!(progress.identities.failed(), 1);
        assert_eq!(progress.resources.attempted(), 0);
        progress.finish();
    }

    #[test]
    fn test_stage_progress_from_many_threads() {
        let progress = std::sync::Arc::new(RunProgress::hidden(400));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let progress = std::sync::Arc::clone(&progress);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        progress.builds.record(i % 10 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(progress.builds.attempted(), 400);
        assert_eq!(progress.builds.failed(), 40);
    }
}
