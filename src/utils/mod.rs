//! Supporting utilities
//!
//! - [`logging`] - tracing subscriber setup (log file and optional console)
//! - [`progress`] - progress bars and spinners for long-running operations

pub mod logging;
pub mod progress;

pub use logging::{LogSettings, init_logging};
pub use progress::{MultiProgress, ProgressBar};
