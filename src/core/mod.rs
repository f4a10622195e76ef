//! Core types for the load generator
//!
//! - [`LoadgenError`] - enumerated error types for every run-stopping failure
//! - [`ErrorContext`] - user-friendly wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any error into an [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, LoadgenError, user_friendly_error};
