//! Utility functions
//!
//! Common utilities used across modules.

pub mod logger;

pub use logger::{init_logger, LogLevel};
