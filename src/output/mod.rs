//! Console output
//!
//! Progress headlines, target listings and the final summary.

pub mod console;
