//! Data models for feature runs
//!
//! Targets, pass-through options and run outcomes shared by every stage.

mod options;
mod outcome;
mod target;

pub use options::InvocationOptions;
pub use outcome::{AttemptRecord, Phase, SoloOutcome, SuiteReport};
pub use target::{TargetSet, TargetSource};
