//! Test execution engine
//!
//! Strategy selection, command construction and the attempt loop: an
//! initial run, bounded serial reruns and the solo pass.

pub mod command;
pub mod orchestrator;
pub mod retry;
pub mod runner;
pub mod solo;
pub mod strategy;

pub use command::TestCommand;
pub use orchestrator::{Orchestrator, RunRequest};
pub use runner::ShellRunner;
pub use strategy::{Capabilities, HelperVersion};
