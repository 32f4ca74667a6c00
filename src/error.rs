//! Fatal runner errors
//!
//! Everything else is plumbing and travels as `anyhow::Error`.

use thiserror::Error;

use crate::models::Phase;

/// Conditions that end an invocation with a failing exit status
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Features failed ({phase})")]
    FeaturesFailed { phase: Phase },

    #[error("{tag} features failed")]
    SoloFailed { tag: String },

    #[error("Bundle install failed, not running features")]
    InstallFailed,
}
