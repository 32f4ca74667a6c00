//! Run outcome models
//!
//! Records what each attempt did and how the whole invocation ended.

use std::fmt;

use crate::error::RunnerError;

/// Which pass of the invocation an attempt belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The first run, parallel when eligible
    Initial,
    /// A serial rerun after a failure, 1-indexed
    Rerun { index: u32, of: u32 },
    /// The serial pass over solo-tagged scenarios
    Solo,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initial => write!(f, "initial run"),
            Phase::Rerun { index, of } => write!(f, "rerun #{index} of {of}"),
            Phase::Solo => write!(f, "solo run"),
        }
    }
}

/// Record of a single engine invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    pub phase: Phase,
    pub parallel: bool,
    pub passed: bool,
}

impl AttemptRecord {
    pub fn symbol(&self) -> &'static str {
        if self.passed {
            "✓"
        } else {
            "✗"
        }
    }
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.symbol(),
            self.phase,
            if self.parallel { "parallel" } else { "serial" }
        )
    }
}

/// How the solo pass ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SoloOutcome {
    /// Deliberately not run; carries the reason
    Skipped(String),
    /// No target uses the solo tag
    NotNeeded,
    Passed,
    Failed,
}

impl SoloOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SoloOutcome::Failed)
    }
}

impl fmt::Display for SoloOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoloOutcome::Skipped(reason) => write!(f, "○ skipped ({reason})"),
            SoloOutcome::NotNeeded => write!(f, "○ no tagged scenarios"),
            SoloOutcome::Passed => write!(f, "✓ passed"),
            SoloOutcome::Failed => write!(f, "✗ failed"),
        }
    }
}

/// Result of a full invocation: main run, reruns and the solo pass
#[derive(Clone, Debug)]
pub struct SuiteReport {
    pub attempts: Vec<AttemptRecord>,
    /// Phase of the last failed main attempt when retries were exhausted
    pub failed_phase: Option<Phase>,
    pub solo: SoloOutcome,
    pub solo_tag: String,
}

impl SuiteReport {
    pub fn main_passed(&self) -> bool {
        self.failed_phase.is_none()
    }

    pub fn is_success(&self) -> bool {
        self.main_passed() && !self.solo.is_failure()
    }

    /// Collapse the report into the invocation's exit status
    pub fn into_result(self) -> Result<Self, RunnerError> {
        if let Some(phase) = self.failed_phase {
            return Err(RunnerError::FeaturesFailed { phase });
        }
        if self.solo.is_failure() {
            return Err(RunnerError::SoloFailed { tag: self.solo_tag });
        }
        Ok(self)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run summary")?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for attempt in &self.attempts {
            writeln!(f, "  {attempt}")?;
        }
        writeln!(f, "  {} pass: {}", self.solo_tag, self.solo)?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}
