//! Bounded reruns
//!
//! The initial attempt may run in parallel. After it fails, rerun fragments
//! are consolidated, the rerun profile is switched on and up to `max_reruns`
//! serial attempts follow, each over the targets recorded in the manifest.
//! The manifest is only trusted once this invocation has written it: either
//! fragments were merged into it or an earlier rerun ran with the rerun
//! profile. Otherwise the original targets are rerun.
//! The first passing rerun ends the loop even when budget remains.

use anyhow::Result;
use tracing::info;

use super::runner::AttemptRunner;
use crate::models::{AttemptRecord, InvocationOptions, Phase, TargetSet, TargetSource};
use crate::output::console;
use crate::rerun::{Consolidation, ManifestConsolidator};

/// Position of the rerun state machine.
///
/// Attempt 0 is the initial run; attempts `1..=max_reruns` are reruns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `attempt` is about to run
    Running { attempt: u32 },
    /// Attempt `attempt` passed; terminal
    Succeeded { attempt: u32 },
    /// Attempt `attempt` failed and budget remains
    Failed { attempt: u32 },
    /// The last allowed attempt failed; terminal
    Exhausted { attempts: u32 },
}

/// Transition rules of the rerun loop
#[derive(Clone, Debug)]
pub struct RetryMachine {
    max_reruns: u32,
    state: RetryState,
}

impl RetryMachine {
    pub fn new(max_reruns: u32) -> Self {
        Self {
            max_reruns,
            state: RetryState::Running { attempt: 0 },
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Phase of the attempt that is about to run
    pub fn phase(&self) -> Option<Phase> {
        match self.state {
            RetryState::Running { attempt: 0 } => Some(Phase::Initial),
            RetryState::Running { attempt } => Some(Phase::Rerun {
                index: attempt,
                of: self.max_reruns,
            }),
            _ => None,
        }
    }

    /// Record the result of the running attempt
    pub fn record(&mut self, passed: bool) -> RetryState {
        if let RetryState::Running { attempt } = self.state {
            self.state = if passed {
                RetryState::Succeeded { attempt }
            } else if attempt >= self.max_reruns {
                RetryState::Exhausted {
                    attempts: attempt + 1,
                }
            } else {
                RetryState::Failed { attempt }
            };
        }
        self.state
    }

    /// Move from a failed attempt to the next one; false when nothing is left
    pub fn advance(&mut self) -> bool {
        if let RetryState::Failed { attempt } = self.state {
            self.state = RetryState::Running {
                attempt: attempt + 1,
            };
            return true;
        }
        false
    }
}

/// What the main run and its reruns produced
#[derive(Clone, Debug)]
pub struct RetryOutcome {
    pub state: RetryState,
    pub records: Vec<AttemptRecord>,
    /// Options after all additions, handed on to the solo pass
    pub options: InvocationOptions,
}

impl RetryOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.state, RetryState::Succeeded { .. })
    }

    /// Phase of the final failed attempt, when retries ran out
    pub fn failed_phase(&self) -> Option<Phase> {
        if self.succeeded() {
            return None;
        }
        self.records.last().map(|r| r.phase)
    }
}

/// Drives the initial run and its reruns
pub struct RetryDriver<'a> {
    attempts: &'a AttemptRunner<'a>,
    consolidator: &'a ManifestConsolidator,
    max_reruns: u32,
    rerun_profile: String,
}

impl<'a> RetryDriver<'a> {
    pub fn new(
        attempts: &'a AttemptRunner<'a>,
        consolidator: &'a ManifestConsolidator,
        max_reruns: u32,
        rerun_profile: impl Into<String>,
    ) -> Self {
        Self {
            attempts,
            consolidator,
            max_reruns,
            rerun_profile: rerun_profile.into(),
        }
    }

    pub async fn drive(
        &self,
        targets: &TargetSet,
        options: InvocationOptions,
    ) -> Result<RetryOutcome> {
        let mut machine = RetryMachine::new(self.max_reruns);
        let mut options = options;
        let mut records = Vec::new();
        let mut manifest_fresh = false;

        while let Some(phase) = machine.phase() {
            let current = match phase {
                Phase::Rerun { index, of } => {
                    console::announce(&format!("Rerun #{index} of {of}"));
                    self.rerun_targets(targets, manifest_fresh)
                }
                _ => targets.clone(),
            };

            let force_serial = phase != Phase::Initial;
            let record = self
                .attempts
                .execute(phase, &current, &options, force_serial)
                .await?;
            let passed = record.passed;
            records.push(record);

            machine.record(passed);

            if phase == Phase::Initial {
                if !passed {
                    if let Consolidation::Merged { fragments, targets } =
                        self.consolidator.consolidate()
                    {
                        info!(
                            "Merged {} rerun fragment(s) into {} target(s)",
                            fragments, targets
                        );
                        manifest_fresh = true;
                    }
                    options.add_rerun_profile(&self.rerun_profile);
                }
            } else {
                manifest_fresh = true;
            }

            if !machine.advance() {
                break;
            }
        }

        Ok(RetryOutcome {
            state: machine.state(),
            records,
            options,
        })
    }

    /// Targets recorded in the manifest, or the original set when the manifest
    /// is stale or empty
    fn rerun_targets(&self, original: &TargetSet, manifest_fresh: bool) -> TargetSet {
        if !manifest_fresh {
            info!("No rerun manifest written by this run, rerunning the original targets");
            return original.clone();
        }

        let recorded = self.consolidator.manifest().read_targets();
        if recorded.is_empty() {
            info!("Rerun manifest is empty, rerunning the original targets");
            original.clone()
        } else {
            TargetSet::new(TargetSource::RerunManifest, recorded)
        }
    }
}
