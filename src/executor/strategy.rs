//! Execution strategy selection
//!
//! Decides per attempt whether targets go to the worker-pool helper or
//! straight to the engine.

use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

use crate::config::RunnerConfig;
use crate::models::{InvocationOptions, TargetSet};

/// Dotted numeric version of the worker-pool helper
#[derive(Clone, Debug)]
pub struct HelperVersion {
    raw: String,
    parts: Vec<u64>,
}

impl HelperVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let parts = raw
            .split('.')
            .map(|p| p.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            raw: raw.to_string(),
            parts,
        })
    }
}

impl Ord for HelperVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for HelperVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HelperVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HelperVersion {}

impl fmt::Display for HelperVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Type discriminator passed to the helper with `-t`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelperKind {
    /// Helpers newer than the legacy threshold
    Cucumber,
    /// Legacy helpers
    Features,
}

impl HelperKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            HelperKind::Cucumber => "cucumber",
            HelperKind::Features => "features",
        }
    }

    /// Pick the keyword a given helper version understands
    pub fn for_version(version: &HelperVersion, legacy_max: &HelperVersion) -> Self {
        if version > legacy_max {
            HelperKind::Cucumber
        } else {
            HelperKind::Features
        }
    }
}

/// Environment capabilities, probed once per invocation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Worker-pool helper version; `None` when absent or undiscoverable
    pub helper: Option<HelperVersion>,
    /// The enhanced progress formatter gem is declared
    pub spinner: bool,
    /// Commands run through `bundle exec`
    pub bundle_exec: bool,
}

/// Why an attempt runs serially
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerialReason {
    Forced,
    HelperUnavailable,
    LineScopedTargets,
    SingleTarget,
}

impl fmt::Display for SerialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialReason::Forced => write!(f, "serial run requested"),
            SerialReason::HelperUnavailable => write!(f, "parallel helper not available"),
            SerialReason::LineScopedTargets => write!(f, "targets name line numbers"),
            SerialReason::SingleTarget => write!(f, "single target"),
        }
    }
}

/// How an attempt is executed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Shard targets across helper workers
    Parallel { kind: HelperKind },
    /// Run the engine directly; `formatter` is `None` when the caller chose one
    Serial { formatter: Option<String> },
}

impl ExecutionStrategy {
    pub fn is_parallel(&self) -> bool {
        matches!(self, ExecutionStrategy::Parallel { .. })
    }
}

/// Chooses between parallel and serial execution
pub struct StrategySelector {
    capabilities: Capabilities,
    legacy_max: HelperVersion,
    spinner_formatter: String,
    fallback_formatter: String,
}

impl StrategySelector {
    pub fn new(capabilities: Capabilities, config: &RunnerConfig) -> Self {
        let legacy_max = HelperVersion::parse(&config.parallel.legacy_max_version)
            .unwrap_or(HelperVersion {
                raw: "0.7.0".to_string(),
                parts: vec![0, 7, 0],
            });

        Self {
            capabilities,
            legacy_max,
            spinner_formatter: config.engine.spinner_formatter.clone(),
            fallback_formatter: config.engine.fallback_formatter.clone(),
        }
    }

    /// Helper keyword when `targets` may be sharded, otherwise the reason they may not
    pub fn parallel_eligibility(
        &self,
        targets: &TargetSet,
        force_serial: bool,
    ) -> Result<HelperKind, SerialReason> {
        if force_serial {
            return Err(SerialReason::Forced);
        }
        let version = self
            .capabilities
            .helper
            .as_ref()
            .ok_or(SerialReason::HelperUnavailable)?;
        if targets.has_line_scoped() {
            return Err(SerialReason::LineScopedTargets);
        }
        if targets.len() == 1 {
            return Err(SerialReason::SingleTarget);
        }
        Ok(HelperKind::for_version(version, &self.legacy_max))
    }

    /// Strategy for one attempt
    pub fn select(
        &self,
        targets: &TargetSet,
        options: &InvocationOptions,
        force_serial: bool,
    ) -> ExecutionStrategy {
        match self.parallel_eligibility(targets, force_serial) {
            Ok(kind) => ExecutionStrategy::Parallel { kind },
            Err(reason) => {
                debug!("Running serially: {}", reason);
                ExecutionStrategy::Serial {
                    formatter: self.serial_formatter(options),
                }
            }
        }
    }

    fn serial_formatter(&self, options: &InvocationOptions) -> Option<String> {
        if options.has_format() {
            None
        } else if self.capabilities.spinner {
            Some(self.spinner_formatter.clone())
        } else {
            Some(self.fallback_formatter.clone())
        }
    }
}
