//! Feature targets
//!
//! A target is a feature file path, optionally followed by one or more
//! `:LINE` suffixes that scope the run to individual scenarios.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single feature file (or file:line reference) handed to the engine
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File part of the reference, without line suffixes
    pub fn path(&self) -> &str {
        self.split_lines().unwrap_or(&self.0)
    }

    /// Whether the target points at specific scenarios rather than a whole file
    pub fn is_line_scoped(&self) -> bool {
        self.split_lines().is_some()
    }

    /// File part when every `:` suffix is a run of digits
    fn split_lines(&self) -> Option<&str> {
        let (path, suffix) = self.0.split_once(':')?;
        let numeric = suffix
            .split(':')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));

        (!path.is_empty() && numeric).then_some(path)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Target {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Where a target set came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetSource {
    /// Literal arguments given on the command line
    CommandLine,
    /// Feature files changed in the working tree
    Modified,
    /// Feature files containing a search string
    Containing(String),
    /// Targets recorded as failing by a previous attempt
    RerunManifest,
    /// Nothing selected; the engine runs the whole suite
    WholeSuite,
}

impl fmt::Display for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSource::CommandLine => write!(f, "command line"),
            TargetSource::Modified => write!(f, "modified files"),
            TargetSource::Containing(pattern) => write!(f, "search for '{pattern}'"),
            TargetSource::RerunManifest => write!(f, "rerun manifest"),
            TargetSource::WholeSuite => write!(f, "whole suite"),
        }
    }
}

/// Ordered, duplicate-free set of targets for one run attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetSet {
    targets: Vec<Target>,
    source: TargetSource,
}

impl TargetSet {
    /// Build a set, dropping duplicates while keeping first-seen order
    pub fn new<I, T>(source: TargetSource, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        let mut seen = HashSet::new();
        let targets = targets
            .into_iter()
            .map(Into::into)
            .filter(|t: &Target| seen.insert(t.clone()))
            .collect::<Vec<_>>();

        let source = if targets.is_empty() {
            TargetSource::WholeSuite
        } else {
            source
        };

        Self { targets, source }
    }

    /// The empty set, meaning "run everything"
    pub fn whole_suite() -> Self {
        Self {
            targets: Vec::new(),
            source: TargetSource::WholeSuite,
        }
    }

    pub fn source(&self) -> &TargetSource {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// True when any target names specific line numbers
    pub fn has_line_scoped(&self) -> bool {
        self.targets.iter().any(Target::is_line_scoped)
    }
}
