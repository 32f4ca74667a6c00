//! Fakes for the process and filesystem seams

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::executor::runner::CommandRunner;
use crate::executor::TestCommand;
use crate::selection::FeatureSource;

/// Feature source with canned answers
#[derive(Default)]
pub struct FakeSource {
    /// Returned by `modified_feature_files`
    pub modified: Vec<String>,
    /// Returned by `search_feature_files`
    pub matches: Vec<String>,
    /// Returned by `files_containing`
    pub solo: Vec<String>,
    /// Patterns and markers searched for
    pub searched: Mutex<Vec<String>>,
}

impl FakeSource {
    /// Every pattern or marker searched for, in order
    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeatureSource for FakeSource {
    async fn modified_feature_files(&self) -> Result<Vec<String>> {
        Ok(self.modified.clone())
    }

    async fn search_feature_files(&self, pattern: &str) -> Result<Vec<String>> {
        self.searched.lock().unwrap().push(pattern.to_string());
        Ok(self.matches.clone())
    }

    async fn files_containing(&self, marker: &str, _paths: &[PathBuf]) -> Result<Vec<String>> {
        self.searched.lock().unwrap().push(marker.to_string());
        Ok(self.solo.clone())
    }
}

/// Command runner that records command lines and replays scripted results.
///
/// Once the script runs out every command passes.
#[derive(Default)]
pub struct FakeRunner {
    script: Mutex<VecDeque<bool>>,
    lines: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn scripted(results: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &TestCommand) -> Result<bool> {
        self.lines.lock().unwrap().push(command.to_shell_line());
        Ok(self.script.lock().unwrap().pop_front().unwrap_or(true))
    }
}
