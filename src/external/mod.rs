//! External collaborators
//!
//! git, bundler and the filesystem, behind the traits the executor and the
//! resolver depend on.

pub mod bundler;
pub mod git;
pub mod search;

pub use bundler::Bundler;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::RunnerConfig;
use crate::selection::FeatureSource;

/// Feature source backed by the real working tree
pub struct WorkspaceSource {
    workdir: PathBuf,
    features_dir: PathBuf,
    extension: String,
}

impl WorkspaceSource {
    pub fn new(workdir: impl Into<PathBuf>, config: &RunnerConfig) -> Self {
        Self {
            workdir: workdir.into(),
            features_dir: config.features_dir.clone(),
            extension: config.feature_extension.clone(),
        }
    }
}

#[async_trait]
impl FeatureSource for WorkspaceSource {
    async fn modified_feature_files(&self) -> Result<Vec<String>> {
        git::modified_files(&self.workdir, &self.extension).await
    }

    async fn search_feature_files(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = search::literal(pattern, true)
            .with_context(|| format!("Invalid search pattern '{pattern}'"))?;
        let root = self.workdir.join(&self.features_dir);
        Ok(search::files_matching(
            &self.workdir,
            &[root],
            &matcher,
            &self.extension,
        ))
    }

    async fn files_containing(&self, marker: &str, paths: &[PathBuf]) -> Result<Vec<String>> {
        let matcher = search::literal(marker, false)
            .with_context(|| format!("Invalid marker '{marker}'"))?;
        Ok(search::files_matching(
            &self.workdir,
            paths,
            &matcher,
            &self.extension,
        ))
    }
}
