//! Solo pass
//!
//! Scenarios tagged with the solo marker cannot share the environment with
//! other workers. After the main run they get one serial invocation of their
//! own, filtered by tag.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use super::runner::AttemptRunner;
use crate::models::{AttemptRecord, InvocationOptions, Phase, SoloOutcome, TargetSet};
use crate::output::console;
use crate::selection::FeatureSource;

/// Runs solo-tagged scenarios serially
pub struct SoloPass<'a> {
    attempts: &'a AttemptRunner<'a>,
    source: &'a dyn FeatureSource,
    workdir: PathBuf,
    features_dir: PathBuf,
    tag: String,
}

impl<'a> SoloPass<'a> {
    pub fn new(
        attempts: &'a AttemptRunner<'a>,
        source: &'a dyn FeatureSource,
        workdir: impl Into<PathBuf>,
        features_dir: impl Into<PathBuf>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            attempts,
            source,
            workdir: workdir.into(),
            features_dir: features_dir.into(),
            tag: tag.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Run the solo pass over the originally resolved targets.
    ///
    /// `options` are the options accumulated by the main run; the tag filter
    /// is added on top of them.
    pub async fn run(
        &self,
        targets: &TargetSet,
        options: &InvocationOptions,
    ) -> Result<(SoloOutcome, Option<AttemptRecord>)> {
        if targets.has_line_scoped() {
            debug!("Skipping {} pass for line-scoped targets", self.tag);
            return Ok((
                SoloOutcome::Skipped("targets name line numbers".to_string()),
                None,
            ));
        }

        let tagged = self
            .source
            .files_containing(&self.tag, &self.search_paths(targets))
            .await
            .with_context(|| format!("Failed to search for {} scenarios", self.tag))?;

        if tagged.is_empty() {
            debug!("No {} scenarios among the targets", self.tag);
            return Ok((SoloOutcome::NotNeeded, None));
        }

        info!("{} file(s) contain {} scenarios", tagged.len(), self.tag);
        console::announce(&format!("Running {} features", self.tag));

        let mut options = options.clone();
        options.add_tag_filter(&self.tag);

        let record = self
            .attempts
            .execute(Phase::Solo, targets, &options, true)
            .await?;

        let outcome = if record.passed {
            SoloOutcome::Passed
        } else {
            SoloOutcome::Failed
        };
        Ok((outcome, Some(record)))
    }

    /// Targets to search, or the features directory for the whole suite
    fn search_paths(&self, targets: &TargetSet) -> Vec<PathBuf> {
        if targets.is_empty() {
            vec![self.workdir.join(&self.features_dir)]
        } else {
            targets
                .iter()
                .map(|t| self.workdir.join(t.path()))
                .collect()
        }
    }
}
