//! Run orchestration
//!
//! One invocation: resolve targets, run them with reruns, then the solo pass.
//! The solo pass runs whatever the main run did; the main failure takes
//! precedence when the report is turned into an exit status.

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use super::command::CommandBuilder;
use super::retry::RetryDriver;
use super::runner::{AttemptRunner, CommandRunner};
use super::solo::SoloPass;
use super::strategy::{Capabilities, StrategySelector};
use crate::config::RunnerConfig;
use crate::models::{SoloOutcome, SuiteReport};
use crate::output::console;
use crate::rerun::ManifestConsolidator;
use crate::selection::{FeatureSource, SelectionRequest, TargetResolver};

/// Per-invocation input
#[derive(Clone, Debug, Default)]
pub struct RunRequest {
    pub selection: SelectionRequest,
    /// Add `--format pretty --backtrace`
    pub debug: bool,
    /// Overrides the configured rerun budget
    pub max_reruns: Option<u32>,
}

/// Wires the resolver, the retry driver and the solo pass together
pub struct Orchestrator<'a> {
    config: &'a RunnerConfig,
    workdir: PathBuf,
    source: &'a dyn FeatureSource,
    runner: &'a dyn CommandRunner,
    capabilities: Capabilities,
    verbose: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a RunnerConfig,
        workdir: impl Into<PathBuf>,
        source: &'a dyn FeatureSource,
        runner: &'a dyn CommandRunner,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            config,
            workdir: workdir.into(),
            source,
            runner,
            capabilities,
            verbose: false,
        }
    }

    /// Echo every command before it runs
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub async fn run(&self, request: &RunRequest) -> Result<SuiteReport> {
        let resolver = TargetResolver::new(
            &self.workdir,
            &self.config.feature_extension,
            self.source,
        );
        let resolution = resolver.resolve(&request.selection).await?;
        let targets = resolution.targets;
        let mut options = resolution.options;

        if request.debug {
            options.add_debug_formatting();
        }

        let max_reruns = request.max_reruns.unwrap_or(self.config.max_reruns);
        info!(
            "Running {} target(s) from {} with up to {} rerun(s)",
            targets.len(),
            targets.source(),
            max_reruns
        );

        let attempts = AttemptRunner::new(
            StrategySelector::new(self.capabilities.clone(), self.config),
            CommandBuilder::new(self.config, &self.capabilities),
            self.runner,
            self.verbose,
        );
        let consolidator = ManifestConsolidator::new(
            &self.workdir,
            self.config.rerun.fragment_glob.clone(),
            &self.config.rerun.manifest,
        );

        console::announce("Running features");
        let driver = RetryDriver::new(
            &attempts,
            &consolidator,
            max_reruns,
            self.config.rerun.profile.clone(),
        );
        let outcome = driver.drive(&targets, options).await?;

        let solo = SoloPass::new(
            &attempts,
            self.source,
            &self.workdir,
            &self.config.features_dir,
            self.config.solo_tag.clone(),
        );
        let (solo_outcome, solo_record) = solo.run(&targets, &outcome.options).await?;
        if self.verbose {
            if let SoloOutcome::Skipped(reason) = &solo_outcome {
                console::note(&format!("Skipping {} features: {}", solo.tag(), reason));
            }
        }

        let failed_phase = outcome.failed_phase();
        let mut records = outcome.records;
        records.extend(solo_record);

        Ok(SuiteReport {
            attempts: records,
            failed_phase,
            solo: solo_outcome,
            solo_tag: self.config.solo_tag.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use crate::executor::strategy::HelperVersion;
    use crate::models::Phase;
    use crate::test_utils::{FakeRunner, FakeSource};
    use std::fs;
    use tempfile::tempdir;

    fn config() -> RunnerConfig {
        RunnerConfig {
            browser_path: Some(PathBuf::from("/opt/ff")),
            ..Default::default()
        }
    }

    fn parallel_capabilities() -> Capabilities {
        Capabilities {
            helper: HelperVersion::parse("2.0.0"),
            spinner: false,
            bundle_exec: true,
        }
    }

    fn request(args: &[&str], max_reruns: Option<u32>) -> RunRequest {
        RunRequest {
            selection: SelectionRequest {
                args: args.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            debug: false,
            max_reruns,
        }
    }

    #[tokio::test]
    async fn test_passing_whole_suite_runs_once_in_parallel() {
        let dir = tempdir().unwrap();
        let config = config();
        let source = FakeSource::default();
        let runner = FakeRunner::scripted([true]);
        let orchestrator =
            Orchestrator::new(&config, dir.path(), &source, &runner, parallel_capabilities());

        let report = orchestrator.run(&request(&[], Some(2))).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.solo, SoloOutcome::NotNeeded);
        assert_eq!(
            runner.lines(),
            vec!["PATH=/opt/ff:$PATH bundle exec parallel_test features -t cucumber"]
        );
    }

    #[tokio::test]
    async fn test_failure_then_rerun_from_fragments() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("parallel_rerun1.txt"), "features/a.feature:7").unwrap();

        let config = config();
        let source = FakeSource::default();
        let runner = FakeRunner::scripted([false, true]);
        let orchestrator =
            Orchestrator::new(&config, dir.path(), &source, &runner, parallel_capabilities());

        let report = orchestrator
            .run(&request(&["features/a.feature", "features/b.feature"], Some(1)))
            .await
            .unwrap();

        assert!(report.main_passed());
        let lines = runner.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("parallel_test features/a.feature features/b.feature"));
        assert_eq!(
            lines[1],
            "PATH=/opt/ff:$PATH bundle exec cucumber --format progress --profile rerun \
             features/a.feature:7"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("rerun.txt")).unwrap(),
            "features/a.feature:7\n"
        );
    }

    #[tokio::test]
    async fn test_exhausted_reruns_still_run_solo_pass() {
        let dir = tempdir().unwrap();
        let config = config();
        let source = FakeSource {
            solo: vec!["features/a.feature".into()],
            ..Default::default()
        };
        let runner = FakeRunner::scripted([false, false, true]);
        let orchestrator =
            Orchestrator::new(&config, dir.path(), &source, &runner, parallel_capabilities());

        let report = orchestrator
            .run(&request(&["features/a.feature", "features/b.feature"], Some(1)))
            .await
            .unwrap();

        assert_eq!(report.failed_phase, Some(Phase::Rerun { index: 1, of: 1 }));
        assert_eq!(report.solo, SoloOutcome::Passed);
        assert_eq!(report.attempts.len(), 3);

        let lines = runner.lines();
        assert!(lines[2].contains("--profile rerun --tags @solo"));

        assert!(matches!(
            report.into_result(),
            Err(RunnerError::FeaturesFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_line_scoped_target_runs_serially_without_solo() {
        let dir = tempdir().unwrap();
        let config = config();
        let source = FakeSource {
            solo: vec!["features/a.feature".into()],
            ..Default::default()
        };
        let runner = FakeRunner::scripted([true]);
        let orchestrator =
            Orchestrator::new(&config, dir.path(), &source, &runner, parallel_capabilities());

        let report = orchestrator
            .run(&request(&["features/a.feature:12", "features/b.feature"], None))
            .await
            .unwrap();

        assert!(matches!(report.solo, SoloOutcome::Skipped(_)));
        assert_eq!(
            runner.lines(),
            vec![
                "PATH=/opt/ff:$PATH bundle exec cucumber --format progress \
                 features/a.feature:12 features/b.feature"
            ]
        );
    }

    #[tokio::test]
    async fn test_debug_replaces_default_formatter() {
        let dir = tempdir().unwrap();
        let config = config();
        let source = FakeSource::default();
        let runner = FakeRunner::scripted([true]);
        let orchestrator =
            Orchestrator::new(&config, dir.path(), &source, &runner, Capabilities::default());

        let mut req = request(&["features/a.feature"], None);
        req.debug = true;
        orchestrator.run(&req).await.unwrap();

        assert_eq!(
            runner.lines(),
            vec!["PATH=/opt/ff:$PATH cucumber --format pretty --backtrace features/a.feature"]
        );
    }

    #[tokio::test]
    async fn test_solo_failure_fails_invocation() {
        let dir = tempdir().unwrap();
        let config = config();
        let source = FakeSource {
            solo: vec!["features/a.feature".into()],
            ..Default::default()
        };
        let runner = FakeRunner::scripted([true, false]);
        let orchestrator =
            Orchestrator::new(&config, dir.path(), &source, &runner, parallel_capabilities());

        let report = orchestrator.run(&request(&[], None)).await.unwrap();

        assert!(report.main_passed());
        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "@solo features failed");
    }

    #[tokio::test]
    async fn test_configured_rerun_budget_applies() {
        let dir = tempdir().unwrap();
        let config = RunnerConfig {
            max_reruns: 2,
            ..config()
        };
        let source = FakeSource::default();
        let runner = FakeRunner::scripted([false, false, false]);
        let orchestrator =
            Orchestrator::new(&config, dir.path(), &source, &runner, Capabilities::default());

        let report = orchestrator.run(&request(&[], None)).await.unwrap();

        assert_eq!(runner.lines().len(), 3);
        assert_eq!(report.failed_phase, Some(Phase::Rerun { index: 2, of: 2 }));
    }

    #[tokio::test]
    async fn test_serial_rerun_ignores_leftover_manifest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("rerun.txt"), "features/unrelated.feature:4").unwrap();

        let config = config();
        let source = FakeSource::default();
        let runner = FakeRunner::scripted([false, true]);
        let orchestrator =
            Orchestrator::new(&config, dir.path(), &source, &runner, Capabilities::default());

        let report = orchestrator
            .run(&request(&["features/a.feature", "features/b.feature"], Some(1)))
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(
            runner.lines(),
            vec![
                "PATH=/opt/ff:$PATH cucumber --format progress features/a.feature features/b.feature",
                "PATH=/opt/ff:$PATH cucumber --format progress --profile rerun \
                 features/a.feature features/b.feature",
            ]
        );
    }
}
