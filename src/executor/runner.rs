//! Attempt execution
//!
//! Runs one engine or helper invocation and reports whether it passed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::command::{CommandBuilder, TestCommand};
use super::strategy::StrategySelector;
use crate::models::{AttemptRecord, InvocationOptions, Phase, TargetSet};
use crate::output::console;

/// Executes a built command and reports success
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// `Ok(true)` when the process exited 0
    async fn run(&self, command: &TestCommand) -> Result<bool>;
}

/// Runs commands through `sh -c`, inheriting stdio
pub struct ShellRunner {
    workdir: PathBuf,
}

impl ShellRunner {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &TestCommand) -> Result<bool> {
        let line = command.to_shell_line();
        debug!("Executing: {}", line);

        let status = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .current_dir(&self.workdir)
            .status()
            .await
            .with_context(|| format!("Failed to execute: {line}"))?;

        if !status.success() {
            debug!("Command exited with {:?}", status.code());
        }
        Ok(status.success())
    }
}

/// Selects a strategy, builds the command and runs it
pub struct AttemptRunner<'a> {
    selector: StrategySelector,
    builder: CommandBuilder,
    runner: &'a dyn CommandRunner,
    verbose: bool,
}

impl<'a> AttemptRunner<'a> {
    pub fn new(
        selector: StrategySelector,
        builder: CommandBuilder,
        runner: &'a dyn CommandRunner,
        verbose: bool,
    ) -> Self {
        Self {
            selector,
            builder,
            runner,
            verbose,
        }
    }

    /// Run one attempt over `targets`
    pub async fn execute(
        &self,
        phase: Phase,
        targets: &TargetSet,
        options: &InvocationOptions,
        force_serial: bool,
    ) -> Result<AttemptRecord> {
        console::show_targets(targets);

        let strategy = self.selector.select(targets, options, force_serial);
        if strategy.is_parallel() {
            console::note("Using parallel_tests");
        }

        let command = self.builder.build(&strategy, targets, options);
        if self.verbose {
            console::echo_command(&command);
        }

        info!(
            "Starting {} ({}, {} target(s))",
            phase,
            if strategy.is_parallel() { "parallel" } else { "serial" },
            targets.len()
        );

        let start = Instant::now();
        let passed = self.runner.run(&command).await?;

        if passed {
            info!("{} passed in {}ms", phase, start.elapsed().as_millis());
        } else {
            warn!("{} failed after {}ms", phase, start.elapsed().as_millis());
        }

        Ok(AttemptRecord {
            phase,
            parallel: strategy.is_parallel(),
            passed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::executor::strategy::{Capabilities, HelperVersion};
    use crate::models::TargetSource;
    use crate::test_utils::FakeRunner;
    use tempfile::tempdir;

    fn attempt_runner<'a>(runner: &'a FakeRunner, helper: Option<&str>) -> AttemptRunner<'a> {
        let config = RunnerConfig {
            browser_path: Some(PathBuf::from("/opt/ff")),
            ..Default::default()
        };
        let capabilities = Capabilities {
            helper: helper.and_then(HelperVersion::parse),
            spinner: false,
            bundle_exec: false,
        };
        AttemptRunner::new(
            StrategySelector::new(capabilities.clone(), &config),
            CommandBuilder::new(&config, &capabilities),
            runner,
            false,
        )
    }

    #[tokio::test]
    async fn test_attempt_records_strategy_and_result() {
        let runner = FakeRunner::scripted([false]);
        let attempts = attempt_runner(&runner, Some("3.0.0"));
        let targets = TargetSet::new(
            TargetSource::CommandLine,
            ["features/a.feature", "features/b.feature"],
        );

        let record = attempts
            .execute(Phase::Initial, &targets, &InvocationOptions::default(), false)
            .await
            .unwrap();

        assert_eq!(
            record,
            AttemptRecord {
                phase: Phase::Initial,
                parallel: true,
                passed: false
            }
        );
        assert_eq!(
            runner.lines(),
            vec!["PATH=/opt/ff:$PATH parallel_test features/a.feature features/b.feature -t cucumber"]
        );
    }

    #[tokio::test]
    async fn test_shell_runner_reports_exit_status() {
        let dir = tempdir().unwrap();
        let runner = ShellRunner::new(dir.path());
        let config = RunnerConfig {
            browser_path: Some(PathBuf::from("/nonexistent")),
            engine: crate::config::EngineConfig {
                binary: "true".to_string(),
                bundle_exec: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let builder = CommandBuilder::new(&config, &Capabilities::default());
        let passing = builder.build(
            &crate::executor::strategy::ExecutionStrategy::Serial { formatter: None },
            &TargetSet::whole_suite(),
            &InvocationOptions::default(),
        );
        assert!(runner.run(&passing).await.unwrap());

        let config = RunnerConfig {
            engine: crate::config::EngineConfig {
                binary: "false".to_string(),
                bundle_exec: false,
                ..Default::default()
            },
            ..config
        };
        let builder = CommandBuilder::new(&config, &Capabilities::default());
        let failing = builder.build(
            &crate::executor::strategy::ExecutionStrategy::Serial { formatter: None },
            &TargetSet::whole_suite(),
            &InvocationOptions::default(),
        );
        assert!(!runner.run(&failing).await.unwrap());
    }
}
