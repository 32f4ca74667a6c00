//! feature-runner - Cucumber feature run orchestrator
//!
//! Runs a project's cucumber features, sharding them across parallel workers
//! when possible, rerunning failures serially and giving `@solo` scenarios a
//! serial pass of their own.
//!
//! ## Features
//!
//! - Target selection from arguments, modified files or a content search
//! - Parallel execution through `parallel_tests` when it is in the bundle
//! - Bounded serial reruns driven by the rerun manifest
//! - Separate serial pass for scenarios tagged `@solo`
//!
//! ## Usage
//!
//! ```bash
//! # Run the whole suite
//! feature-runner run
//!
//! # Run modified features, rerunning failures twice
//! feature-runner run --modified --rerun 2
//!
//! # Run features mentioning "checkout" with extra engine options
//! feature-runner run --containing checkout -- --strict
//!
//! # Run one scenario with the pretty formatter
//! feature-runner run --debug features/checkout.feature:12
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod cli;
mod config;
mod error;
mod executor;
mod external;
mod models;
mod output;
mod rerun;
mod selection;
#[cfg(test)]
mod test_utils;
mod utils;

use cli::Args;
use config::{ConfigFile, EnvConfig, RunnerConfig};
use executor::{Orchestrator, RunRequest, ShellRunner};
use external::{bundler, Bundler, WorkspaceSource};
use output::console;
use rerun::{Consolidation, ManifestConsolidator};
use selection::SelectionRequest;
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    init_logger(LogLevel::resolve([
        args.log_level.as_deref(),
        env.log_level.as_deref(),
    ]));

    match args.command {
        cli::Command::Run(run_args) => {
            let config = load_config(args.config_file.as_deref(), &env)?;
            run_features(run_args, &config, &env).await?;
        }
        cli::Command::Consolidate => {
            let config = load_config(args.config_file.as_deref(), &env)?;
            consolidate(&config)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, args.config_file.as_deref(), &env)?;
        }
    }

    Ok(())
}

/// Defaults, then the config file, then environment overrides
fn load_config(explicit: Option<&str>, env: &EnvConfig) -> Result<RunnerConfig> {
    let file = match explicit.or(env.config_file.as_deref()) {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let mut config = file.runner;
    config.apply_env(env);
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn working_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to determine working directory")
}

async fn run_features(args: cli::RunArgs, config: &RunnerConfig, env: &EnvConfig) -> Result<()> {
    let workdir = working_dir()?;

    if !bundler::has_features(&workdir, &config.features_dir) {
        console::note("Cucumber not employed.");
        return Ok(());
    }

    let bundler = Bundler::new(&workdir, config);
    bundler.ensure_installed().await?;
    let capabilities = bundler.probe().await;

    let verbose = args.verbose || env.verbose.unwrap_or(false);
    let request = RunRequest {
        selection: SelectionRequest {
            args: args.args,
            modified: args.modified,
            containing: args.containing,
        },
        debug: args.debug,
        max_reruns: args.rerun,
    };

    let source = WorkspaceSource::new(&workdir, config);
    let runner = ShellRunner::new(&workdir);
    let orchestrator =
        Orchestrator::new(config, &workdir, &source, &runner, capabilities).verbose(verbose);

    let report = orchestrator.run(&request).await?;
    console::summary(&report);
    report.into_result()?;

    Ok(())
}

fn consolidate(config: &RunnerConfig) -> Result<()> {
    let workdir = working_dir()?;
    let consolidator = ManifestConsolidator::new(
        &workdir,
        config.rerun.fragment_glob.clone(),
        &config.rerun.manifest,
    );

    match consolidator.consolidate() {
        Consolidation::NoFragments => {
            println!("○ No rerun fragments found");
        }
        Consolidation::Merged { fragments, targets } => {
            info!("Rerun manifest updated");
            println!(
                "✓ Merged {} fragment(s) into {} ({} target(s))",
                fragments,
                consolidator.manifest().path().display(),
                targets
            );
        }
    }

    Ok(())
}

fn manage_config(args: cli::ConfigArgs, explicit: Option<&str>, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            let config = ConfigFile::example();
            config.save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env: show_env, format } => {
            if show_env {
                env.print_summary();
            } else {
                let config = ConfigFile {
                    runner: load_config(explicit, env)?,
                    ..Default::default()
                };
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| explicit.map(str::to_string))
                .or_else(|| {
                    ConfigFile::find().map(|p| p.to_string_lossy().to_string())
                })
                .unwrap_or_else(|| "./feature-runner.yaml".to_string());

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
