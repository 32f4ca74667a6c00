//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Cucumber feature run orchestrator
#[derive(Parser, Debug)]
#[command(name = "feature-runner")]
#[command(version = "0.1.0")]
#[command(about = "Run cucumber features in parallel with reruns and @solo passes")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: discovered in standard locations)
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run features
    Run(RunArgs),

    /// Merge parallel rerun fragments into the rerun manifest
    Consolidate,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run feature files modified in the working tree
    #[arg(short, long)]
    pub modified: bool,

    /// Run feature files containing this string (case-insensitive)
    #[arg(short, long)]
    pub containing: Option<String>,

    /// Print every command before running it
    #[arg(short, long)]
    pub verbose: bool,

    /// Use the pretty formatter with backtraces
    #[arg(short, long)]
    pub debug: bool,

    /// Rerun failed features up to N times
    #[arg(short, long, value_name = "N")]
    pub rerun: Option<u32>,

    /// Feature files, directories and engine options (anything starting with -).
    /// Run flags must come before the first target; everything from the first
    /// target on is passed to cucumber as is.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./feature-runner.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment overrides instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (default: discovered file)
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["feature-runner", "run"];
        full.extend_from_slice(argv);
        match Args::parse_from(full).command {
            Command::Run(run_args) => run_args,
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_flags() {
        let args = run_args(&["-m", "-v", "-r", "2", "-c", "checkout"]);
        assert!(args.modified);
        assert!(args.verbose);
        assert!(!args.debug);
        assert_eq!(args.rerun, Some(2));
        assert_eq!(args.containing.as_deref(), Some("checkout"));
        assert!(args.args.is_empty());
    }

    #[test]
    fn test_trailing_args_keep_engine_options() {
        let args = run_args(&[
            "-d",
            "features/a.feature:3",
            "--strict",
            "features/admin",
            "-b",
        ]);
        assert!(args.debug);
        assert_eq!(
            args.args,
            vec!["features/a.feature:3", "--strict", "features/admin", "-b"]
        );
    }

    #[test]
    fn test_leading_engine_option() {
        let args = run_args(&["-r", "1", "--", "--tags", "@wip"]);
        assert_eq!(args.rerun, Some(1));
        assert_eq!(args.args, vec!["--tags", "@wip"]);
    }

    #[test]
    fn test_global_options() {
        let args = Args::parse_from([
            "feature-runner",
            "--log-level",
            "debug",
            "consolidate",
            "--config",
            "ci.yaml",
        ]);
        assert!(matches!(args.command, Command::Consolidate));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.config_file.as_deref(), Some("ci.yaml"));
    }

    #[test]
    fn test_config_init() {
        let args = Args::parse_from(["feature-runner", "config", "init", "--force"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { output, force },
            }) => {
                assert_eq!(output, "./feature-runner.yaml");
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_flags_after_target_go_to_engine() {
        let args = run_args(&["features/a.feature", "-v"]);
        assert!(!args.verbose);
        assert_eq!(args.args, vec!["features/a.feature", "-v"]);
    }
}
