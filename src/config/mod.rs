//! Configuration module
//!
//! Handles loading and managing configuration.

mod env;
mod file;

pub use env::EnvConfig;
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under `$HOME` holding the pinned test browser
const DEFAULT_BROWSER_DIR: &str = "bin/firefox-for-selenium";

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Root of the feature file tree
    pub features_dir: PathBuf,

    /// Extension of feature files, without the dot
    pub feature_extension: String,

    /// Default number of serial reruns after a failed run
    pub max_reruns: u32,

    /// Tag marking scenarios that must never run in parallel
    pub solo_tag: String,

    /// Directory put in front of PATH so browser sessions use a pinned binary
    pub browser_path: Option<PathBuf>,

    /// Rerun manifest settings
    pub rerun: RerunConfig,

    /// Execution engine settings
    pub engine: EngineConfig,

    /// Worker-pool helper settings
    pub parallel: ParallelConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            features_dir: PathBuf::from("features"),
            feature_extension: "feature".to_string(),
            max_reruns: 0,
            solo_tag: "@solo".to_string(),
            browser_path: None,
            rerun: RerunConfig::default(),
            engine: EngineConfig::default(),
            parallel: ParallelConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Browser directory, defaulting to `~/bin/firefox-for-selenium`
    pub fn browser_dir(&self) -> Option<PathBuf> {
        self.browser_path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(DEFAULT_BROWSER_DIR)))
    }

    /// Overlay values taken from `FEATURE_RUNNER_*` variables
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(max_reruns) = env.max_reruns {
            self.max_reruns = max_reruns;
        }
        if let Some(dir) = &env.features_dir {
            self.features_dir = PathBuf::from(dir);
        }
        if let Some(path) = &env.browser_path {
            self.browser_path = Some(PathBuf::from(path));
        }
    }
}

/// Rerun manifest locations and engine profile
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerunConfig {
    /// Canonical manifest, relative to the working directory
    pub manifest: PathBuf,

    /// Glob matching per-worker manifest fragments
    pub fragment_glob: String,

    /// Engine profile that writes failing targets to the manifest
    pub profile: String,
}

impl Default for RerunConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("rerun.txt"),
            fragment_glob: "parallel_rerun*.txt".to_string(),
            profile: "rerun".to_string(),
        }
    }
}

/// How the execution engine is invoked
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable
    pub binary: String,

    /// Prefix commands with `bundle exec` when a Gemfile is present
    pub bundle_exec: bool,

    /// Gem that provides the enhanced progress formatter
    pub spinner_gem: String,

    /// Formatter used when the spinner gem is declared
    pub spinner_formatter: String,

    /// Formatter used otherwise
    pub fallback_formatter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "cucumber".to_string(),
            bundle_exec: true,
            spinner_gem: "cucumber_spinner".to_string(),
            spinner_formatter: "CucumberSpinner::CuriousProgressBarFormatter".to_string(),
            fallback_formatter: "progress".to_string(),
        }
    }
}

/// Worker-pool helper settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Helper executable
    pub helper: String,

    /// Gem name looked up in `bundle list` to find the helper version
    pub gem: String,

    /// Newest helper version that still expects the legacy type keyword
    pub legacy_max_version: String,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            helper: "parallel_test".to_string(),
            gem: "parallel_tests".to_string(),
            legacy_max_version: "0.7.0".to_string(),
        }
    }
}

pub(crate) fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
