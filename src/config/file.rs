//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{is_yaml_path, RunnerConfig};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./feature-runner.yaml",
    "./feature-runner.yml",
    "./.feature-runner.yaml",
    "~/.config/feature-runner/config.yaml",
];

/// Full configuration file structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Runner settings
    #[serde(default)]
    pub runner: RunnerConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            runner: RunnerConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        for location in CONFIG_LOCATIONS {
            let path = expand_path(location);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::find() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_path(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_path(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.version != "1.0" {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        let runner = &self.runner;
        if runner.feature_extension.is_empty() || runner.feature_extension.starts_with('.') {
            anyhow::bail!(
                "Invalid feature extension '{}'. Use the bare extension, e.g. 'feature'",
                runner.feature_extension
            );
        }
        if runner.solo_tag.trim().is_empty() {
            anyhow::bail!("Solo tag must not be empty");
        }
        if runner.engine.binary.trim().is_empty() || runner.parallel.helper.trim().is_empty() {
            anyhow::bail!("Engine and helper binaries must not be empty");
        }
        glob::Pattern::new(&runner.rerun.fragment_glob).with_context(|| {
            format!("Invalid fragment glob: {}", runner.rerun.fragment_glob)
        })?;

        let version = &runner.parallel.legacy_max_version;
        if version.is_empty() || !version.split('.').all(|p| p.parse::<u64>().is_ok()) {
            anyhow::bail!("Invalid legacy helper version: {version}");
        }

        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        let mut runner = RunnerConfig::default();
        runner.max_reruns = 2;
        runner.browser_path = dirs::home_dir().map(|h| h.join("bin/firefox-for-selenium"));

        Self {
            version: default_version(),
            runner,
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
