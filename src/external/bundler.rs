//! Bundler integration
//!
//! Dependency install gate and the capability probe. Probing never fails:
//! anything that cannot be determined degrades to serial execution.

use anyhow::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::executor::{Capabilities, HelperVersion};

const GEMFILE: &str = "Gemfile";

/// Runs bundler commands in the project directory
pub struct Bundler {
    workdir: PathBuf,
    helper_gem: String,
    spinner_gem: String,
}

impl Bundler {
    pub fn new(workdir: impl Into<PathBuf>, config: &RunnerConfig) -> Self {
        Self {
            workdir: workdir.into(),
            helper_gem: config.parallel.gem.clone(),
            spinner_gem: config.engine.spinner_gem.clone(),
        }
    }

    fn gemfile(&self) -> PathBuf {
        self.workdir.join(GEMFILE)
    }

    pub fn has_gemfile(&self) -> bool {
        self.gemfile().is_file()
    }

    fn bundle_available() -> bool {
        which::which("bundle").is_ok()
    }

    /// `bundle check || bundle install`; skipped without a Gemfile
    pub async fn ensure_installed(&self) -> Result<()> {
        if !self.has_gemfile() {
            debug!("No Gemfile, skipping dependency check");
            return Ok(());
        }
        if !Self::bundle_available() {
            warn!("Gemfile present but bundle is not installed, skipping dependency check");
            return Ok(());
        }

        let check = Command::new("bundle")
            .arg("check")
            .current_dir(&self.workdir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if matches!(check, Ok(status) if status.success()) {
            debug!("Bundle is complete");
            return Ok(());
        }

        info!("Bundle incomplete, running bundle install");
        let install = Command::new("bundle")
            .arg("install")
            .current_dir(&self.workdir)
            .status()
            .await;

        match install {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                warn!("bundle install exited with {:?}", status.code());
                Err(RunnerError::InstallFailed.into())
            }
            Err(e) => {
                warn!("Failed to run bundle install: {}", e);
                Err(RunnerError::InstallFailed.into())
            }
        }
    }

    /// Determine helper version, spinner formatter and `bundle exec` use
    pub async fn probe(&self) -> Capabilities {
        if !self.has_gemfile() {
            debug!("No Gemfile, running without bundler");
            return Capabilities::default();
        }

        let spinner = match fs::read_to_string(self.gemfile()) {
            Ok(content) => declares_gem(&content, &self.spinner_gem),
            Err(e) => {
                warn!("Failed to read Gemfile: {}", e);
                false
            }
        };

        if !Self::bundle_available() {
            warn!("bundle not found in PATH, running serially");
            return Capabilities {
                helper: None,
                spinner,
                bundle_exec: false,
            };
        }

        let helper = self.helper_version().await;
        match &helper {
            Some(version) => info!("Found {} {}", self.helper_gem, version),
            None => debug!("{} not in bundle", self.helper_gem),
        }

        Capabilities {
            helper,
            spinner,
            bundle_exec: true,
        }
    }

    async fn helper_version(&self) -> Option<HelperVersion> {
        let output = Command::new("bundle")
            .arg("list")
            .current_dir(&self.workdir)
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(o) if o.status.success() => {
                parse_helper_version(&String::from_utf8_lossy(&o.stdout), &self.helper_gem)
            }
            Ok(o) => {
                debug!("bundle list exited with {:?}", o.status.code());
                None
            }
            Err(e) => {
                warn!("Failed to run bundle list: {}", e);
                None
            }
        }
    }
}

/// Version of `gem` from `bundle list` output (`  * parallel_tests (3.4.0)`)
pub fn parse_helper_version(list_output: &str, gem: &str) -> Option<HelperVersion> {
    let version = Regex::new(r"\(([\d.]+).*\)").ok()?;

    list_output
        .lines()
        .find(|line| names_gem(line, gem))
        .and_then(|line| version.captures(line))
        .and_then(|caps| caps.get(1))
        .and_then(|m| HelperVersion::parse(m.as_str()))
}

fn names_gem(line: &str, gem: &str) -> bool {
    let line = line.trim_start();
    let line = line.strip_prefix('*').unwrap_or(line).trim_start();
    line.split_whitespace().next() == Some(gem)
}

/// Whether a Gemfile mentions `gem`
pub fn declares_gem(gemfile: &str, gem: &str) -> bool {
    gemfile
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .any(|line| line.contains(gem))
}

/// Whether `workdir` holds the feature tree
pub fn has_features(workdir: &Path, features_dir: &Path) -> bool {
    workdir.join(features_dir).is_dir()
}
