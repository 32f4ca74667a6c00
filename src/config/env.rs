//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "FEATURE_RUNNER";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Max reruns from FEATURE_RUNNER_MAX_RERUNS
    pub max_reruns: Option<u32>,
    /// Features directory from FEATURE_RUNNER_FEATURES_DIR
    pub features_dir: Option<String>,
    /// Browser directory from FEATURE_RUNNER_BROWSER_PATH
    pub browser_path: Option<String>,
    /// Config file from FEATURE_RUNNER_CONFIG
    pub config_file: Option<String>,
    /// Log level from FEATURE_RUNNER_LOG
    pub log_level: Option<String>,
    /// Verbose from FEATURE_RUNNER_VERBOSE
    pub verbose: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            max_reruns: get_env_parse("MAX_RERUNS"),
            features_dir: get_env("FEATURES_DIR"),
            browser_path: get_env("BROWSER_PATH"),
            config_file: get_env("CONFIG"),
            log_level: get_env("LOG"),
            verbose: get_env_bool("VERBOSE"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.max_reruns.is_some()
            || self.features_dir.is_some()
            || self.browser_path.is_some()
            || self.config_file.is_some()
            || self.log_level.is_some()
            || self.verbose.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_MAX_RERUNS:   {:?}", ENV_PREFIX, self.max_reruns);
        println!("  {}_FEATURES_DIR: {:?}", ENV_PREFIX, self.features_dir);
        println!("  {}_BROWSER_PATH: {:?}", ENV_PREFIX, self.browser_path);
        println!("  {}_CONFIG:       {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LOG:          {:?}", ENV_PREFIX, self.log_level);
        println!("  {}_VERBOSE:      {:?}", ENV_PREFIX, self.verbose);
        if !self.has_any() {
            println!();
            print_env_help();
        }
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all FEATURE_RUNNER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_MAX_RERUNS    Serial reruns after a failed run");
    println!("  {ENV_PREFIX}_FEATURES_DIR  Root of the feature file tree");
    println!("  {ENV_PREFIX}_BROWSER_PATH  Directory with the pinned test browser");
    println!("  {ENV_PREFIX}_CONFIG        Path to configuration file");
    println!("  {ENV_PREFIX}_LOG           Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_VERBOSE       Echo built commands (true/false)");
}

/// Builder for setting environment variables in tests
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn max_reruns(mut self, reruns: u32) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_MAX_RERUNS"), reruns.to_string()));
        self
    }

    pub fn browser_path(mut self, path: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_BROWSER_PATH"), path.into()));
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_VERBOSE"), verbose.to_string()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
