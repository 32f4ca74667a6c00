//! Command construction
//!
//! Builds the shell command line for an attempt. Targets and options are
//! escaped one token at a time before joining.

use std::fmt;
use std::path::PathBuf;

use super::strategy::{Capabilities, ExecutionStrategy};
use crate::config::RunnerConfig;
use crate::models::{InvocationOptions, TargetSet};

/// Backslash-escape backslashes, spaces and double quotes
pub fn escape_shell_arg(arg: &str) -> String {
    let mut escaped = String::with_capacity(arg.len());
    for c in arg.chars() {
        if matches!(c, '\\' | ' ' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A command line ready to hand to `sh -c`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCommand {
    env: Option<String>,
    words: Vec<String>,
}

impl TestCommand {
    pub fn to_shell_line(&self) -> String {
        self.env
            .iter()
            .chain(self.words.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for TestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_line())
    }
}

/// Assembles engine and helper invocations
pub struct CommandBuilder {
    engine: String,
    helper: String,
    features_dir: String,
    browser_dir: Option<PathBuf>,
    bundle_exec: bool,
}

impl CommandBuilder {
    pub fn new(config: &RunnerConfig, capabilities: &Capabilities) -> Self {
        Self {
            engine: config.engine.binary.clone(),
            helper: config.parallel.helper.clone(),
            features_dir: config.features_dir.to_string_lossy().into_owned(),
            browser_dir: config.browser_dir(),
            bundle_exec: config.engine.bundle_exec && capabilities.bundle_exec,
        }
    }

    /// Build the command for one attempt
    pub fn build(
        &self,
        strategy: &ExecutionStrategy,
        targets: &TargetSet,
        options: &InvocationOptions,
    ) -> TestCommand {
        let words = match strategy {
            ExecutionStrategy::Serial { formatter } => {
                self.serial_words(formatter.as_deref(), targets, options)
            }
            ExecutionStrategy::Parallel { kind } => {
                self.parallel_words(kind.keyword(), targets, options)
            }
        };

        TestCommand {
            env: self.path_override(),
            words,
        }
    }

    fn serial_words(
        &self,
        formatter: Option<&str>,
        targets: &TargetSet,
        options: &InvocationOptions,
    ) -> Vec<String> {
        let mut words = self.launcher(&self.engine);
        if let Some(formatter) = formatter {
            words.push("--format".to_string());
            words.push(escape_shell_arg(formatter));
        }
        words.extend(options.as_slice().iter().map(|o| escape_shell_arg(o)));
        words.extend(targets.iter().map(|t| escape_shell_arg(t.as_str())));
        words
    }

    fn parallel_words(
        &self,
        keyword: &str,
        targets: &TargetSet,
        options: &InvocationOptions,
    ) -> Vec<String> {
        let mut words = self.launcher(&self.helper);
        if targets.is_empty() {
            words.push(escape_shell_arg(&self.features_dir));
        } else {
            words.extend(targets.iter().map(|t| escape_shell_arg(t.as_str())));
        }
        words.push("-t".to_string());
        words.push(keyword.to_string());

        if !options.is_empty() {
            let nested = options
                .as_slice()
                .iter()
                .map(|o| escape_shell_arg(o))
                .collect::<Vec<_>>()
                .join(" ");
            words.push("-o".to_string());
            words.push(format!("'{nested}'"));
        }
        words
    }

    fn launcher(&self, binary: &str) -> Vec<String> {
        let mut words = Vec::new();
        if self.bundle_exec {
            words.push("bundle".to_string());
            words.push("exec".to_string());
        }
        words.push(binary.to_string());
        words
    }

    fn path_override(&self) -> Option<String> {
        self.browser_dir.as_ref().map(|dir| {
            format!(
                "PATH={}:$PATH",
                escape_shell_arg(&dir.to_string_lossy())
            )
        })
    }
}
