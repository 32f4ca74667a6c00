//! Pass-through engine options

use std::fmt;

/// Prefix that marks an argument as an option rather than a target
pub const FLAG_MARKER: char = '-';

/// Arguments forwarded verbatim to the execution engine.
///
/// Options only ever grow during a run: the rerun profile is appended after
/// the first failure and the solo tag filter before the solo pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvocationOptions(Vec<String>);

impl InvocationOptions {
    /// Split raw arguments into options and target tokens
    pub fn partition<I, S>(args: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (options, targets): (Vec<String>, Vec<String>) = args
            .into_iter()
            .map(Into::into)
            .partition(|arg| arg.starts_with(FLAG_MARKER));

        (Self(options), targets)
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    /// `--format pretty --backtrace`, for hunting down silent failures
    pub fn add_debug_formatting(&mut self) {
        self.push("--format");
        self.push("pretty");
        self.push("--backtrace");
    }

    /// Ask the engine to use its rerun profile
    pub fn add_rerun_profile(&mut self, profile: &str) {
        self.push("--profile");
        self.push(profile);
    }

    /// Restrict the run to scenarios carrying `tag`
    pub fn add_tag_filter(&mut self, tag: &str) {
        self.push("--tags");
        self.push(tag);
    }

    /// Whether the caller already picked a formatter
    pub fn has_format(&self) -> bool {
        self.0
            .iter()
            .any(|o| o == "--format" || o == "-f" || o.starts_with("--format="))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for InvocationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}
