//! Content search over the feature tree

use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Literal matcher, optionally case-insensitive
pub fn literal(text: &str, ignore_case: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(text))
        .case_insensitive(ignore_case)
        .build()
}

/// Files under `roots` whose content matches `matcher`.
///
/// Roots may be files or directories. Directories are walked recursively and
/// only files ending in `.extension` are read; explicitly named files are
/// always read. Missing roots are skipped. Results keep walk order and are
/// shown relative to `base` when they lie beneath it.
pub fn files_matching(
    base: &Path,
    roots: &[PathBuf],
    matcher: &Regex,
    extension: &str,
) -> Vec<String> {
    let mut found = Vec::new();

    for root in roots {
        if root.is_file() {
            if content_matches(root, matcher) {
                found.push(display_path(base, root));
            }
            continue;
        }
        if !root.is_dir() {
            debug!("Search root {} does not exist", root.display());
            continue;
        }

        let entries = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| has_extension(entry.path(), extension));

        for entry in entries {
            if content_matches(entry.path(), matcher) {
                found.push(display_path(base, entry.path()));
            }
        }
    }

    found
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().map(|e| e == extension).unwrap_or(false)
}

fn content_matches(path: &Path, matcher: &Regex) -> bool {
    match fs::read_to_string(path) {
        Ok(content) => matcher.is_match(&content),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            false
        }
    }
}

fn display_path(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
