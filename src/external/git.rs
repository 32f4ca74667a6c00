//! Working tree status
//!
//! Lists feature files touched in the working tree via `git status --short`.
//! Outside a repository, or without git, nothing counts as modified.

use anyhow::Result;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Feature files changed in the working tree at `workdir`
pub async fn modified_files(workdir: &Path, extension: &str) -> Result<Vec<String>> {
    let output = match Command::new("git")
        .args(["status", "--short"])
        .current_dir(workdir)
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            warn!("Failed to run git status: {}", e);
            return Ok(Vec::new());
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("git status failed: {}", stderr.trim());
        return Ok(Vec::new());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let files = parse_status_lines(&stdout, extension);
    debug!("git status reported {} modified feature file(s)", files.len());
    Ok(files)
}

/// Pick feature files out of `git status --short` output.
///
/// Lines look like `XY path`. Renames (`XY old -> new`) yield the new path and
/// a `D` in either status column marks a deleted file, which is skipped.
pub fn parse_status_lines(output: &str, extension: &str) -> Vec<String> {
    let suffix = format!(".{extension}");

    output
        .lines()
        .filter_map(|line| {
            let status = line.get(..2)?;
            let rest = line.get(2..)?;
            if status.contains('D') {
                return None;
            }

            let path = rest.trim();
            let path = match path.rsplit_once(" -> ") {
                Some((_, new)) => new,
                None => path,
            };
            let path = unquote(path);

            path.ends_with(&suffix).then(|| path.to_string())
        })
        .collect()
}

/// git quotes paths with unusual characters
fn unquote(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}
