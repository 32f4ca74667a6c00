//! Manifest storage and fragment consolidation
//!
//! Consolidation is not transactional: fragments are removed as soon as they
//! have been read, so a failed write loses their content. Two invocations
//! sharing a working directory are not supported.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The canonical rerun manifest
#[derive(Clone, Debug)]
pub struct RerunManifest {
    path: PathBuf,
}

impl RerunManifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whitespace-separated targets recorded in the manifest.
    ///
    /// A missing or unreadable manifest reads as empty.
    pub fn read_targets(&self) -> Vec<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => content.split_whitespace().map(str::to_string).collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Failed to read rerun manifest {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

/// What a consolidation pass did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Consolidation {
    /// No fragments were present; the canonical manifest is untouched
    NoFragments,
    /// Fragments were merged into the canonical manifest and removed
    Merged { fragments: usize, targets: usize },
}

/// Merges per-worker fragments into the canonical manifest
pub struct ManifestConsolidator {
    workdir: PathBuf,
    fragment_glob: String,
    manifest: RerunManifest,
}

impl ManifestConsolidator {
    /// `manifest` is resolved against `workdir` when relative
    pub fn new(
        workdir: impl Into<PathBuf>,
        fragment_glob: impl Into<String>,
        manifest: impl AsRef<Path>,
    ) -> Self {
        let workdir = workdir.into();
        let manifest = RerunManifest::new(workdir.join(manifest));
        Self {
            workdir,
            fragment_glob: fragment_glob.into(),
            manifest,
        }
    }

    pub fn manifest(&self) -> &RerunManifest {
        &self.manifest
    }

    /// Fragment files currently present in the working directory
    pub fn fragments(&self) -> Vec<PathBuf> {
        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&self.workdir.to_string_lossy()),
            self.fragment_glob
        );

        match glob::glob(&pattern) {
            Ok(paths) => paths
                .filter_map(Result::ok)
                .filter(|p| p.is_file() && p.as_path() != self.manifest.path())
                .collect(),
            Err(e) => {
                warn!("Invalid fragment pattern {}: {}", self.fragment_glob, e);
                Vec::new()
            }
        }
    }

    /// Merge all fragments into the canonical manifest, then delete them
    pub fn consolidate(&self) -> Consolidation {
        let fragments = self.fragments();
        if fragments.is_empty() {
            debug!("No rerun fragments to consolidate");
            return Consolidation::NoFragments;
        }

        info!("Consolidating {} rerun fragment(s)", fragments.len());

        let mut targets: Vec<String> = Vec::new();
        for fragment in &fragments {
            match fs::read_to_string(fragment) {
                Ok(content) => targets.extend(content.split_whitespace().map(str::to_string)),
                Err(e) => warn!("Failed to read rerun fragment {}: {}", fragment.display(), e),
            }
            if let Err(e) = fs::remove_file(fragment) {
                warn!("Failed to remove rerun fragment {}: {}", fragment.display(), e);
            }
        }

        let content = format!("{}\n", targets.join(" "));
        if let Err(e) = fs::write(self.manifest.path(), content) {
            warn!(
                "Failed to write rerun manifest {}: {}",
                self.manifest.path().display(),
                e
            );
        }

        Consolidation::Merged {
            fragments: fragments.len(),
            targets: targets.len(),
        }
    }
}
