//! Target resolution
//!
//! Precedence: explicit targets, then modified files, then content search,
//! then the whole suite.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::FeatureSource;
use crate::models::{InvocationOptions, TargetSet, TargetSource};

/// Raw selection input for one invocation
#[derive(Clone, Debug, Default)]
pub struct SelectionRequest {
    /// Arguments as typed; targets and engine options mixed
    pub args: Vec<String>,
    /// Run feature files changed in the working tree
    pub modified: bool,
    /// Run feature files containing this string
    pub containing: Option<String>,
}

/// Targets plus the options split off the same argument list
#[derive(Clone, Debug)]
pub struct Resolution {
    pub targets: TargetSet,
    pub options: InvocationOptions,
}

/// Resolves the effective target set
pub struct TargetResolver<'a> {
    workdir: PathBuf,
    feature_extension: String,
    source: &'a dyn FeatureSource,
}

impl<'a> TargetResolver<'a> {
    pub fn new(
        workdir: impl Into<PathBuf>,
        feature_extension: impl Into<String>,
        source: &'a dyn FeatureSource,
    ) -> Self {
        Self {
            workdir: workdir.into(),
            feature_extension: feature_extension.into(),
            source,
        }
    }

    /// Resolve targets and options from a request
    pub async fn resolve(&self, request: &SelectionRequest) -> Result<Resolution> {
        let (options, tokens) = InvocationOptions::partition(request.args.iter().cloned());

        let targets = if !tokens.is_empty() {
            TargetSet::new(TargetSource::CommandLine, self.expand(&tokens)?)
        } else if request.modified {
            let files = self
                .source
                .modified_feature_files()
                .await
                .context("Failed to list modified feature files")?;
            if files.is_empty() {
                info!("No modified features found, running the whole suite");
            }
            TargetSet::new(TargetSource::Modified, files)
        } else if let Some(pattern) = request.containing.as_deref().filter(|p| !p.is_empty()) {
            let files = self
                .source
                .search_feature_files(pattern)
                .await
                .with_context(|| format!("Failed to search features for '{pattern}'"))?;
            if files.is_empty() {
                info!("No features contain '{}', running the whole suite", pattern);
            }
            TargetSet::new(TargetSource::Containing(pattern.to_string()), files)
        } else {
            TargetSet::whole_suite()
        };

        debug!(
            "Resolved {} target(s) from {}",
            targets.len(),
            targets.source()
        );

        Ok(Resolution { targets, options })
    }

    /// Replace directory tokens by the feature files beneath them
    fn expand(&self, tokens: &[String]) -> Result<Vec<String>> {
        let mut expanded = Vec::with_capacity(tokens.len());

        for token in tokens {
            let path = self.workdir.join(token);
            if path.is_dir() {
                let files = self.feature_files_under(&path, Path::new(token).is_absolute())?;
                if files.is_empty() {
                    warn!("No feature files found in directory {}", token);
                }
                expanded.extend(files);
            } else {
                expanded.push(token.clone());
            }
        }

        Ok(expanded)
    }

    fn feature_files_under(&self, dir: &Path, keep_absolute: bool) -> Result<Vec<String>> {
        let pattern = format!(
            "{}/**/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            self.feature_extension
        );

        let mut files = Vec::new();
        for entry in glob::glob(&pattern).context("Invalid feature glob")? {
            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            if !file.is_file() {
                continue;
            }

            let shown = if keep_absolute {
                file.as_path()
            } else {
                file.strip_prefix(&self.workdir).unwrap_or(&file)
            };
            files.push(shown.to_string_lossy().into_owned());
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSource;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    fn request(args: &[&str]) -> SelectionRequest {
        SelectionRequest {
            args: args.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn names(set: &TargetSet) -> Vec<&str> {
        set.iter().map(|t| t.as_str()).collect()
    }

    #[tokio::test]
    async fn test_explicit_files_dedupe_in_order() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default();
        let resolver = TargetResolver::new(dir.path(), "feature", &source);

        let resolution = resolver
            .resolve(&request(&[
                "features/b.feature",
                "features/a.feature:12",
                "features/b.feature",
                "features/c.feature",
            ]))
            .await
            .unwrap();

        assert_eq!(
            names(&resolution.targets),
            vec!["features/b.feature", "features/a.feature:12", "features/c.feature"]
        );
        assert_eq!(resolution.targets.source(), &TargetSource::CommandLine);
        assert!(resolution.options.is_empty());
    }

    #[tokio::test]
    async fn test_directory_expands_to_feature_files_only() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("features/admin/deep")).unwrap();
        fs::create_dir_all(root.join("features/support")).unwrap();
        fs::write(root.join("features/login.feature"), "Feature: Login").unwrap();
        fs::write(root.join("features/admin/users.feature"), "Feature: Users").unwrap();
        fs::write(root.join("features/admin/deep/roles.feature"), "Feature: Roles").unwrap();
        fs::write(root.join("features/support/env.rb"), "# env").unwrap();
        fs::write(root.join("features/admin/notes.txt"), "notes").unwrap();

        let source = FakeSource::default();
        let resolver = TargetResolver::new(root, "feature", &source);
        let resolution = resolver.resolve(&request(&["features/admin"])).await.unwrap();

        let got: HashSet<_> = names(&resolution.targets).into_iter().collect();
        let expected: HashSet<_> = [
            "features/admin/users.feature",
            "features/admin/deep/roles.feature",
        ]
        .into_iter()
        .collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_options_are_split_off() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default();
        let resolver = TargetResolver::new(dir.path(), "feature", &source);

        let resolution = resolver
            .resolve(&request(&["--strict", "features/a.feature", "-b"]))
            .await
            .unwrap();

        assert_eq!(names(&resolution.targets), vec!["features/a.feature"]);
        assert_eq!(resolution.options.as_slice(), &["--strict", "-b"]);
    }

    #[tokio::test]
    async fn test_modified_mode_uses_source() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            modified: vec!["features/b.feature".into(), "features/a.feature".into()],
            ..Default::default()
        };
        let resolver = TargetResolver::new(dir.path(), "feature", &source);

        let resolution = resolver
            .resolve(&SelectionRequest {
                args: vec!["--strict".into()],
                modified: true,
                containing: None,
            })
            .await
            .unwrap();

        let got: HashSet<_> = names(&resolution.targets).into_iter().collect();
        assert_eq!(
            got,
            ["features/a.feature", "features/b.feature"].into_iter().collect()
        );
        assert_eq!(resolution.targets.source(), &TargetSource::Modified);
        assert_eq!(resolution.options.as_slice(), &["--strict"]);
    }

    #[tokio::test]
    async fn test_containing_mode_dedupes() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            matches: vec![
                "features/search.feature".into(),
                "features/search.feature".into(),
                "features/filter.feature".into(),
            ],
            ..Default::default()
        };
        let resolver = TargetResolver::new(dir.path(), "feature", &source);

        let resolution = resolver
            .resolve(&SelectionRequest {
                containing: Some("Search".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(resolution.targets.len(), 2);
        assert_eq!(
            resolution.targets.source(),
            &TargetSource::Containing("Search".into())
        );
        assert_eq!(source.searched(), vec!["Search".to_string()]);
    }

    #[tokio::test]
    async fn test_explicit_args_win_over_modes() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            modified: vec!["features/other.feature".into()],
            ..Default::default()
        };
        let resolver = TargetResolver::new(dir.path(), "feature", &source);

        let resolution = resolver
            .resolve(&SelectionRequest {
                args: vec!["features/mine.feature".into()],
                modified: true,
                containing: Some("x".into()),
            })
            .await
            .unwrap();

        assert_eq!(names(&resolution.targets), vec!["features/mine.feature"]);
        assert!(source.searched().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_selected_runs_whole_suite() {
        let dir = tempdir().unwrap();
        let source = FakeSource::default();
        let resolver = TargetResolver::new(dir.path(), "feature", &source);

        let resolution = resolver.resolve(&SelectionRequest::default()).await.unwrap();
        assert!(resolution.targets.is_empty());
        assert_eq!(resolution.targets.source(), &TargetSource::WholeSuite);

        let resolution = resolver
            .resolve(&SelectionRequest {
                modified: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(resolution.targets.is_empty());
    }
}
