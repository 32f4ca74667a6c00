//! Target selection
//!
//! Turns raw invocation arguments and filter modes into a concrete
//! [`TargetSet`](crate::models::TargetSet).

mod resolver;

pub use resolver::{SelectionRequest, TargetResolver};

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Source of feature files outside the explicit argument list.
///
/// The working tree status and content search are environment dependent,
/// so the resolver only talks to them through this trait.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Feature files changed in the working tree, deleted files excluded
    async fn modified_feature_files(&self) -> Result<Vec<String>>;

    /// Feature files whose content matches `pattern`, ignoring case
    async fn search_feature_files(&self, pattern: &str) -> Result<Vec<String>>;

    /// Files under `paths` (files or directories) containing `marker` verbatim
    async fn files_containing(&self, marker: &str, paths: &[PathBuf]) -> Result<Vec<String>>;
}
