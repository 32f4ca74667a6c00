//! Rerun manifests
//!
//! Failing targets are handed from one attempt to the next through a plain
//! text manifest. Parallel workers each write their own fragment, which is
//! merged into the canonical manifest before a rerun.

mod manifest;

pub use manifest::{Consolidation, ManifestConsolidator};
