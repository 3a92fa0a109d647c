//! Seam to the virtual-filesystem link generator.
//!
//! The core decides *which* links should exist for a file; computing link
//! paths and touching the filesystem belongs to the implementation behind
//! [`LinkGenerator`], which lives with the host integration.

use std::collections::HashSet;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use anibridge_config::CollectionKind;
use anibridge_model::{FileId, SeriesId};

use crate::error::Result;

/// The link set a file should occupy under a virtual root, plus the import
/// timestamp to stamp on materialized links.
#[derive(Debug, Clone, Default)]
pub struct FileLocations {
    pub link_paths: Vec<PathBuf>,
    pub imported_at: Option<DateTime<Utc>>,
}

/// Outcome counters for one materialization pass.
#[derive(Debug, Clone, Default)]
pub struct LinkResult {
    pub created: u32,
    pub fixed: u32,
    pub skipped: u32,
    pub removed: u32,
    /// Every link path this pass accounted for, used to diff against the
    /// host's stale entries.
    pub paths: HashSet<PathBuf>,
}

impl LinkResult {
    pub fn total(&self) -> u32 {
        self.created + self.fixed + self.skipped
    }

    pub fn log_summary(&self, folder: &Path) {
        info!(
            created = self.created,
            fixed = self.fixed,
            skipped = self.skipped,
            removed = self.removed,
            folder = %folder.display(),
            "reconciled virtual links"
        );
    }
}

impl AddAssign for LinkResult {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.fixed += other.fixed;
        self.skipped += other.skipped;
        self.removed += other.removed;
        self.paths.extend(other.paths);
    }
}

/// Produces and maintains the symbolic-link layout for catalog files.
#[async_trait]
pub trait LinkGenerator: Send + Sync {
    /// Compute the link set representing `source` for one resolved series.
    async fn generate_locations(
        &self,
        collection: CollectionKind,
        vfs_root: &Path,
        source: &Path,
        file_id: FileId,
        series_id: SeriesId,
    ) -> Result<FileLocations>;

    /// Create or repair the given links, returning what was touched.
    async fn materialize(
        &self,
        source: &Path,
        link_paths: &[PathBuf],
        imported_at: DateTime<Utc>,
    ) -> Result<LinkResult>;

    /// Remove a single stale link.
    async fn remove_link(&self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assign_merges_counters_and_paths() {
        let mut a = LinkResult {
            created: 1,
            paths: HashSet::from([PathBuf::from("/vfs/a")]),
            ..LinkResult::default()
        };
        let b = LinkResult {
            fixed: 2,
            skipped: 1,
            paths: HashSet::from([PathBuf::from("/vfs/b")]),
            ..LinkResult::default()
        };
        a += b;
        assert_eq!(a.total(), 4);
        assert_eq!(a.paths.len(), 2);
    }
}
