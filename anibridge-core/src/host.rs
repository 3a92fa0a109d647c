//! Seam to the host's library store.
//!
//! The host owns the user-facing item database; the core only looks items
//! up by provider tag and asks for targeted refreshes or path-change scans.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use anibridge_model::{EpisodeId, FileId, SeriesId};

use crate::error::Result;

/// Opaque id of an item in the host's library database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostItemId(pub Uuid);

impl fmt::Display for HostItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host item categories the bridge touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostItemKind {
    Show,
    Season,
    Episode,
    Movie,
    Video,
    Folder,
}

/// Provider tag the bridge stamps on host items so they can be found again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderTag {
    File(FileId),
    Series(SeriesId),
    Episode(EpisodeId),
}

#[derive(Debug, Clone)]
pub struct HostItem {
    pub id: HostItemId,
    pub kind: HostItemKind,
    pub path: Option<PathBuf>,
}

/// The host's library store.
#[async_trait]
pub trait HostLibrary: Send + Sync {
    /// Items carrying the given provider tag, optionally narrowed by kind.
    async fn items_tagged(&self, tag: ProviderTag, kind: Option<HostItemKind>) -> Vec<HostItem>;

    /// The item sitting at a path, if the host knows one.
    async fn find_by_path(&self, path: &Path) -> Option<HostItem>;

    /// Any file or folder directly under `path`. Handing the host one such
    /// entry makes it schedule a rescan of the whole folder.
    async fn first_entry_under(&self, path: &Path) -> Option<PathBuf>;

    /// Tell the host a filesystem path changed.
    async fn report_path_changed(&self, path: &Path);

    /// Full metadata and image replacement for one item. The catalog is
    /// authoritative, so partial refreshes are never requested. Long calls
    /// observe the cancellation token and stop at shutdown.
    async fn refresh_item(&self, item: HostItemId, cancel: &CancellationToken) -> Result<()>;
}
