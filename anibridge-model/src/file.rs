use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EpisodeId, FileId, ImportFolderId, SeriesId};

/// Content hashes the catalog computed for a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileHashes {
    #[serde(default)]
    pub ed2k: String,
    #[serde(default)]
    pub sha1: String,
    #[serde(default)]
    pub crc32: String,
    #[serde(default)]
    pub md5: String,
}

/// One physical location the catalog knows for a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLocation {
    pub import_folder_id: ImportFolderId,
    pub relative_path: String,
    #[serde(default)]
    pub accessible: bool,
}

/// Identifier pair used inside cross-reference tables. The primary catalog
/// id is optional because the catalog may know the AniDB linkage before it
/// has created its own entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XrefIds<T> {
    pub id: Option<T>,
    pub anidb: i32,
}

/// Cross-reference from a file to one series and the ordered episodes the
/// file satisfies within it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesCrossReference {
    pub series: XrefIds<SeriesId>,
    pub episodes: Vec<XrefIds<EpisodeId>>,
}

impl SeriesCrossReference {
    /// Whether the catalog has resolved both its own series id and every
    /// episode id in this cross-reference.
    pub fn is_resolved(&self) -> bool {
        self.series.id.is_some() && self.episodes.iter().all(|e| e.id.is_some())
    }
}

/// One catalog file entry, verbatim from the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    pub size: u64,
    #[serde(default)]
    pub hashes: FileHashes,
    #[serde(default)]
    pub locations: Vec<FileLocation>,
    pub created_at: DateTime<Utc>,
    pub imported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cross_references: Vec<SeriesCrossReference>,
}

impl File {
    /// Series ids from resolved cross-references, deduplicated in order.
    pub fn series_ids(&self) -> Vec<SeriesId> {
        let mut out = Vec::new();
        for xref in &self.cross_references {
            if let Some(id) = xref.series.id {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// The cross-reference for a specific series, if any.
    pub fn cross_reference_for(&self, series_id: SeriesId) -> Option<&SeriesCrossReference> {
        self.cross_references
            .iter()
            .find(|xref| xref.series.id == Some(series_id))
    }
}
