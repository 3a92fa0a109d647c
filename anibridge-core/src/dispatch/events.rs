use anibridge_model::{EpisodeId, FileId, ImportFolderId, SeriesCrossReference, SeriesId};

/// Why the catalog emitted a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    Added,
    Updated,
    Removed,
}

/// A file-scope change notification from the catalog.
#[derive(Debug, Clone)]
pub struct FileEvent {
    pub file_id: FileId,
    pub reason: ChangeReason,
    pub import_folder_id: ImportFolderId,
    /// Path relative to the import folder, with a leading slash.
    pub relative_path: String,
    /// Cross-references as of this event; may be empty when the catalog has
    /// not matched the file yet.
    pub cross_references: Vec<SeriesCrossReference>,
}

impl FileEvent {
    /// Whether this event carries fully resolved cross-references usable
    /// without a fresh fetch.
    pub fn has_cross_references(&self) -> bool {
        !self.cross_references.is_empty()
            && self.cross_references.iter().all(|x| x.is_resolved())
    }

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
}

/// What entity a metadata notification talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataScope {
    Series,
    Episode,
}

/// A metadata-scope change notification from the catalog.
#[derive(Debug, Clone)]
pub struct MetadataEvent {
    pub scope: MetadataScope,
    pub reason: ChangeReason,
    /// Stable per-entity key the dispatcher coalesces on.
    pub provider_uid: String,
    pub series_id: Option<SeriesId>,
    pub episode_id: Option<EpisodeId>,
}

impl MetadataEvent {
    /// Whether the event is addressable at all: a series event with a series
    /// id, or an episode event with an episode id.
    pub fn is_addressable(&self) -> bool {
        match self.scope {
            MetadataScope::Series => self.series_id.is_some(),
            MetadataScope::Episode => self.episode_id.is_some(),
        }
    }
}

/// Intake envelope for the dispatcher's bounded channel.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    File(FileEvent),
    Metadata(MetadataEvent),
}
