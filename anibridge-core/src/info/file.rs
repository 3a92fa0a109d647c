use std::sync::Arc;

use anibridge_model::{EpisodeId, File, FileId, SeriesId};

use super::episode::{EpisodeInfo, ExtraKind};

/// One catalog file resolved against its owning series: the ordered episode
/// list it satisfies there, plus the episode groupings its remaining
/// cross-references point at.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub id: FileId,
    pub series_id: SeriesId,
    /// Propagated from the episodes: a file whose episodes are extras is an
    /// extra itself.
    pub extra_kind: Option<ExtraKind>,
    pub record: File,
    /// Episodes the file satisfies in the owning series, ordered by
    /// classification then declared number.
    pub episodes: Vec<Arc<EpisodeInfo>>,
    /// Episode lists from cross-references into other series.
    pub alternate_episodes: Vec<Vec<Arc<EpisodeInfo>>>,
}

impl FileInfo {
    pub fn new(
        record: File,
        series_id: SeriesId,
        mut episodes: Vec<Arc<EpisodeInfo>>,
        alternate_episodes: Vec<Vec<Arc<EpisodeInfo>>>,
    ) -> Self {
        episodes.sort_by_key(|e| (e.kind, e.episode_number()));
        let extra_kind = episodes.iter().find_map(|e| e.extra_kind);
        Self {
            id: record.id,
            series_id,
            extra_kind,
            record,
            episodes,
            alternate_episodes,
        }
    }

    pub fn episode_ids(&self) -> Vec<EpisodeId> {
        self.episodes.iter().map(|e| e.id).collect()
    }
}
