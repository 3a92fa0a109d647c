use std::collections::HashSet;
use std::path::PathBuf;

use dashmap::DashMap;

use anibridge_model::{EpisodeId, FileId, GroupId, SeriesId};

/// Process-wide ID-mapping indices maintained alongside the info cache.
///
/// Entries accumulate as lookups resolve and are wiped together with the
/// cache; they are pure acceleration structures, reconstructible from the
/// catalog at any time.
#[derive(Debug, Default)]
pub(crate) struct IdIndices {
    pub path_to_series: DashMap<PathBuf, SeriesId>,
    pub series_to_path: DashMap<SeriesId, PathBuf>,
    pub path_to_file: DashMap<PathBuf, (FileId, SeriesId)>,
    pub episode_to_series: DashMap<EpisodeId, SeriesId>,
    pub episode_to_path: DashMap<EpisodeId, PathBuf>,
    pub file_to_episodes: DashMap<FileId, Vec<EpisodeId>>,
    pub series_to_group: DashMap<SeriesId, GroupId>,
    pub seen_episodes: DashMap<SeriesId, HashSet<EpisodeId>>,
    pub ignored_episodes: DashMap<SeriesId, HashSet<EpisodeId>>,
}

impl IdIndices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.path_to_series.clear();
        self.series_to_path.clear();
        self.path_to_file.clear();
        self.episode_to_series.clear();
        self.episode_to_path.clear();
        self.file_to_episodes.clear();
        self.series_to_group.clear();
        self.seen_episodes.clear();
        self.ignored_episodes.clear();
    }
}
