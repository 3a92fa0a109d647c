//! The resolution and caching layer.
//!
//! [`MetadataResolver`] turns raw catalog records into the enriched info
//! objects in [`crate::info`], owns every ID-mapping index, and caches each
//! constructed object under a composite key until the TTL runs out or the
//! cache is cleared. Duplicate concurrent construction of the same key is
//! tolerated: info objects are immutable and idempotently reconstructible,
//! so the losing writer only wasted a fetch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use anibridge_config::{BridgeConfig, CacheConfig, OrderingConfig, TagConfig};
use anibridge_model::{
    EpisodeId, File, FileId, Group, GroupId, Series, SeriesId, Tag, TagFilter,
};

use crate::client::CatalogClient;
use crate::error::Result;
use crate::info::{CollectionInfo, EpisodeInfo, FileInfo, SeasonInfo, ShowInfo};

mod cache;
mod indices;

use cache::{CachedValue, InfoCache};
use indices::IdIndices;

/// Per-series path set: where on disk the series' exclusive files live,
/// which episodes are locally represented, and the import-time range.
#[derive(Debug, Clone, Default)]
pub struct SeriesPaths {
    /// Directory prefixes (catalog-relative, trailing slash) of files whose
    /// only cross-reference is this series.
    pub paths: HashSet<String>,
    /// Episodes with at least one local file for this series.
    pub episode_ids: HashSet<EpisodeId>,
    pub earliest_imported_at: Option<DateTime<Utc>>,
    pub latest_imported_at: Option<DateTime<Utc>>,
}

/// The slice of the bridge configuration the resolver consumes.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub ordering: OrderingConfig,
    pub tags: TagConfig,
    pub cache: CacheConfig,
    /// Host media folder roots, used to strip path prefixes before querying
    /// the catalog by path suffix.
    pub media_paths: Vec<PathBuf>,
}

impl ResolverConfig {
    pub fn from_bridge(config: &BridgeConfig) -> Self {
        Self {
            ordering: config.ordering,
            tags: config.tags,
            cache: config.cache,
            media_paths: config.folders.iter().map(|f| f.media_path.clone()).collect(),
        }
    }
}

/// The metadata resolution service. One instance per bridge; inject fresh
/// instances in tests for isolation.
pub struct MetadataResolver {
    client: Arc<dyn CatalogClient>,
    config: ResolverConfig,
    cache: InfoCache,
    indices: IdIndices,
    /// Serializes `clear` against itself; readers never block on it.
    clear_guard: Mutex<()>,
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MetadataResolver {
    pub fn new(client: Arc<dyn CatalogClient>, config: ResolverConfig) -> Self {
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        Self {
            client,
            config,
            cache: InfoCache::new(ttl),
            indices: IdIndices::new(),
            clear_guard: Mutex::new(()),
        }
    }

    /// Dispose of every cached object and index under mutual exclusion.
    /// Safe to call concurrently with in-flight resolutions: they finish
    /// against the old cache generation.
    pub fn clear(&self) {
        let _guard = self.clear_guard.lock().expect("clear lock poisoned");
        debug!("clearing resolver caches and indices");
        self.cache.clear();
        self.indices.clear();
    }

    /// Drop the cached objects a series-level change event supersedes: the
    /// season itself, its path set, and any show assembled on top of it.
    pub fn invalidate_series(&self, id: SeriesId) {
        let season = season_key(id);
        let paths = series_paths_key(id);
        let single_show = format!("show:series:{id}");
        let group_show = self
            .indices
            .series_to_group
            .get(&id)
            .map(|entry| format!("show:group:{}", *entry));
        self.cache.remove_where(|key| {
            key == season
                || key == paths
                || key == single_show
                || Some(key) == group_show.as_deref()
        });
    }

    /// Drop the cached objects a file change event supersedes.
    pub fn invalidate_file(&self, id: FileId) {
        let prefix = format!("file:{id}:");
        self.cache.remove_where(|key| key.starts_with(&prefix));

        let episode_ids = self
            .indices
            .file_to_episodes
            .get(&id)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        let series_ids: HashSet<SeriesId> = episode_ids
            .iter()
            .filter_map(|episode| self.indices.episode_to_series.get(episode).map(|s| *s))
            .collect();
        for series_id in series_ids {
            let key = series_paths_key(series_id);
            self.cache.remove_where(|candidate| candidate == key);
        }
    }

    /// Strip the owning media-folder prefix, yielding the catalog-relative
    /// path used for suffix queries.
    pub fn strip_media_folder(&self, path: &Path) -> String {
        for root in &self.config.media_paths {
            if let Ok(relative) = path.strip_prefix(root) {
                return format!("/{}", relative.display());
            }
        }
        path.display().to_string()
    }

    // ----- series / season ------------------------------------------------

    /// Resolve the series backing a host path. `None` means the catalog does
    /// not know the path, which is an answer rather than an error.
    pub async fn resolve_series_by_path(&self, path: &Path) -> Result<Option<Arc<SeasonInfo>>> {
        if let Some(series_id) = self.indices.path_to_series.get(path).map(|e| *e) {
            return self.resolve_season_by_id(series_id).await;
        }

        let partial = self.strip_media_folder(path);
        debug!(path = %partial, "looking for series matching path");
        let matches = self.client.get_series_by_path_suffix(&partial).await?;
        trace!(count = matches.len(), path = %partial, "series path query returned");

        let Some(series) = matches.into_iter().next() else {
            return Ok(None);
        };
        let series_id = series.id();
        self.indices
            .path_to_series
            .insert(path.to_path_buf(), series_id);
        self.indices
            .series_to_path
            .entry(series_id)
            .or_insert_with(|| path.to_path_buf());

        Ok(Some(self.build_season(series).await?))
    }

    pub async fn resolve_season_by_id(&self, id: SeriesId) -> Result<Option<Arc<SeasonInfo>>> {
        if let Some(season) = self.cache.get_season(&season_key(id)) {
            return Ok(Some(season));
        }
        let Some(series) = self.client.get_series(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.build_season(series).await?))
    }

    async fn build_season(&self, series: Series) -> Result<Arc<SeasonInfo>> {
        let id = series.id();
        let key = season_key(id);
        if let Some(season) = self.cache.get_season(&key) {
            return Ok(season);
        }
        trace!(series_id = %id, name = %series.name, "creating season info");

        let episodes: Vec<EpisodeInfo> = self
            .client
            .get_episodes_for_series(id)
            .await?
            .into_iter()
            .map(EpisodeInfo::new)
            .collect();
        let cast = self.client.get_cast(id).await?;
        let genres = self.genres_for_series(id).await?;
        let tags = self.tags_for_series(id).await?;
        let files = self.client.get_files_for_series(id).await?;

        // The file fetch doubles as the series path set; cache it so the
        // dispatcher's lookups don't refetch.
        let paths = Arc::new(build_series_paths(id, &files));
        self.cache
            .insert(series_paths_key(id), CachedValue::SeriesPaths(Arc::clone(&paths)));

        let season = Arc::new(SeasonInfo::new(
            series,
            episodes,
            &cast,
            genres,
            tags,
            &files,
            &self.config.ordering,
        ));

        for episode in &season.raw_episodes {
            self.indices.episode_to_series.insert(episode.id, id);
            self.cache.insert(
                episode_key(episode.id),
                CachedValue::Episode(Arc::clone(episode)),
            );
        }
        self.cache.insert(key, CachedValue::Season(Arc::clone(&season)));
        Ok(season)
    }

    // ----- show -----------------------------------------------------------

    /// Resolve the show a series belongs to: its whole group when grouping
    /// is enabled, a standalone single-season show otherwise.
    pub async fn resolve_show_for_series(&self, id: SeriesId) -> Result<Option<Arc<ShowInfo>>> {
        if self.config.ordering.use_groups {
            if let Some(group) = self.group_for_series(id).await? {
                return Ok(Some(self.build_group_show(group).await?));
            }
        }

        let Some(season) = self.resolve_season_by_id(id).await? else {
            return Ok(None);
        };
        let key = format!("show:series:{id}");
        if let Some(show) = self.cache.get_show(&key) {
            return Ok(Some(show));
        }
        let show = Arc::new(ShowInfo::from_single(season));
        self.cache.insert(key, CachedValue::Show(Arc::clone(&show)));
        Ok(Some(show))
    }

    async fn build_group_show(&self, group: Group) -> Result<Arc<ShowInfo>> {
        let key = format!("show:group:{}", group.id());
        if let Some(show) = self.cache.get_show(&key) {
            return Ok(show);
        }
        let seasons = self.build_group_members(&group).await?;
        let show = Arc::new(ShowInfo::from_group(&group, seasons, &self.config.ordering)?);
        self.cache.insert(key, CachedValue::Show(Arc::clone(&show)));
        Ok(show)
    }

    async fn build_group_members(&self, group: &Group) -> Result<Vec<Arc<SeasonInfo>>> {
        let members = self.client.get_series_in_group(group.id()).await?;
        let mut seasons = Vec::with_capacity(members.len());
        for series in members {
            let series_id = series.id();
            self.indices.series_to_group.insert(series_id, group.id());
            seasons.push(self.build_season(series).await?);
        }
        Ok(seasons)
    }

    // ----- group / collection ---------------------------------------------

    pub async fn resolve_group(&self, id: GroupId) -> Result<Option<Arc<CollectionInfo>>> {
        let key = format!("group:{id}");
        if let Some(collection) = self.cache.get_collection(&key) {
            return Ok(Some(collection));
        }
        let Some(group) = self.client.get_group(id).await? else {
            return Ok(None);
        };
        let seasons = self.build_group_members(&group).await?;
        let collection = Arc::new(CollectionInfo::new(group, seasons, &self.config.ordering)?);
        self.cache
            .insert(key, CachedValue::Collection(Arc::clone(&collection)));
        Ok(Some(collection))
    }

    async fn group_for_series(&self, id: SeriesId) -> Result<Option<Group>> {
        if let Some(group_id) = self.indices.series_to_group.get(&id).map(|e| *e) {
            return self.client.get_group(group_id).await.map_err(Into::into);
        }
        let Some(group) = self.client.get_group_for_series(id).await? else {
            return Ok(None);
        };
        self.indices.series_to_group.insert(id, group.id());
        Ok(Some(group))
    }

    // ----- episode --------------------------------------------------------

    pub async fn resolve_episode_by_id(&self, id: EpisodeId) -> Result<Option<Arc<EpisodeInfo>>> {
        if let Some(episode) = self.cache.get_episode(&episode_key(id)) {
            return Ok(Some(episode));
        }
        let Some(record) = self.client.get_episode(id).await? else {
            return Ok(None);
        };
        trace!(episode_id = %id, name = %record.name, "creating episode info");
        let episode = Arc::new(EpisodeInfo::new(record));
        self.cache
            .insert(episode_key(id), CachedValue::Episode(Arc::clone(&episode)));
        Ok(Some(episode))
    }

    // ----- file -----------------------------------------------------------

    pub async fn resolve_file_by_id(
        &self,
        file_id: FileId,
        series_id: SeriesId,
    ) -> Result<Option<Arc<FileInfo>>> {
        if let Some(file) = self.cache.get_file(&file_key(file_id, series_id)) {
            return Ok(Some(file));
        }
        let Some(record) = self.client.get_file(file_id).await? else {
            return Ok(None);
        };
        self.build_file(record, series_id).await
    }

    async fn build_file(&self, record: File, series_id: SeriesId) -> Result<Option<Arc<FileInfo>>> {
        let key = file_key(record.id, series_id);
        if let Some(file) = self.cache.get_file(&key) {
            return Ok(Some(file));
        }

        let Some(xref) = record.cross_reference_for(series_id) else {
            warn!(
                file_id = %record.id,
                series_id = %series_id,
                "file has no cross-reference for the requested series"
            );
            return Ok(None);
        };

        let mut episodes = Vec::with_capacity(xref.episodes.len());
        for episode_ref in &xref.episodes {
            let Some(episode_id) = episode_ref.id else {
                continue;
            };
            match self.resolve_episode_by_id(episode_id).await? {
                Some(episode) => episodes.push(episode),
                None => {
                    warn!(
                        file_id = %record.id,
                        episode_id = %episode_id,
                        "cross-referenced episode is missing from the catalog"
                    );
                    return Ok(None);
                }
            }
        }

        let mut alternates = Vec::new();
        for other in record
            .cross_references
            .iter()
            .filter(|x| x.series.id != Some(series_id))
        {
            let mut grouping = Vec::new();
            for episode_ref in &other.episodes {
                if let Some(episode_id) = episode_ref.id {
                    if let Some(episode) = self.resolve_episode_by_id(episode_id).await? {
                        grouping.push(episode);
                    }
                }
            }
            if !grouping.is_empty() {
                alternates.push(grouping);
            }
        }

        trace!(file_id = %record.id, series_id = %series_id, "creating file info");
        let file = Arc::new(FileInfo::new(record, series_id, episodes, alternates));
        self.indices
            .file_to_episodes
            .insert(file.id, file.episode_ids());
        for episode in &file.episodes {
            self.indices.episode_to_series.insert(episode.id, series_id);
        }
        self.cache.insert(key, CachedValue::File(Arc::clone(&file)));
        Ok(Some(file))
    }

    /// Resolve a host path to the file and owning season it represents.
    /// The owner is the cross-referenced series whose path set contains the
    /// file's directory.
    pub async fn resolve_file_by_path(
        &self,
        path: &Path,
    ) -> Result<Option<(Arc<FileInfo>, Arc<SeasonInfo>)>> {
        if let Some((file_id, series_id)) = self.indices.path_to_file.get(path).map(|e| *e) {
            let file = self.resolve_file_by_id(file_id, series_id).await?;
            let season = self.resolve_season_by_id(series_id).await?;
            return Ok(file.zip(season));
        }

        let partial = self.strip_media_folder(path);
        debug!(path = %partial, "looking for file matching path");
        let matches = self.client.get_files_by_path_suffix(&partial).await?;
        trace!(count = matches.len(), path = %partial, "file path query returned");

        let Some(record) = matches
            .into_iter()
            .find(|f| !f.cross_references.is_empty())
        else {
            return Ok(None);
        };

        let directory = record
            .locations
            .iter()
            .find(|l| l.relative_path.ends_with(&partial))
            .map(|l| directory_prefix(&l.relative_path));
        let Some(directory) = directory else {
            warn!(file_id = %record.id, path = %partial, "no file location matches the queried path");
            return Ok(None);
        };

        for series_id in record.series_ids() {
            let series_paths = self.series_paths(series_id).await?;
            if !series_paths.paths.contains(&directory) {
                continue;
            }

            let Some(season) = self.resolve_season_by_id(series_id).await? else {
                return Ok(None);
            };
            let Some(file) = self.build_file(record, series_id).await? else {
                return Ok(None);
            };

            self.indices
                .path_to_file
                .insert(path.to_path_buf(), (file.id, series_id));
            for episode in &file.episodes {
                self.indices
                    .episode_to_path
                    .entry(episode.id)
                    .or_insert_with(|| path.to_path_buf());
            }
            return Ok(Some((file, season)));
        }

        warn!(path = %partial, "unable to pick an owning series for the file");
        Ok(None)
    }

    // ----- path set -------------------------------------------------------

    /// The cached per-series path set; fetched fresh when missing.
    pub async fn series_paths(&self, id: SeriesId) -> Result<Arc<SeriesPaths>> {
        let key = series_paths_key(id);
        if let Some(paths) = self.cache.get_series_paths(&key) {
            return Ok(paths);
        }
        let files = self.client.get_files_for_series(id).await?;
        let paths = Arc::new(build_series_paths(id, &files));
        self.cache
            .insert(key, CachedValue::SeriesPaths(Arc::clone(&paths)));
        Ok(paths)
    }

    // ----- seen / ignored episodes ----------------------------------------

    /// Record an episode as present on disk. Returns whether it was newly
    /// added; repeated calls are no-ops.
    pub fn mark_episode_seen(&self, episode_id: EpisodeId, series_id: SeriesId) -> bool {
        self.indices
            .seen_episodes
            .entry(series_id)
            .or_default()
            .insert(episode_id)
    }

    /// Record an episode as explicitly ignored at a path. Returns whether it
    /// was newly added.
    pub fn mark_episode_ignored(
        &self,
        episode_id: EpisodeId,
        series_id: SeriesId,
        path: &Path,
    ) -> bool {
        self.indices
            .episode_to_path
            .insert(episode_id, path.to_path_buf());
        self.indices
            .ignored_episodes
            .entry(series_id)
            .or_default()
            .insert(episode_id)
    }

    // ----- index lookups ---------------------------------------------------

    pub fn series_id_for_path(&self, path: &Path) -> Option<SeriesId> {
        self.indices.path_to_series.get(path).map(|e| *e)
    }

    pub fn path_for_series(&self, id: SeriesId) -> Option<PathBuf> {
        self.indices.series_to_path.get(&id).map(|e| e.clone())
    }

    pub fn series_id_for_episode(&self, id: EpisodeId) -> Option<SeriesId> {
        self.indices.episode_to_series.get(&id).map(|e| *e)
    }

    pub fn episode_ids_for_file(&self, id: FileId) -> Option<Vec<EpisodeId>> {
        self.indices.file_to_episodes.get(&id).map(|e| e.clone())
    }

    pub fn group_id_for_series(&self, id: SeriesId) -> Option<GroupId> {
        self.indices.series_to_group.get(&id).map(|e| *e)
    }

    // ----- enrichment -----------------------------------------------------

    async fn tags_for_series(&self, id: SeriesId) -> Result<Vec<String>> {
        let tags = self
            .client
            .get_tags(id, self.config.tags.to_filter())
            .await?;
        Ok(tags.iter().map(|tag| title_case(&tag.name)).collect())
    }

    async fn genres_for_series(&self, id: SeriesId) -> Result<Vec<String>> {
        let tags = self.client.get_tags(id, TagFilter::GENRES).await?;
        let mut genres: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for tag in &tags {
            let genre = title_case(&tag.name);
            if seen.insert(genre.clone()) {
                genres.push(genre);
            }
        }
        let source = self.source_genre(id).await?;
        if seen.insert(source.to_string()) {
            genres.push(source.to_string());
        }
        Ok(genres)
    }

    async fn source_genre(&self, id: SeriesId) -> Result<&'static str> {
        let tags = self.client.get_tags(id, TagFilter::SOURCE).await?;
        Ok(map_source_genre(tags.first()))
    }
}

// ----- helpers -------------------------------------------------------------

fn season_key(id: SeriesId) -> String {
    format!("season:{id}")
}

fn episode_key(id: EpisodeId) -> String {
    format!("episode:{id}")
}

fn file_key(file_id: FileId, series_id: SeriesId) -> String {
    format!("file:{file_id}:{series_id}")
}

fn series_paths_key(id: SeriesId) -> String {
    format!("series-paths:{id}")
}

fn directory_prefix(relative_path: &str) -> String {
    match relative_path.rfind('/') {
        Some(index) => relative_path[..=index].to_string(),
        None => "/".to_string(),
    }
}

fn build_series_paths(id: SeriesId, files: &[File]) -> SeriesPaths {
    let mut paths = HashSet::new();
    let mut episode_ids = HashSet::new();
    for file in files {
        if file.cross_references.len() == 1 {
            for location in &file.locations {
                paths.insert(directory_prefix(&location.relative_path));
            }
        }
        if let Some(xref) = file.cross_reference_for(id) {
            episode_ids.extend(xref.episodes.iter().filter_map(|e| e.id));
        }
    }
    SeriesPaths {
        paths,
        episode_ids,
        earliest_imported_at: files.iter().filter_map(|f| f.imported_at).min(),
        latest_imported_at: files.iter().filter_map(|f| f.imported_at).max(),
    }
}

/// Map the catalog's source-material tag onto a host-facing genre.
fn map_source_genre(tag: Option<&Tag>) -> &'static str {
    let Some(tag) = tag else {
        return "Original Work";
    };
    match tag.name.to_ascii_lowercase().as_str() {
        "american derived" | "cartoon" | "comic book" => "Adapted From Western Media",
        "4-koma" | "manga" | "4-koma manga" => "Adapted From A Manga",
        "manhua" => "Adapted From A Manhua",
        "manhwa" => "Adapted From A Manhwa",
        "movie" => "Adapted From A Movie",
        "novel" => "Adapted From A Light/Web Novel",
        "rpg" | "action game" | "game" => "Adapted From A Video Game",
        "erotic game" => "Adapted From An Eroge",
        "korean drama" => "Adapted From A Korean Drama",
        "television programme" => "Adapted From A Live-Action Show",
        "visual novel" => "Adapted From A Visual Novel",
        "fan-made" => "Fan-Made",
        "remake" => "Remake",
        "radio programme" => "Radio Programme",
        _ => "Original Work",
    }
}

fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (index, word) in name.split_whitespace().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CatalogClient, ClientResult};
    use crate::info::test_fixtures::series_of_kind;
    use anibridge_model::EpisodeKind::Normal;
    use anibridge_model::{
        AnidbEpisode, Episode, EpisodeKind, FileHashes, FileLocation, ImportFolderId, Role,
        SeriesCrossReference, SeriesKind, XrefIds,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw_episode(id: i32, kind: EpisodeKind, number: i32) -> Episode {
        Episode {
            id: EpisodeId(id),
            name: format!("Episode {number}"),
            file_count: 1,
            anidb: AnidbEpisode {
                id,
                kind,
                episode_number: number,
                air_date: None,
                titles: vec![],
                description: String::new(),
                rating: None,
            },
        }
    }

    fn raw_file(id: i32, series: i32, episodes: &[i32], relative_path: &str) -> File {
        File {
            id: FileId(id),
            size: 1,
            hashes: FileHashes::default(),
            locations: vec![FileLocation {
                import_folder_id: ImportFolderId(1),
                relative_path: relative_path.to_string(),
                accessible: true,
            }],
            created_at: Utc::now(),
            imported_at: Some(Utc::now()),
            cross_references: vec![SeriesCrossReference {
                series: XrefIds {
                    id: Some(SeriesId(series)),
                    anidb: series,
                },
                episodes: episodes
                    .iter()
                    .map(|&e| XrefIds {
                        id: Some(EpisodeId(e)),
                        anidb: e,
                    })
                    .collect(),
            }],
        }
    }

    /// Canned catalog with per-endpoint call counters.
    #[derive(Default)]
    struct StubCatalog {
        series: Vec<Series>,
        episodes: Vec<(SeriesId, Episode)>,
        files: Vec<(SeriesId, File)>,
        group: Option<(Group, Vec<SeriesId>)>,
        series_fetches: AtomicUsize,
    }

    impl StubCatalog {
        fn with_series(mut self, series: Series, episodes: Vec<Episode>, files: Vec<File>) -> Self {
            let id = series.id();
            self.series.push(series);
            self.episodes.extend(episodes.into_iter().map(|e| (id, e)));
            self.files.extend(files.into_iter().map(|f| (id, f)));
            self
        }

        fn with_group(mut self, group: Group, members: Vec<SeriesId>) -> Self {
            self.group = Some((group, members));
            self
        }
    }

    #[async_trait]
    impl CatalogClient for StubCatalog {
        async fn get_series(&self, id: SeriesId) -> ClientResult<Option<Series>> {
            self.series_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.series.iter().find(|s| s.id() == id).cloned())
        }

        async fn get_series_by_path_suffix(&self, suffix: &str) -> ClientResult<Vec<Series>> {
            // Pretend every series lives in a folder named after its id.
            Ok(self
                .series
                .iter()
                .filter(|s| suffix.contains(&s.id().to_string()))
                .cloned()
                .collect())
        }

        async fn get_series_for_episode(&self, id: EpisodeId) -> ClientResult<Option<Series>> {
            let series_id = self
                .episodes
                .iter()
                .find(|(_, e)| e.id == id)
                .map(|(sid, _)| *sid);
            Ok(series_id.and_then(|sid| self.series.iter().find(|s| s.id() == sid).cloned()))
        }

        async fn get_episode(&self, id: EpisodeId) -> ClientResult<Option<Episode>> {
            Ok(self
                .episodes
                .iter()
                .find(|(_, e)| e.id == id)
                .map(|(_, e)| e.clone()))
        }

        async fn get_episodes_for_series(&self, id: SeriesId) -> ClientResult<Vec<Episode>> {
            Ok(self
                .episodes
                .iter()
                .filter(|(sid, _)| *sid == id)
                .map(|(_, e)| e.clone())
                .collect())
        }

        async fn get_file(&self, id: FileId) -> ClientResult<Option<File>> {
            Ok(self
                .files
                .iter()
                .find(|(_, f)| f.id == id)
                .map(|(_, f)| f.clone()))
        }

        async fn get_files_by_path_suffix(&self, suffix: &str) -> ClientResult<Vec<File>> {
            Ok(self
                .files
                .iter()
                .filter(|(_, f)| {
                    f.locations
                        .iter()
                        .any(|l| l.relative_path.ends_with(suffix))
                })
                .map(|(_, f)| f.clone())
                .collect())
        }

        async fn get_files_for_series(&self, id: SeriesId) -> ClientResult<Vec<File>> {
            Ok(self
                .files
                .iter()
                .filter(|(sid, _)| *sid == id)
                .map(|(_, f)| f.clone())
                .collect())
        }

        async fn get_group(&self, id: GroupId) -> ClientResult<Option<Group>> {
            Ok(self
                .group
                .as_ref()
                .filter(|(group, _)| group.id() == id)
                .map(|(group, _)| group.clone()))
        }

        async fn get_group_for_series(&self, id: SeriesId) -> ClientResult<Option<Group>> {
            Ok(self
                .group
                .as_ref()
                .filter(|(_, members)| members.contains(&id))
                .map(|(group, _)| group.clone()))
        }

        async fn get_series_in_group(&self, id: GroupId) -> ClientResult<Vec<Series>> {
            let Some((group, members)) = self.group.as_ref() else {
                return Ok(vec![]);
            };
            if group.id() != id {
                return Ok(vec![]);
            }
            Ok(members
                .iter()
                .filter_map(|member| self.series.iter().find(|s| s.id() == *member))
                .cloned()
                .collect())
        }

        async fn get_cast(&self, _id: SeriesId) -> ClientResult<Vec<Role>> {
            Ok(vec![])
        }

        async fn get_tags(&self, _id: SeriesId, _filter: TagFilter) -> ClientResult<Vec<Tag>> {
            Ok(vec![])
        }
    }

    fn resolver(client: StubCatalog) -> MetadataResolver {
        resolver_with_ttl(client, 60)
    }

    fn resolver_with_ttl(client: StubCatalog, ttl_secs: u64) -> MetadataResolver {
        let config = ResolverConfig {
            ordering: OrderingConfig::default(),
            tags: TagConfig::default(),
            cache: CacheConfig { ttl_secs },
            media_paths: vec![PathBuf::from("/media/anime")],
        };
        MetadataResolver::new(Arc::new(client), config)
    }

    fn simple_catalog() -> StubCatalog {
        StubCatalog::default().with_series(
            series_of_kind(17, SeriesKind::Tv),
            vec![raw_episode(1, Normal, 1), raw_episode(2, Normal, 2)],
            vec![raw_file(500, 17, &[1], "/17/ep01.mkv")],
        )
    }

    fn grouped_catalog() -> StubCatalog {
        let group = Group {
            ids: anibridge_model::GroupIds {
                id: GroupId(7),
                parent_group: None,
                top_level_group: GroupId(7),
                main_series: Some(SeriesId(2)),
            },
            name: "Franchise".to_string(),
            series_count: 2,
        };
        StubCatalog::default()
            .with_series(
                series_of_kind(1, SeriesKind::Tv),
                vec![raw_episode(10, Normal, 1)],
                vec![],
            )
            .with_series(
                series_of_kind(2, SeriesKind::Tv),
                vec![raw_episode(20, Normal, 1)],
                vec![],
            )
            .with_group(group, vec![SeriesId(1), SeriesId(2)])
    }

    fn grouping_resolver(client: StubCatalog) -> MetadataResolver {
        let config = ResolverConfig {
            ordering: OrderingConfig {
                use_groups: true,
                ..OrderingConfig::default()
            },
            tags: TagConfig::default(),
            cache: CacheConfig::default(),
            media_paths: vec![PathBuf::from("/media/anime")],
        };
        MetadataResolver::new(Arc::new(client), config)
    }

    #[tokio::test]
    async fn repeated_resolution_returns_the_identical_cached_reference() {
        let resolver = resolver(simple_catalog());
        let first = resolver
            .resolve_season_by_id(SeriesId(17))
            .await
            .unwrap()
            .unwrap();
        let second = resolver
            .resolve_season_by_id(SeriesId(17))
            .await
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn clear_forces_a_fresh_reconstruction() {
        let resolver = resolver(simple_catalog());
        let first = resolver
            .resolve_season_by_id(SeriesId(17))
            .await
            .unwrap()
            .unwrap();
        resolver.clear();
        let second = resolver
            .resolve_season_by_id(SeriesId(17))
            .await
            .unwrap()
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn unknown_series_resolves_to_none_not_an_error() {
        let resolver = resolver(simple_catalog());
        let missing = resolver.resolve_season_by_id(SeriesId(999)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn season_resolution_populates_episode_indices() {
        let resolver = resolver(simple_catalog());
        resolver
            .resolve_season_by_id(SeriesId(17))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            resolver.series_id_for_episode(EpisodeId(1)),
            Some(SeriesId(17))
        );
        // Episode infos were cached as a side effect; no extra fetch needed.
        let episode = resolver
            .resolve_episode_by_id(EpisodeId(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(episode.episode_number(), 2);
    }

    #[tokio::test]
    async fn path_resolution_caches_the_path_to_series_mapping() {
        let resolver = resolver(simple_catalog());
        let path = Path::new("/media/anime/17/ep01.mkv");
        let season = resolver
            .resolve_series_by_path(path)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(season.id, SeriesId(17));
        assert_eq!(resolver.series_id_for_path(path), Some(SeriesId(17)));
    }

    #[tokio::test]
    async fn file_path_resolution_picks_the_owning_series() {
        let resolver = resolver(simple_catalog());
        let (file, season) = resolver
            .resolve_file_by_path(Path::new("/media/anime/17/ep01.mkv"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(file.id, FileId(500));
        assert_eq!(season.id, SeriesId(17));
        assert_eq!(file.episode_ids(), vec![EpisodeId(1)]);
        assert_eq!(
            resolver.episode_ids_for_file(FileId(500)),
            Some(vec![EpisodeId(1)])
        );
    }

    #[tokio::test]
    async fn mark_episode_seen_and_ignored_are_idempotent() {
        let resolver = resolver(simple_catalog());
        assert!(resolver.mark_episode_seen(EpisodeId(1), SeriesId(17)));
        assert!(!resolver.mark_episode_seen(EpisodeId(1), SeriesId(17)));

        let path = Path::new("/media/anime/17/extra.mkv");
        assert!(resolver.mark_episode_ignored(EpisodeId(9), SeriesId(17), path));
        assert!(!resolver.mark_episode_ignored(EpisodeId(9), SeriesId(17), path));
    }

    #[tokio::test]
    async fn series_paths_collects_exclusive_directories() {
        let resolver = resolver(simple_catalog());
        let paths = resolver.series_paths(SeriesId(17)).await.unwrap();
        assert!(paths.paths.contains("/17/"));
        assert!(paths.episode_ids.contains(&EpisodeId(1)));
    }

    #[tokio::test]
    async fn grouped_resolution_builds_one_show_for_every_member() {
        let resolver = grouping_resolver(grouped_catalog());
        let show = resolver
            .resolve_show_for_series(SeriesId(1))
            .await
            .unwrap()
            .unwrap();

        // The show anchors on the group's configured default series.
        assert_eq!(show.id, SeriesId(2));
        assert_eq!(show.group_id, Some(GroupId(7)));
        assert_eq!(show.seasons.len(), 2);
        assert_eq!(show.number_for_season(SeriesId(1)), Some(0));
        assert_eq!(show.number_for_season(SeriesId(2)), Some(1));

        // Both members resolve to the identical cached show.
        let same = resolver
            .resolve_show_for_series(SeriesId(2))
            .await
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&show, &same));
        assert_eq!(resolver.group_id_for_series(SeriesId(1)), Some(GroupId(7)));
    }

    #[tokio::test]
    async fn groups_resolve_to_collections_with_their_default_season() {
        let resolver = grouping_resolver(grouped_catalog());
        let collection = resolver
            .resolve_group(GroupId(7))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(collection.seasons.len(), 2);
        assert_eq!(collection.default_season.id, SeriesId(2));
        assert!(collection.is_top_level);

        let missing = resolver.resolve_group(GroupId(99)).await.unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("slice of life"), "Slice Of Life");
        assert_eq!(title_case("action"), "Action");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn source_genre_mapping_defaults_to_original_work() {
        let manga = Tag {
            id: 1,
            name: "Manga".to_string(),
            weight: 0,
        };
        assert_eq!(map_source_genre(Some(&manga)), "Adapted From A Manga");
        assert_eq!(map_source_genre(None), "Original Work");
        let odd = Tag {
            id: 2,
            name: "ultra jump".to_string(),
            weight: 0,
        };
        assert_eq!(map_source_genre(Some(&odd)), "Original Work");
    }
}
