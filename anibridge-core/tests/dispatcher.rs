//! End-to-end dispatcher behavior: coalescing, relocation handling, and
//! scan-time deferral, driven on a paused clock against fake collaborators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use anibridge_config::{
    CacheConfig, CollectionKind, DispatchConfig, LibraryFolder, OrderingConfig, TagConfig,
};
use anibridge_core::client::{CatalogClient, ClientResult};
use anibridge_core::dispatch::{ChangeReason, EventDispatcher, FileEvent, MetadataEvent, MetadataScope, ScanGate};
use anibridge_core::host::{HostItem, HostItemId, HostItemKind, HostLibrary, ProviderTag};
use anibridge_core::resolver::{MetadataResolver, ResolverConfig};
use anibridge_core::vfs::{FileLocations, LinkGenerator, LinkResult};
use anibridge_model::{
    AnidbEpisode, AnidbSeries, Episode, EpisodeId, EpisodeKind, File, FileHashes, FileId,
    FileLocation, Group, GroupId, ImportFolderId, Role, Series, SeriesCrossReference, SeriesId,
    SeriesIds, SeriesKind, SeriesSizes, Tag, TagFilter, XrefIds,
};

// ----- fixtures -------------------------------------------------------------

fn series(id: i32) -> Series {
    Series {
        ids: SeriesIds {
            id: SeriesId(id),
            parent_group: GroupId(1),
            top_level_group: GroupId(1),
            anidb: id,
        },
        name: format!("Series {id}"),
        sizes: SeriesSizes::default(),
        anidb: AnidbSeries {
            id,
            kind: SeriesKind::Tv,
            air_date: None,
            end_date: None,
            titles: vec![],
            description: String::new(),
            rating: None,
        },
        relations: vec![],
    }
}

fn episode(id: i32, number: i32) -> Episode {
    Episode {
        id: EpisodeId(id),
        name: format!("Episode {number}"),
        file_count: 1,
        anidb: AnidbEpisode {
            id,
            kind: EpisodeKind::Normal,
            episode_number: number,
            air_date: None,
            titles: vec![],
            description: String::new(),
            rating: None,
        },
    }
}

fn xref(series_id: i32, episode_ids: &[i32]) -> SeriesCrossReference {
    SeriesCrossReference {
        series: XrefIds {
            id: Some(SeriesId(series_id)),
            anidb: series_id,
        },
        episodes: episode_ids
            .iter()
            .map(|&e| XrefIds {
                id: Some(EpisodeId(e)),
                anidb: e,
            })
            .collect(),
    }
}

fn file_at(id: i32, series_id: i32, episode_ids: &[i32], locations: &[&str]) -> File {
    File {
        id: FileId(id),
        size: 1,
        hashes: FileHashes::default(),
        locations: locations
            .iter()
            .map(|&path| FileLocation {
                import_folder_id: ImportFolderId(1),
                relative_path: path.to_string(),
                accessible: true,
            })
            .collect(),
        created_at: Utc::now(),
        imported_at: Some(Utc::now()),
        cross_references: vec![xref(series_id, episode_ids)],
    }
}

// ----- fake collaborators ---------------------------------------------------

#[derive(Default)]
struct FakeCatalog {
    series: Vec<Series>,
    episodes: HashMap<i32, Vec<Episode>>,
    files: Vec<File>,
    file_fetches: AtomicUsize,
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn get_series(&self, id: SeriesId) -> ClientResult<Option<Series>> {
        Ok(self.series.iter().find(|s| s.id() == id).cloned())
    }

    async fn get_series_by_path_suffix(&self, _suffix: &str) -> ClientResult<Vec<Series>> {
        Ok(vec![])
    }

    async fn get_series_for_episode(&self, _id: EpisodeId) -> ClientResult<Option<Series>> {
        Ok(None)
    }

    async fn get_episode(&self, id: EpisodeId) -> ClientResult<Option<Episode>> {
        Ok(self
            .episodes
            .values()
            .flatten()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn get_episodes_for_series(&self, id: SeriesId) -> ClientResult<Vec<Episode>> {
        Ok(self.episodes.get(&id.0).cloned().unwrap_or_default())
    }

    async fn get_file(&self, id: FileId) -> ClientResult<Option<File>> {
        self.file_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.iter().find(|f| f.id == id).cloned())
    }

    async fn get_files_by_path_suffix(&self, _suffix: &str) -> ClientResult<Vec<File>> {
        Ok(vec![])
    }

    async fn get_files_for_series(&self, id: SeriesId) -> ClientResult<Vec<File>> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.series_ids().contains(&id))
            .cloned()
            .collect())
    }

    async fn get_group(&self, _id: GroupId) -> ClientResult<Option<Group>> {
        Ok(None)
    }

    async fn get_group_for_series(&self, _id: SeriesId) -> ClientResult<Option<Group>> {
        Ok(None)
    }

    async fn get_series_in_group(&self, _id: GroupId) -> ClientResult<Vec<Series>> {
        Ok(vec![])
    }

    async fn get_cast(&self, _id: SeriesId) -> ClientResult<Vec<Role>> {
        Ok(vec![])
    }

    async fn get_tags(&self, _id: SeriesId, _filter: TagFilter) -> ClientResult<Vec<Tag>> {
        Ok(vec![])
    }
}

/// Link generator that lays every link under `<vfs_root>/<series name>/`
/// and records what it touched.
#[derive(Default)]
struct FakeLinker {
    generated: Mutex<Vec<PathBuf>>,
    materialized: Mutex<Vec<PathBuf>>,
    removed: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl LinkGenerator for FakeLinker {
    async fn generate_locations(
        &self,
        _collection: CollectionKind,
        vfs_root: &Path,
        source: &Path,
        _file_id: FileId,
        series_id: SeriesId,
    ) -> anibridge_core::Result<FileLocations> {
        let file_name = source.file_name().expect("source has a file name");
        let link = vfs_root
            .join(format!("Series {series_id}"))
            .join(file_name);
        self.generated.lock().unwrap().push(link.clone());
        Ok(FileLocations {
            link_paths: vec![link],
            imported_at: Some(Utc::now()),
        })
    }

    async fn materialize(
        &self,
        _source: &Path,
        link_paths: &[PathBuf],
        _imported_at: chrono::DateTime<Utc>,
    ) -> anibridge_core::Result<LinkResult> {
        let mut log = self.materialized.lock().unwrap();
        log.extend(link_paths.iter().cloned());
        Ok(LinkResult {
            created: link_paths.len() as u32,
            paths: link_paths.iter().cloned().collect(),
            ..LinkResult::default()
        })
    }

    async fn remove_link(&self, path: &Path) -> anibridge_core::Result<()> {
        self.removed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
struct FakeHost {
    /// Items returned for `items_tagged`, keyed by tag.
    items: Mutex<Vec<(ProviderTag, HostItem)>>,
    reported_paths: Mutex<Vec<PathBuf>>,
    refreshed: Mutex<Vec<HostItemId>>,
}

impl FakeHost {
    fn tag_item(&self, tag: ProviderTag, kind: HostItemKind, path: Option<PathBuf>) -> HostItemId {
        let id = HostItemId(Uuid::new_v4());
        self.items
            .lock()
            .unwrap()
            .push((tag, HostItem { id, kind, path }));
        id
    }

    fn refresh_count(&self) -> usize {
        self.refreshed.lock().unwrap().len()
    }
}

#[async_trait]
impl HostLibrary for FakeHost {
    async fn items_tagged(&self, tag: ProviderTag, kind: Option<HostItemKind>) -> Vec<HostItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|(item_tag, item)| {
                *item_tag == tag && kind.map(|k| k == item.kind).unwrap_or(true)
            })
            .map(|(_, item)| item.clone())
            .collect()
    }

    async fn find_by_path(&self, path: &Path) -> Option<HostItem> {
        // Every virtual top-level folder is already known to the host.
        Some(HostItem {
            id: HostItemId(Uuid::new_v4()),
            kind: HostItemKind::Folder,
            path: Some(path.to_path_buf()),
        })
    }

    async fn first_entry_under(&self, path: &Path) -> Option<PathBuf> {
        Some(path.join("placeholder"))
    }

    async fn report_path_changed(&self, path: &Path) {
        self.reported_paths.lock().unwrap().push(path.to_path_buf());
    }

    async fn refresh_item(
        &self,
        item: HostItemId,
        _cancel: &CancellationToken,
    ) -> anibridge_core::Result<()> {
        self.refreshed.lock().unwrap().push(item);
        Ok(())
    }
}

// ----- harness --------------------------------------------------------------

struct Harness {
    dispatcher: EventDispatcher,
    catalog: Arc<FakeCatalog>,
    linker: Arc<FakeLinker>,
    host: Arc<FakeHost>,
    media_root: tempfile::TempDir,
}

impl Harness {
    fn new(catalog: FakeCatalog) -> Self {
        let media_root = tempfile::tempdir().unwrap();
        let catalog = Arc::new(catalog);
        let linker = Arc::new(FakeLinker::default());
        let host = Arc::new(FakeHost::default());

        let folders = vec![LibraryFolder {
            media_path: media_root.path().to_path_buf(),
            import_folder_id: ImportFolderId(1),
            import_folder_subpath: String::new(),
            virtual_root: Some(media_root.path().join(".vfs")),
            collection: CollectionKind::Shows,
        }];
        let resolver = Arc::new(MetadataResolver::new(
            catalog.clone() as Arc<dyn CatalogClient>,
            ResolverConfig {
                ordering: OrderingConfig::default(),
                tags: TagConfig::default(),
                cache: CacheConfig::default(),
                media_paths: vec![media_root.path().to_path_buf()],
            },
        ));

        let dispatcher = EventDispatcher::spawn(
            DispatchConfig {
                tick_interval_ms: 1_000,
                settle_threshold_ms: 5_000,
                intake_capacity: 512,
            },
            folders,
            resolver,
            catalog.clone() as Arc<dyn CatalogClient>,
            linker.clone() as Arc<dyn LinkGenerator>,
            host.clone() as Arc<dyn HostLibrary>,
            ScanGate::new(),
        );

        Self {
            dispatcher,
            catalog,
            linker,
            host,
            media_root,
        }
    }

    fn vfs_root(&self) -> PathBuf {
        self.media_root.path().join(".vfs")
    }

    /// Drop a real file under the media root so source-existence checks pass.
    fn place_file(&self, relative: &str) -> PathBuf {
        let path = self.media_root.path().join(relative.trim_start_matches('/'));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"media").unwrap();
        path
    }

    fn file_event(&self, file_id: i32, reason: ChangeReason, relative: &str) -> FileEvent {
        FileEvent {
            file_id: FileId(file_id),
            reason,
            import_folder_id: ImportFolderId(1),
            relative_path: relative.to_string(),
            cross_references: vec![xref(17, &[1])],
        }
    }
}

async fn settle() {
    // Past the settle threshold plus a couple of ticks.
    tokio::time::sleep(Duration::from_millis(8_000)).await;
}

// ----- tests ----------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn rapid_events_for_one_file_coalesce_into_a_single_batch() {
    let mut catalog = FakeCatalog::default();
    catalog.series.push(series(17));
    catalog.episodes.insert(17, vec![episode(1, 1)]);
    catalog
        .files
        .push(file_at(600, 17, &[1], &["/A/ep01.mkv"]));
    let harness = Harness::new(catalog);
    harness.place_file("/A/ep01.mkv");

    for _ in 0..5 {
        harness
            .dispatcher
            .on_file_event(harness.file_event(600, ChangeReason::Updated, "/A/ep01.mkv"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    settle().await;

    // One batch: the link set was generated and materialized exactly once.
    assert_eq!(harness.linker.generated.lock().unwrap().len(), 1);
    assert_eq!(harness.linker.materialized.lock().unwrap().len(), 1);

    harness.dispatcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn events_spaced_beyond_the_threshold_form_separate_batches() {
    let mut catalog = FakeCatalog::default();
    catalog.series.push(series(17));
    catalog.episodes.insert(17, vec![episode(1, 1)]);
    catalog
        .files
        .push(file_at(600, 17, &[1], &["/A/ep01.mkv"]));
    let harness = Harness::new(catalog);
    harness.place_file("/A/ep01.mkv");

    harness
        .dispatcher
        .on_file_event(harness.file_event(600, ChangeReason::Updated, "/A/ep01.mkv"))
        .await
        .unwrap();
    settle().await;
    harness
        .dispatcher
        .on_file_event(harness.file_event(600, ChangeReason::Updated, "/A/ep01.mkv"))
        .await
        .unwrap();
    settle().await;

    assert_eq!(harness.linker.generated.lock().unwrap().len(), 2);

    harness.dispatcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn removed_file_with_a_surviving_location_is_treated_as_a_relocation() {
    let mut catalog = FakeCatalog::default();
    catalog.series.push(series(17));
    catalog.episodes.insert(17, vec![episode(1, 1)]);
    // The catalog still reports file 500, now at the renamed path.
    catalog
        .files
        .push(file_at(500, 17, &[1], &["/A/ep01-v2.mkv"]));
    let harness = Harness::new(catalog);
    harness.place_file("/A/ep01-v2.mkv");

    // The old link is what the host currently knows for this file.
    let old_link = harness.vfs_root().join("Series 17").join("ep01.mkv");
    harness.host.tag_item(
        ProviderTag::File(FileId(500)),
        HostItemKind::Video,
        Some(old_link.clone()),
    );

    harness
        .dispatcher
        .on_file_event(FileEvent {
            file_id: FileId(500),
            reason: ChangeReason::Removed,
            import_folder_id: ImportFolderId(1),
            relative_path: "/A/ep01.mkv".to_string(),
            cross_references: vec![xref(17, &[1])],
        })
        .await
        .unwrap();
    settle().await;

    // Old links removed, new links created, file not treated as gone.
    let new_link = harness.vfs_root().join("Series 17").join("ep01-v2.mkv");
    assert_eq!(
        harness.linker.materialized.lock().unwrap().as_slice(),
        std::slice::from_ref(&new_link)
    );
    assert_eq!(
        harness.linker.removed.lock().unwrap().as_slice(),
        std::slice::from_ref(&old_link)
    );
    let reported = harness.host.reported_paths.lock().unwrap().clone();
    assert!(reported.contains(&old_link));
    assert!(reported.contains(&new_link));
    // One fetch to look for a surviving location; the cross-references came
    // from the event itself.
    assert_eq!(harness.catalog.file_fetches.load(Ordering::SeqCst), 1);

    harness.dispatcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn metadata_events_during_a_scan_defer_until_the_scan_clears() {
    let mut catalog = FakeCatalog::default();
    catalog.series.push(series(17));
    catalog
        .episodes
        .insert(17, (1..=50).map(|n| episode(n, n)).collect());
    let harness = Harness::new(catalog);

    // One host episode item per catalog episode.
    for n in 1..=50 {
        harness.host.tag_item(
            ProviderTag::Episode(EpisodeId(n)),
            HostItemKind::Episode,
            None,
        );
    }

    harness.dispatcher.scan_gate().set_scanning(true);

    // 200 updates across 50 distinct episodes, all during the scan.
    for _round in 0..4 {
        for n in 1..=50 {
            harness
                .dispatcher
                .on_metadata_event(MetadataEvent {
                    scope: MetadataScope::Episode,
                    reason: ChangeReason::Updated,
                    provider_uid: format!("episode:{n}"),
                    series_id: Some(SeriesId(17)),
                    episode_id: Some(EpisodeId(n)),
                })
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    settle().await;
    assert_eq!(harness.host.refresh_count(), 0, "no refreshes during a scan");

    harness.dispatcher.scan_gate().set_scanning(false);
    settle().await;

    // Exactly one refresh per affected tagged host item.
    assert_eq!(harness.host.refresh_count(), 50);

    harness.dispatcher.shutdown().await;
}
