use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use anibridge_model::{ImportFolderId, TagFilter};

/// Connection details for the remote catalog server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog's HTTP API, e.g. `http://localhost:8111`.
    pub base_url: String,
    /// API key issued by the catalog server.
    pub api_key: String,
    /// Language used when picking display titles.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// What a library folder holds, from the host's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Movies,
    #[default]
    Shows,
    Mixed,
}

/// One host library folder mapped onto a catalog import folder.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryFolder {
    /// Absolute path of the media folder as the host sees it.
    pub media_path: PathBuf,
    /// The catalog import folder backing this media folder.
    pub import_folder_id: ImportFolderId,
    /// Sub-path within the import folder this media folder maps to. Empty
    /// means the whole import folder.
    #[serde(default)]
    pub import_folder_subpath: String,
    /// Root of the virtual link tree for this folder. `None` disables the
    /// virtual layer: physical paths are reported to the host directly.
    #[serde(default)]
    pub virtual_root: Option<PathBuf>,
    #[serde(default)]
    pub collection: CollectionKind,
}

impl LibraryFolder {
    /// Whether a catalog-relative path falls under this folder's mapping.
    pub fn covers(&self, import_folder_id: ImportFolderId, relative_path: &str) -> bool {
        self.import_folder_id == import_folder_id
            && (self.import_folder_subpath.is_empty()
                || relative_path.starts_with(&self.import_folder_subpath))
    }
}

/// How member seasons are ordered when assembling a multi-season show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Keep the order the catalog returned.
    #[default]
    AsGiven,
    /// Order members by their first air date.
    ReleaseDate,
    /// Order members by walking the relation graph chronologically.
    Chronological,
}

/// Where special episodes land when the host lays out a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialsPlacement {
    /// Keep specials out of the numbered seasons entirely.
    Excluded,
    /// Place every special after the season it belongs to.
    #[default]
    AfterSeason,
    /// Interleave specials between normal episodes using their anchors.
    ByAirDate,
}

/// Season ordering and specials handling.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Combine every series of a catalog group into one multi-season show.
    /// When off, each series becomes its own single-season show.
    pub use_groups: bool,
    pub season_ordering: OrderingPolicy,
    /// Ordering used when a group is filtered down to its movies.
    pub movie_ordering: OrderingPolicy,
    pub specials_placement: SpecialsPlacement,
    /// Fold specials and alternate episodes of movie-typed series into the
    /// extras bucket instead of presenting them as episodes.
    pub collapse_movie_extras: bool,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            use_groups: false,
            season_ordering: OrderingPolicy::AsGiven,
            movie_ordering: OrderingPolicy::ReleaseDate,
            specials_placement: SpecialsPlacement::AfterSeason,
            collapse_movie_extras: false,
        }
    }
}

/// Dispatcher timing. The tick interval drives settle detection: a key's
/// batch flushes once its newest event is older than the settle threshold.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How often the settle timer fires.
    pub tick_interval_ms: u64,
    /// Quiet period after the last event before a key's batch is processed.
    pub settle_threshold_ms: u64,
    /// Capacity of the intake channel between the host callbacks and the
    /// buffering table. Overflow applies backpressure to the caller.
    pub intake_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 4_000,
            settle_threshold_ms: 5_000,
            intake_capacity: 512,
        }
    }
}

/// Resolver cache lifetime.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a constructed info object stays valid. Entries past this age
    /// are treated as misses and rebuilt from a fresh fetch.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 90 * 60 }
    }
}

/// Which tag categories to hide from the host.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TagConfig {
    pub hide_anidb_tags: bool,
    pub hide_art_style_tags: bool,
    pub hide_misc_tags: bool,
    pub hide_plot_tags: bool,
    pub hide_setting_tags: bool,
    pub hide_programming_tags: bool,
}

impl TagConfig {
    /// Fold the hide flags into the server-side filter bitmask.
    pub fn to_filter(&self) -> TagFilter {
        let mut filter = TagFilter::TAGS;
        if self.hide_anidb_tags {
            filter = filter.with_bit(1 << 0);
        }
        if self.hide_art_style_tags {
            filter = filter.with_bit(1 << 1);
        }
        if self.hide_misc_tags {
            filter = filter.with_bit(1 << 3);
        }
        if self.hide_plot_tags {
            filter = filter.with_bit(1 << 4);
        }
        if self.hide_setting_tags {
            filter = filter.with_bit(1 << 5);
        }
        if self.hide_programming_tags {
            filter = filter.with_bit(1 << 6);
        }
        filter
    }
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ordering: OrderingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub tags: TagConfig,
    #[serde(default, rename = "folder")]
    pub folders: Vec<LibraryFolder>,
}
