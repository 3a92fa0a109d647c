use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::info::{CollectionInfo, EpisodeInfo, FileInfo, SeasonInfo, ShowInfo};

use super::SeriesPaths;

/// A constructed info object parked in the cache.
#[derive(Debug, Clone)]
pub(crate) enum CachedValue {
    Episode(Arc<EpisodeInfo>),
    Season(Arc<SeasonInfo>),
    Show(Arc<ShowInfo>),
    File(Arc<FileInfo>),
    Collection(Arc<CollectionInfo>),
    SeriesPaths(Arc<SeriesPaths>),
}

#[derive(Debug)]
struct Entry {
    value: CachedValue,
    written_at: Instant,
}

/// TTL cache for constructed info objects, keyed by composite strings like
/// `season:17` or `file:500:17`.
///
/// `clear` swaps in a fresh generation instead of draining the map, so
/// in-flight resolutions holding the old `Arc` complete against a consistent
/// snapshot. Expired entries are evicted lazily on access.
#[derive(Debug)]
pub(crate) struct InfoCache {
    ttl: Duration,
    generation: RwLock<Arc<DashMap<String, Entry>>>,
}

impl InfoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: RwLock::new(Arc::new(DashMap::new())),
        }
    }

    fn map(&self) -> Arc<DashMap<String, Entry>> {
        Arc::clone(&self.generation.read().expect("cache lock poisoned"))
    }

    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let map = self.map();
        let expired = match map.get(key) {
            Some(entry) if entry.written_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            map.remove(key);
        }
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: CachedValue) {
        self.map().insert(
            key.into(),
            Entry {
                value,
                written_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        debug!("clearing info cache");
        *self.generation.write().expect("cache lock poisoned") = Arc::new(DashMap::new());
    }

    /// Drop every entry whose key matches the predicate.
    pub fn remove_where(&self, predicate: impl Fn(&str) -> bool) {
        self.map().retain(|key, _| !predicate(key));
    }

    pub fn get_episode(&self, key: &str) -> Option<Arc<EpisodeInfo>> {
        match self.get(key) {
            Some(CachedValue::Episode(info)) => Some(info),
            _ => None,
        }
    }

    pub fn get_season(&self, key: &str) -> Option<Arc<SeasonInfo>> {
        match self.get(key) {
            Some(CachedValue::Season(info)) => Some(info),
            _ => None,
        }
    }

    pub fn get_show(&self, key: &str) -> Option<Arc<ShowInfo>> {
        match self.get(key) {
            Some(CachedValue::Show(info)) => Some(info),
            _ => None,
        }
    }

    pub fn get_file(&self, key: &str) -> Option<Arc<FileInfo>> {
        match self.get(key) {
            Some(CachedValue::File(info)) => Some(info),
            _ => None,
        }
    }

    pub fn get_collection(&self, key: &str) -> Option<Arc<CollectionInfo>> {
        match self.get(key) {
            Some(CachedValue::Collection(info)) => Some(info),
            _ => None,
        }
    }

    pub fn get_series_paths(&self, key: &str) -> Option<Arc<SeriesPaths>> {
        match self.get(key) {
            Some(CachedValue::SeriesPaths(paths)) => Some(paths),
            _ => None,
        }
    }
}
