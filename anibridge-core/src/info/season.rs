use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use anibridge_config::OrderingConfig;
use anibridge_model::{
    EpisodeId, EpisodeKind, File, Rating, Relation, RelationKind, Role, RoleKind, Series,
    SeriesId, SeriesKind,
};

use super::episode::EpisodeInfo;

/// Host-side person categories a catalog credit can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonKind {
    Director,
    Producer,
    Lyricist,
    Writer,
    Composer,
    Actor,
}

/// One credited person, ready for host consumption.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StaffMember {
    pub kind: PersonKind,
    pub name: String,
    /// Credited role: the character for voice actors, the credit name
    /// otherwise.
    pub role: Option<String>,
}

fn role_to_staff(role: &Role) -> Option<StaffMember> {
    let kind = match role.kind {
        RoleKind::Director => PersonKind::Director,
        RoleKind::Producer => PersonKind::Producer,
        RoleKind::Music => PersonKind::Lyricist,
        RoleKind::SourceWork => PersonKind::Writer,
        RoleKind::SeriesComposer => PersonKind::Composer,
        RoleKind::Seiyuu => PersonKind::Actor,
        RoleKind::Studio | RoleKind::Staff => return None,
    };
    let role_name = if role.kind == RoleKind::Seiyuu {
        role.character_name.clone()
    } else if role.name.is_empty() {
        None
    } else {
        Some(role.name.clone())
    };
    Some(StaffMember {
        kind,
        name: role.staff_name.clone(),
        role: role_name,
    })
}

/// The resolved, per-series view: one season-equivalent catalog entry with
/// its episodes bucketed, specials anchored, and credits flattened.
#[derive(Debug, Clone)]
pub struct SeasonInfo {
    pub id: SeriesId,
    /// Series classification after reclassification rules ran; may differ
    /// from `record.anidb.kind`.
    pub kind: SeriesKind,
    pub record: Series,
    pub tags: Vec<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    pub staff: Vec<StaffMember>,
    /// Every episode of the series, ordered by air date. The buckets below
    /// partition this list.
    pub raw_episodes: Vec<Arc<EpisodeInfo>>,
    /// Normal episodes, ordered by declared episode number.
    pub episodes: Vec<Arc<EpisodeInfo>>,
    /// Alternate-ordering episodes, ordered by declared episode number.
    pub alternates: Vec<Arc<EpisodeInfo>>,
    /// Specials without a derived extra kind, ordered by declared number.
    pub specials: Vec<Arc<EpisodeInfo>>,
    /// Episodes with a derived extra kind, in air-date order.
    pub extras: Vec<Arc<EpisodeInfo>>,
    /// Episodes no other bucket claims, in air-date order.
    pub others: Vec<Arc<EpisodeInfo>>,
    /// Each special mapped to the normal episode it logically follows.
    pub specials_anchors: HashMap<EpisodeId, EpisodeId>,
    /// Reverse lookup over `record.relations`.
    pub relation_map: HashMap<SeriesId, RelationKind>,
    pub earliest_imported_at: Option<DateTime<Utc>>,
    pub latest_imported_at: Option<DateTime<Utc>>,
}

impl SeasonInfo {
    /// Build the per-series view from raw records.
    ///
    /// Bucketing happens in one pass over the episodes in air-date order so
    /// each special can anchor to the most recent normal episode that aired
    /// before it. Buckets are then re-sorted by declared episode number;
    /// air-date order was only needed for anchor computation.
    pub fn new(
        series: Series,
        episodes: Vec<EpisodeInfo>,
        cast: &[Role],
        genres: Vec<String>,
        tags: Vec<String>,
        files: &[File],
        ordering: &OrderingConfig,
    ) -> Self {
        let mut raw: Vec<Arc<EpisodeInfo>> = episodes.into_iter().map(Arc::new).collect();
        raw.sort_by_key(|e| e.air_date());

        let mut kind = series.anidb.kind;
        let mut normals = Vec::new();
        let mut alternates = Vec::new();
        let mut specials = Vec::new();
        let mut extras = Vec::new();
        let mut others = Vec::new();

        for episode in &raw {
            match episode.kind {
                EpisodeKind::Normal => normals.push(Arc::clone(episode)),
                EpisodeKind::Other => alternates.push(Arc::clone(episode)),
                _ if episode.extra_kind.is_some() => extras.push(Arc::clone(episode)),
                EpisodeKind::Special => specials.push(Arc::clone(episode)),
                _ => others.push(Arc::clone(episode)),
            }
        }

        // The main entry may be hidden while parts of it remain on disk; in
        // that case the alternate episodes become the season, and a movie
        // split into parts is reclassified as a web release.
        if normals.is_empty() && alternates.iter().any(|e| e.has_files()) {
            if kind == SeriesKind::Movie {
                kind = SeriesKind::Web;
            }
            normals = std::mem::take(&mut alternates);
        } else if kind == SeriesKind::TvSpecial {
            // A TV special's "episodes" are specials as far as the host is
            // concerned.
            specials.extend(normals.drain(..));
            specials.extend(alternates.drain(..));
        }

        let mut specials_anchors =
            compute_anchors(&raw, &id_set(&normals), &id_set(&specials));

        if ordering.collapse_movie_extras && kind == SeriesKind::Movie {
            extras.extend(specials.drain(..));
            extras.extend(alternates.drain(..));
            specials_anchors.clear();
        }

        normals.sort_by_key(|e| e.episode_number());
        alternates.sort_by_key(|e| e.episode_number());
        specials.sort_by_key(|e| e.episode_number());

        let studios = cast
            .iter()
            .filter(|role| role.kind == RoleKind::Studio)
            .map(|role| role.staff_name.clone())
            .collect();
        let staff = cast.iter().filter_map(role_to_staff).collect();

        let relation_map = series
            .relations
            .iter()
            .filter_map(|relation| relation.related.id.map(|id| (id, relation.kind)))
            .collect();

        let earliest_imported_at = files.iter().filter_map(|f| f.imported_at).min();
        let latest_imported_at = files.iter().filter_map(|f| f.imported_at).max();

        Self {
            id: series.ids.id,
            kind,
            record: series,
            tags,
            genres,
            studios,
            staff,
            raw_episodes: raw,
            episodes: normals,
            alternates,
            specials,
            extras,
            others,
            specials_anchors,
            relation_map,
            earliest_imported_at,
            latest_imported_at,
        }
    }

    pub fn air_date(&self) -> Option<NaiveDate> {
        self.record.anidb.air_date
    }

    pub fn rating(&self) -> Option<Rating> {
        self.record.anidb.rating
    }

    pub fn relations(&self) -> &[Relation] {
        &self.record.relations
    }

    /// Episode ids present in any non-extra bucket, the set the dispatcher
    /// consults when partitioning metadata refreshes.
    pub fn presentable_episode_ids(&self) -> impl Iterator<Item = EpisodeId> + '_ {
        self.episodes
            .iter()
            .chain(&self.alternates)
            .chain(&self.specials)
            .map(|e| e.id)
    }

    /// Look up an episode across every bucket.
    pub fn find_episode(&self, id: EpisodeId) -> Option<&Arc<EpisodeInfo>> {
        self.raw_episodes.iter().find(|e| e.id == id)
    }
}

fn id_set(episodes: &[Arc<EpisodeInfo>]) -> HashSet<EpisodeId> {
    episodes.iter().map(|e| e.id).collect()
}

/// Walk the air-date-ordered episode list and anchor every special to the
/// nearest preceding normal episode. A special that airs before the first
/// normal episode gets no anchor.
fn compute_anchors(
    raw: &[Arc<EpisodeInfo>],
    normal_ids: &HashSet<EpisodeId>,
    special_ids: &HashSet<EpisodeId>,
) -> HashMap<EpisodeId, EpisodeId> {
    let mut anchors = HashMap::new();
    let mut last_normal: Option<EpisodeId> = None;
    for episode in raw {
        if normal_ids.contains(&episode.id) {
            last_normal = Some(episode.id);
        } else if special_ids.contains(&episode.id) {
            if let Some(anchor) = last_normal {
                anchors.insert(episode.id, anchor);
            }
        }
    }
    anchors
}
