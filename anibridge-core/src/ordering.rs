//! Season ordering, default-season selection, and number assignment across
//! an assembled show.

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;

use chrono::NaiveDate;

use anibridge_config::{OrderingPolicy, SpecialsPlacement};
use anibridge_model::{EpisodeKind, Group, RelationKind};

use crate::error::{BridgeError, Result};
use crate::info::{EpisodeInfo, SeasonInfo, ShowInfo};

/// Priority used when comparing seasons through their relation lists. Lower
/// sorts earlier; relations outside this table do not participate.
fn relation_priority(kind: RelationKind) -> Option<u32> {
    match kind {
        RelationKind::Prequel => Some(1),
        RelationKind::MainStory => Some(2),
        RelationKind::FullStory => Some(3),
        RelationKind::AlternativeVersion => Some(21),
        RelationKind::SameSetting => Some(22),
        RelationKind::AlternativeSetting => Some(23),
        RelationKind::SideStory => Some(41),
        RelationKind::Summary => Some(42),
        RelationKind::Sequel => Some(43),
        RelationKind::SharedCharacters => Some(99),
        RelationKind::Other => None,
    }
}

/// Compare two seasons chronologically using the relation graph.
///
/// Direct relations win; indirect relations are compared by priority lists;
/// unrelated seasons fall back to air dates. One side of a direct relation
/// may be missing when the catalog's entries are out of sync, so both sides
/// are consulted.
pub fn chronological_cmp(a: &SeasonInfo, b: &SeasonInfo) -> CmpOrdering {
    let direct = compare_direct_relations(a, b);
    if direct != CmpOrdering::Equal {
        return direct;
    }

    let indirect = compare_indirect_relations(a, b);
    if indirect != CmpOrdering::Equal {
        return indirect;
    }

    compare_air_dates(a.air_date(), b.air_date())
}

fn compare_direct_relations(a: &SeasonInfo, b: &SeasonInfo) -> CmpOrdering {
    if let Some(kind) = a.relation_map.get(&b.id) {
        match kind {
            RelationKind::Prequel | RelationKind::MainStory => return CmpOrdering::Less,
            RelationKind::Sequel | RelationKind::SideStory => return CmpOrdering::Greater,
            _ => {}
        }
    }
    if let Some(kind) = b.relation_map.get(&a.id) {
        match kind {
            RelationKind::Prequel | RelationKind::MainStory => return CmpOrdering::Greater,
            RelationKind::Sequel | RelationKind::SideStory => return CmpOrdering::Less,
            _ => {}
        }
    }
    CmpOrdering::Equal
}

fn compare_indirect_relations(a: &SeasonInfo, b: &SeasonInfo) -> CmpOrdering {
    let priorities = |season: &SeasonInfo| {
        let mut list: Vec<u32> = season
            .relations()
            .iter()
            .filter_map(|r| relation_priority(r.kind))
            .collect();
        list.sort_unstable();
        list
    };
    let a_list = priorities(a);
    let b_list = priorities(b);

    for i in 0..a_list.len().max(b_list.len()) {
        // The season with fewer relations overall sorts after the other.
        let Some(a_priority) = a_list.get(i) else {
            return CmpOrdering::Greater;
        };
        let Some(b_priority) = b_list.get(i) else {
            return CmpOrdering::Less;
        };
        let comparison = a_priority.cmp(b_priority);
        if comparison != CmpOrdering::Equal {
            return comparison;
        }
    }
    CmpOrdering::Equal
}

fn compare_air_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> CmpOrdering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => CmpOrdering::Greater,
        (None, Some(_)) => CmpOrdering::Less,
        (None, None) => CmpOrdering::Equal,
    }
}

/// Order member seasons per the configured policy.
pub fn order_seasons(seasons: &mut [Arc<SeasonInfo>], policy: OrderingPolicy) {
    match policy {
        OrderingPolicy::AsGiven => {}
        OrderingPolicy::ReleaseDate => {
            seasons.sort_by_key(|s| s.air_date().unwrap_or(NaiveDate::MAX));
        }
        OrderingPolicy::Chronological => {
            seasons.sort_by(|a, b| chronological_cmp(a, b));
        }
    }
}

/// Pick the default season's index in an already-ordered member list.
///
/// A configured group default that is absent from the members is a fatal
/// inconsistency: silently guessing would mis-number every season.
pub fn pick_default_index(
    group: Option<&Group>,
    seasons: &[Arc<SeasonInfo>],
    policy: OrderingPolicy,
) -> Result<usize> {
    if seasons.is_empty() {
        let scope = group
            .map(|g| format!("group {}", g.id()))
            .unwrap_or_else(|| "show".to_string());
        return Err(BridgeError::Inconsistent(format!(
            "{scope} has no member seasons to choose a default from"
        )));
    }

    if let Some(group) = group {
        if let Some(main) = group.ids.main_series {
            return seasons
                .iter()
                .position(|s| s.id == main)
                .ok_or_else(|| {
                    BridgeError::Inconsistent(format!(
                        "group {} names series {main} as its default, but it is not among the members",
                        group.id()
                    ))
                });
        }
    }

    if policy == OrderingPolicy::ReleaseDate {
        return Ok(0);
    }

    // Narratively earliest: earliest air date, ties broken by position.
    Ok(seasons
        .iter()
        .enumerate()
        .min_by_key(|(index, s)| (s.air_date().unwrap_or(NaiveDate::MAX), *index))
        .map(|(index, _)| index)
        .unwrap_or(0))
}

/// Where a special lands relative to the numbered seasons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialPlacement {
    pub airs_before_episode: Option<i32>,
    pub airs_before_season: Option<i32>,
    pub airs_after_season: Option<i32>,
    pub is_special: bool,
}

/// Season number for an episode within a show. Alternate-ordering episodes
/// land on the number after their parent season's base.
pub fn season_number(show: &ShowInfo, season: &SeasonInfo, episode: &EpisodeInfo) -> Result<i32> {
    let base = show.number_for_season(season.id).ok_or_else(|| {
        BridgeError::Internal(format!(
            "season {} is not part of show {}",
            season.id, show.id
        ))
    })?;
    Ok(match episode.kind {
        EpisodeKind::Other => base + 1,
        _ => base,
    })
}

/// Index number for an episode within a show.
///
/// Specials and extras number sequentially across the show's seasons;
/// everything else keeps its declared number, offset past the buckets the
/// catalog counts before it when a stray classification slipped through.
pub fn episode_number(show: &ShowInfo, season: &SeasonInfo, episode: &EpisodeInfo) -> Result<i32> {
    let season_index = show
        .seasons
        .iter()
        .position(|s| s.id == season.id)
        .ok_or_else(|| {
            BridgeError::Internal(format!(
                "season {} is not part of show {}",
                season.id, show.id
            ))
        })?;

    if episode.extra_kind.is_some() {
        let index = season
            .extras
            .iter()
            .position(|e| e.id == episode.id)
            .ok_or_else(|| {
                BridgeError::Internal(format!(
                    "episode {} is not in the extras of season {}",
                    episode.id, season.id
                ))
            })?;
        let offset: usize = show.seasons[..season_index]
            .iter()
            .map(|s| s.extras.len())
            .sum();
        return Ok((offset + index + 1) as i32);
    }

    if episode.kind == EpisodeKind::Special {
        let index = season
            .specials
            .iter()
            .position(|e| e.id == episode.id)
            .ok_or_else(|| {
                BridgeError::Internal(format!(
                    "episode {} is not in the specials of season {}",
                    episode.id, season.id
                ))
            })?;
        let offset: usize = show.seasons[..season_index]
            .iter()
            .map(|s| s.specials.len())
            .sum();
        return Ok((offset + index + 1) as i32);
    }

    let sizes = season.record.sizes;
    let offset = match episode.kind {
        EpisodeKind::Normal | EpisodeKind::Other => 0,
        EpisodeKind::Parody => sizes.episodes,
        EpisodeKind::OpeningSong | EpisodeKind::ThemeSong | EpisodeKind::EndingSong => {
            sizes.episodes + sizes.parodies
        }
        EpisodeKind::Trailer => sizes.episodes + sizes.parodies + sizes.credits,
        _ => sizes.episodes + sizes.parodies + sizes.credits + sizes.trailers,
    };
    Ok(offset as i32 + episode.episode_number())
}

/// Compute where a special should be placed for host layout purposes.
pub fn special_placement(
    show: &ShowInfo,
    season: &SeasonInfo,
    episode: &EpisodeInfo,
    placement: SpecialsPlacement,
) -> Result<SpecialPlacement> {
    if placement == SpecialsPlacement::Excluded {
        return Ok(SpecialPlacement {
            is_special: episode.is_special(),
            ..SpecialPlacement::default()
        });
    }

    if !episode.is_special() {
        return Ok(SpecialPlacement::default());
    }

    let season_num = season_number(show, season, episode)?;
    let mut result = SpecialPlacement {
        is_special: true,
        ..SpecialPlacement::default()
    };

    match placement {
        SpecialsPlacement::ByAirDate => {
            let anchor_number = season
                .specials_anchors
                .get(&episode.id)
                .and_then(|anchor_id| season.find_episode(*anchor_id))
                .map(|anchor| episode_number(show, season, anchor))
                .transpose()?;
            match anchor_number {
                Some(number) if (number as usize) < season.episodes.len() => {
                    result.airs_before_episode = Some(number + 1);
                    result.airs_before_season = Some(season_num);
                }
                _ => result.airs_after_season = Some(season_num),
            }
        }
        SpecialsPlacement::AfterSeason | SpecialsPlacement::Excluded => {
            result.airs_after_season = Some(season_num);
        }
    }

    Ok(result)
}
