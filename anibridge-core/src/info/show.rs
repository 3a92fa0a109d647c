use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use anibridge_config::{OrderingConfig, OrderingPolicy};
use anibridge_model::{EpisodeId, Group, GroupId, Rating, SeriesId, SeriesKind};

use crate::error::Result;
use crate::ordering::{order_seasons, pick_default_index};

use super::season::{SeasonInfo, StaffMember};

/// Movie-only groups order by the movie policy, everything else by the
/// season policy.
pub(crate) fn policy_for_members(
    seasons: &[Arc<SeasonInfo>],
    ordering: &OrderingConfig,
) -> OrderingPolicy {
    if !seasons.is_empty() && seasons.iter().all(|s| s.kind == SeriesKind::Movie) {
        ordering.movie_ordering
    } else {
        ordering.season_ordering
    }
}

/// One or more seasons combined into a single show.
///
/// Season numbers are anchored at the default season: it is always number 1,
/// later members count upward and earlier members count downward into the
/// non-positive range. A member with a non-empty alternate or other bucket
/// consumes the number directly after its own.
#[derive(Debug, Clone)]
pub struct ShowInfo {
    /// The default season's id doubles as the show's id.
    pub id: SeriesId,
    pub group_id: Option<GroupId>,
    pub name: String,
    pub tags: Vec<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    pub staff: Vec<StaffMember>,
    /// Member seasons in presentation order.
    pub seasons: Vec<Arc<SeasonInfo>>,
    /// Season number to season id; alternate/other sub-seasons make this a
    /// many-to-one mapping.
    pub season_numbers: BTreeMap<i32, SeriesId>,
    /// Season id to its base (primary) season number.
    base_numbers: HashMap<SeriesId, i32>,
    pub default_season: Arc<SeasonInfo>,
    /// Every specials-bucket episode across the member seasons.
    pub specials: HashSet<EpisodeId>,
}

impl ShowInfo {
    /// A standalone show built from a single series.
    pub fn from_single(season: Arc<SeasonInfo>) -> Self {
        Self::assemble(vec![season], 0, None)
    }

    /// A multi-season show built from a group's member seasons.
    ///
    /// Fails loudly when the group is empty or names a default series that
    /// is not among the members; guessing would mis-number every season.
    pub fn from_group(
        group: &Group,
        mut seasons: Vec<Arc<SeasonInfo>>,
        ordering: &OrderingConfig,
    ) -> Result<Self> {
        let policy = policy_for_members(&seasons, ordering);
        order_seasons(&mut seasons, policy);
        let default_index = pick_default_index(Some(group), &seasons, policy)?;
        Ok(Self::assemble(seasons, default_index, Some(group.id())))
    }

    fn assemble(
        seasons: Vec<Arc<SeasonInfo>>,
        default_index: usize,
        group_id: Option<GroupId>,
    ) -> Self {
        debug_assert!(default_index < seasons.len());

        let numbers_consumed = |season: &SeasonInfo| -> i32 {
            1 + i32::from(!season.alternates.is_empty()) + i32::from(!season.others.is_empty())
        };

        // Walk outward from the default season so its base is pinned at 1.
        let mut bases = vec![0i32; seasons.len()];
        bases[default_index] = 1;
        for index in default_index + 1..seasons.len() {
            bases[index] = bases[index - 1] + numbers_consumed(&seasons[index - 1]);
        }
        for index in (0..default_index).rev() {
            bases[index] = bases[index + 1] - numbers_consumed(&seasons[index]);
        }

        let mut season_numbers = BTreeMap::new();
        let mut base_numbers = HashMap::new();
        for (season, base) in seasons.iter().zip(&bases) {
            base_numbers.insert(season.id, *base);
            season_numbers.insert(*base, season.id);
            let mut next = *base;
            if !season.alternates.is_empty() {
                next += 1;
                season_numbers.insert(next, season.id);
            }
            if !season.others.is_empty() {
                next += 1;
                season_numbers.insert(next, season.id);
            }
        }

        let mut tags = Vec::new();
        let mut genres = Vec::new();
        let mut studios = Vec::new();
        let mut staff = Vec::new();
        let mut seen_tags = HashSet::new();
        let mut seen_genres = HashSet::new();
        let mut seen_studios = HashSet::new();
        let mut seen_staff = HashSet::new();
        let mut specials = HashSet::new();
        for season in &seasons {
            for tag in &season.tags {
                if seen_tags.insert(tag.clone()) {
                    tags.push(tag.clone());
                }
            }
            for genre in &season.genres {
                if seen_genres.insert(genre.clone()) {
                    genres.push(genre.clone());
                }
            }
            for studio in &season.studios {
                if seen_studios.insert(studio.clone()) {
                    studios.push(studio.clone());
                }
            }
            for member in &season.staff {
                if seen_staff.insert(member.clone()) {
                    staff.push(member.clone());
                }
            }
            specials.extend(season.specials.iter().map(|e| e.id));
        }

        let default_season = Arc::clone(&seasons[default_index]);

        Self {
            id: default_season.id,
            group_id,
            name: default_season.record.name.clone(),
            tags,
            genres,
            studios,
            staff,
            seasons,
            season_numbers,
            base_numbers,
            default_season,
            specials,
        }
    }

    pub fn season_by_number(&self, number: i32) -> Option<&Arc<SeasonInfo>> {
        let id = self.season_numbers.get(&number)?;
        self.seasons.iter().find(|s| s.id == *id)
    }

    pub fn number_for_season(&self, id: SeriesId) -> Option<i32> {
        self.base_numbers.get(&id).copied()
    }

    pub fn season_for_episode(&self, id: EpisodeId) -> Option<&Arc<SeasonInfo>> {
        self.seasons
            .iter()
            .find(|s| s.find_episode(id).is_some())
    }

    /// Premiere date and rating anchor on the default season.
    pub fn premiere_date(&self) -> Option<NaiveDate> {
        self.default_season.air_date()
    }

    pub fn rating(&self) -> Option<Rating> {
        self.default_season.rating()
    }
}
