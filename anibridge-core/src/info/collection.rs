use std::collections::HashSet;
use std::sync::Arc;

use anibridge_config::OrderingConfig;
use anibridge_model::{Group, GroupId};

use crate::error::Result;
use crate::ordering::{order_seasons, pick_default_index};

use super::season::SeasonInfo;

/// A catalog group resolved as grouping input: its member seasons, the
/// chosen default, and the union of their descriptive fields. Box-set
/// construction on top of this happens host-side.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub id: GroupId,
    pub parent_id: Option<GroupId>,
    pub is_top_level: bool,
    pub name: String,
    pub record: Group,
    /// Member seasons in presentation order.
    pub seasons: Vec<Arc<SeasonInfo>>,
    pub default_season: Arc<SeasonInfo>,
    pub tags: Vec<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
}

impl CollectionInfo {
    pub fn new(
        group: Group,
        mut seasons: Vec<Arc<SeasonInfo>>,
        ordering: &OrderingConfig,
    ) -> Result<Self> {
        let policy = super::show::policy_for_members(&seasons, ordering);
        order_seasons(&mut seasons, policy);
        let default_index = pick_default_index(Some(&group), &seasons, policy)?;
        let default_season = Arc::clone(&seasons[default_index]);

        let mut tags = Vec::new();
        let mut genres = Vec::new();
        let mut studios = Vec::new();
        let mut seen = HashSet::new();
        for season in &seasons {
            for tag in &season.tags {
                if seen.insert(("tag", tag.clone())) {
                    tags.push(tag.clone());
                }
            }
            for genre in &season.genres {
                if seen.insert(("genre", genre.clone())) {
                    genres.push(genre.clone());
                }
            }
            for studio in &season.studios {
                if seen.insert(("studio", studio.clone())) {
                    studios.push(studio.clone());
                }
            }
        }

        Ok(Self {
            id: group.id(),
            parent_id: group.ids.parent_group,
            is_top_level: group.is_top_level(),
            name: group.name.clone(),
            record: group,
            seasons,
            default_season,
            tags,
            genres,
            studios,
        })
    }
}
