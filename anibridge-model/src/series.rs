use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{GroupId, SeriesId};
use crate::rating::Rating;
use crate::relation::Relation;
use crate::title::Title;

/// Series classification as reported by the secondary catalog.
///
/// The resolver may reclassify a series after bucketing (a movie whose main
/// entry is hidden while its parts remain becomes `Web`), so this is a
/// starting point rather than a fixed fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    #[serde(rename = "TV")]
    Tv,
    #[serde(rename = "TVSpecial")]
    TvSpecial,
    Web,
    Movie,
    #[serde(rename = "OVA")]
    Ova,
    Other,
    #[serde(other)]
    Unknown,
}

/// Identifier block for a series entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesIds {
    pub id: SeriesId,
    pub parent_group: GroupId,
    pub top_level_group: GroupId,
    pub anidb: i32,
}

/// Episode-count breakdown the catalog maintains per series.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SeriesSizes {
    #[serde(default)]
    pub episodes: u32,
    #[serde(default)]
    pub specials: u32,
    #[serde(default)]
    pub trailers: u32,
    #[serde(default)]
    pub parodies: u32,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub others: u32,
}

/// Secondary-catalog (AniDB) sub-record for a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnidbSeries {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    pub air_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub titles: Vec<Title>,
    #[serde(default)]
    pub description: String,
    pub rating: Option<Rating>,
}

/// One catalog series entry (a single season-equivalent release).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub ids: SeriesIds,
    pub name: String,
    #[serde(default)]
    pub sizes: SeriesSizes,
    pub anidb: AnidbSeries,
    /// Relations to other series, used for chronological season ordering.
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Series {
    pub fn id(&self) -> SeriesId {
        self.ids.id
    }
}
