use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::EpisodeId;
use crate::rating::Rating;
use crate::title::Title;

/// Episode classification as reported by the secondary catalog.
///
/// Variant order matters: file episode lists sort by classification first,
/// so normal episodes come before specials and credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EpisodeKind {
    Normal,
    Special,
    Trailer,
    ThemeSong,
    OpeningSong,
    EndingSong,
    Parody,
    Interview,
    Extra,
    Other,
    #[serde(other)]
    Unknown,
}

/// Secondary-catalog (AniDB) sub-record for an episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnidbEpisode {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: EpisodeKind,
    pub episode_number: i32,
    pub air_date: Option<NaiveDate>,
    #[serde(default)]
    pub titles: Vec<Title>,
    #[serde(default)]
    pub description: String,
    pub rating: Option<Rating>,
}

/// One catalog episode entry, verbatim from the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub name: String,
    /// Number of local files the catalog has matched to this episode.
    #[serde(default)]
    pub file_count: u32,
    pub anidb: AnidbEpisode,
}

impl Episode {
    /// English title from the secondary catalog, used by extra-type
    /// heuristics. Falls back to the catalog-chosen display name.
    pub fn english_title(&self) -> &str {
        crate::title::preferred_title(&self.anidb.titles, "en").unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_episode_kinds_deserialize_to_unknown() {
        let kind: EpisodeKind = serde_json::from_str("\"HoloLens\"").unwrap();
        assert_eq!(kind, EpisodeKind::Unknown);
        let kind: EpisodeKind = serde_json::from_str("\"Special\"").unwrap();
        assert_eq!(kind, EpisodeKind::Special);
    }
}
