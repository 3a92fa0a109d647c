use serde::{Deserialize, Serialize};

use crate::file::XrefIds;
use crate::ids::SeriesId;

/// How two series relate, as reported by the secondary catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Prequel,
    Sequel,
    MainStory,
    SideStory,
    FullStory,
    Summary,
    AlternativeVersion,
    AlternativeSetting,
    SameSetting,
    SharedCharacters,
    #[serde(other)]
    Other,
}

/// A directed relation from the owning series to `related`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub related: XrefIds<SeriesId>,
    #[serde(rename = "type")]
    pub kind: RelationKind,
}
