use serde::{Deserialize, Serialize};

use crate::ids::{GroupId, SeriesId};

/// Identifier block for a group entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupIds {
    pub id: GroupId,
    pub parent_group: Option<GroupId>,
    pub top_level_group: GroupId,
    /// The series the catalog user picked as the face of the group, when
    /// one was configured.
    pub main_series: Option<SeriesId>,
}

/// One catalog group entry: a curated set of related series presented as a
/// single multi-season show (or a nested collection of shows).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub ids: GroupIds,
    pub name: String,
    #[serde(default)]
    pub series_count: u32,
}

impl Group {
    pub fn id(&self) -> GroupId {
        self.ids.id
    }

    pub fn is_top_level(&self) -> bool {
        self.ids.top_level_group == self.ids.id
    }
}
