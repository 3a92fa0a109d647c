use serde::{Deserialize, Serialize};

/// Kind of credit a staff member holds on a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Director,
    Producer,
    Music,
    SourceWork,
    SeriesComposer,
    /// Voice actor; `character` names the credited character.
    Seiyuu,
    Studio,
    #[serde(other)]
    Staff,
}

/// A person (or studio) credited on a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "type")]
    pub kind: RoleKind,
    /// Name of the credited role itself ("Animation Work", "Chief Direction", …).
    #[serde(default)]
    pub name: String,
    pub staff_name: String,
    pub character_name: Option<String>,
}
