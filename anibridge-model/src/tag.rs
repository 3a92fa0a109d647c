use serde::{Deserialize, Serialize};

/// A weighted tag attached to a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub weight: u32,
}

/// Server-side tag filter bitmask passed to the tags endpoint.
///
/// Individual bits hide tag categories; composed masks select a single
/// category instead. The numeric layout is owned by the catalog server, so
/// this type only names the values the bridge actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFilter(pub u64);

impl TagFilter {
    /// Baseline for tag queries: genres and source material excluded.
    pub const TAGS: TagFilter = TagFilter(132);
    /// Only genre tags.
    pub const GENRES: TagFilter = TagFilter(2_147_483_776);
    /// Only the source-material tag.
    pub const SOURCE: TagFilter = TagFilter(2_147_483_652);

    pub fn with_bit(self, bit: u64) -> TagFilter {
        TagFilter(self.0 | bit)
    }
}
