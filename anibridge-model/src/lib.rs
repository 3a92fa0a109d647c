//! Wire-level data model for the remote anime catalog consumed by AniBridge.
//!
//! Everything in this crate mirrors what the catalog server sends over the
//! wire. Records are plain data: enrichment, cross-referencing, and season
//! assembly happen in `anibridge-core` on top of these shapes.
#![allow(missing_docs)]

pub mod episode;
pub mod error;
pub mod file;
pub mod group;
pub mod ids;
pub mod rating;
pub mod relation;
pub mod role;
pub mod series;
pub mod tag;
pub mod title;

pub use episode::{AnidbEpisode, Episode, EpisodeKind};
pub use error::{ModelError, Result as ModelResult};
pub use file::{File, FileHashes, FileLocation, SeriesCrossReference, XrefIds};
pub use group::{Group, GroupIds};
pub use ids::{EpisodeId, FileId, GroupId, ImportFolderId, SeriesId};
pub use rating::Rating;
pub use relation::{Relation, RelationKind};
pub use role::{Role, RoleKind};
pub use series::{AnidbSeries, Series, SeriesIds, SeriesKind, SeriesSizes};
pub use tag::{Tag, TagFilter};
pub use title::{Title, TitleKind};
