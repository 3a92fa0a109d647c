//! Enriched info objects built from raw catalog records.
//!
//! These are immutable snapshots: the resolver constructs them once per
//! cache generation and replaces them wholesale on refresh, so readers can
//! hold `Arc`s across cache clears without observing torn state.

mod collection;
mod episode;
mod file;
mod season;
mod show;

pub use collection::CollectionInfo;
pub use episode::{EpisodeInfo, ExtraKind, derive_extra_kind};
pub use file::FileInfo;
pub use season::{PersonKind, SeasonInfo, StaffMember};
pub use show::ShowInfo;
