use chrono::NaiveDate;

use anibridge_model::{Episode, EpisodeId, EpisodeKind};

/// What kind of extra video an episode represents in the host's model,
/// derived from its classification and title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtraKind {
    Trailer,
    ThemeVideo,
    Interview,
    Clip,
    BehindTheScenes,
    Unknown,
}

/// Derive the extra kind for an episode, if it is an extra at all.
///
/// Specials are the ambiguous case: the catalog files interviews, music
/// videos, and behind-the-scenes footage under the same classification as
/// story specials, so their English title decides.
pub fn derive_extra_kind(episode: &Episode) -> Option<ExtraKind> {
    match episode.anidb.kind {
        EpisodeKind::Normal | EpisodeKind::Other | EpisodeKind::Unknown => None,
        EpisodeKind::ThemeSong | EpisodeKind::OpeningSong | EpisodeKind::EndingSong => {
            Some(ExtraKind::ThemeVideo)
        }
        EpisodeKind::Trailer => Some(ExtraKind::Trailer),
        EpisodeKind::Interview => Some(ExtraKind::Interview),
        EpisodeKind::Parody | EpisodeKind::Extra => Some(ExtraKind::Unknown),
        EpisodeKind::Special => {
            let title = episode.english_title().to_ascii_lowercase();
            if title.is_empty() {
                return None;
            }
            if title.contains("interview") {
                return Some(ExtraKind::Interview);
            }
            if title.starts_with("cinema ") && (title.contains("intro") || title.contains("outro"))
            {
                return Some(ExtraKind::Clip);
            }
            if title.contains("music video") {
                return Some(ExtraKind::ThemeVideo);
            }
            if title.contains("making of")
                || title.contains("music in")
                || title.contains("advance screening")
            {
                return Some(ExtraKind::BehindTheScenes);
            }
            None
        }
    }
}

/// One resolved episode: classification plus the raw record it came from.
#[derive(Debug, Clone)]
pub struct EpisodeInfo {
    pub id: EpisodeId,
    pub kind: EpisodeKind,
    pub extra_kind: Option<ExtraKind>,
    pub record: Episode,
}

impl EpisodeInfo {
    pub fn new(record: Episode) -> Self {
        Self {
            id: record.id,
            kind: record.anidb.kind,
            extra_kind: derive_extra_kind(&record),
            record,
        }
    }

    pub fn air_date(&self) -> Option<NaiveDate> {
        self.record.anidb.air_date
    }

    pub fn episode_number(&self) -> i32 {
        self.record.anidb.episode_number
    }

    pub fn is_special(&self) -> bool {
        self.kind == EpisodeKind::Special
    }

    /// Whether the catalog has at least one local file for this episode.
    pub fn has_files(&self) -> bool {
        self.record.file_count > 0
    }
}
