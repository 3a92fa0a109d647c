use serde::{Deserialize, Serialize};

/// Where a title sits in the catalog's title hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleKind {
    Main,
    Official,
    Synonym,
    Short,
    #[serde(other)]
    Unknown,
}

/// A single localized title attached to a series or episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Title {
    pub name: String,
    /// ISO 639-1 language code as reported by the catalog.
    pub language: String,
    #[serde(rename = "type")]
    pub kind: TitleKind,
    #[serde(default)]
    pub default: bool,
}

/// Pick the best title for a language: the default title wins, then the
/// main title in the requested language, then the first official one.
pub fn preferred_title<'a>(titles: &'a [Title], language: &str) -> Option<&'a str> {
    titles
        .iter()
        .find(|t| t.default)
        .or_else(|| {
            titles
                .iter()
                .find(|t| t.kind == TitleKind::Main && t.language.eq_ignore_ascii_case(language))
        })
        .or_else(|| {
            titles.iter().find(|t| {
                t.kind == TitleKind::Official && t.language.eq_ignore_ascii_case(language)
            })
        })
        .map(|t| t.name.as_str())
}
