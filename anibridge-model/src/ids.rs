use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Strongly typed identifier for a catalog series entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SeriesId(pub i32);

impl SeriesId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SeriesId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(SeriesId)
            .map_err(|_| ModelError::InvalidId(format!("series id: {s:?}")))
    }
}

/// Strongly typed identifier for a catalog episode entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EpisodeId(pub i32);

impl EpisodeId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EpisodeId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(EpisodeId)
            .map_err(|_| ModelError::InvalidId(format!("episode id: {s:?}")))
    }
}

/// Strongly typed identifier for a catalog file entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FileId(pub i32);

impl FileId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(FileId)
            .map_err(|_| ModelError::InvalidId(format!("file id: {s:?}")))
    }
}

/// Strongly typed identifier for a catalog group (multi-series collection).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GroupId(pub i32);

impl GroupId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(GroupId)
            .map_err(|_| ModelError::InvalidId(format!("group id: {s:?}")))
    }
}

/// Strongly typed identifier for an import folder on the catalog side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ImportFolderId(pub i32);

impl ImportFolderId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for ImportFolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ImportFolderId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(ImportFolderId)
            .map_err(|_| ModelError::InvalidId(format!("import folder id: {s:?}")))
    }
}
