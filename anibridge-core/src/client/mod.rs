//! Async seam to the remote catalog server.
//!
//! Callers see "not found" as an absent result, never as an error: a missing
//! record means "not represented remotely" and the caller decides what that
//! implies. Transport and decode failures propagate as [`ClientError`].

use async_trait::async_trait;
use thiserror::Error;

use anibridge_model::{
    Episode, EpisodeId, File, FileId, Group, GroupId, Role, Series, SeriesId, Tag, TagFilter,
};

mod http;

pub use http::HttpCatalogClient;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {status} from {endpoint}")]
    Status {
        status: reqwest::StatusCode,
        endpoint: String,
    },

    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },

    #[error("invalid catalog base url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Typed view of the catalog server's query API.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn get_series(&self, id: SeriesId) -> ClientResult<Option<Series>>;

    /// Series whose on-disk location ends with the given relative path.
    async fn get_series_by_path_suffix(&self, suffix: &str) -> ClientResult<Vec<Series>>;

    async fn get_series_for_episode(&self, id: EpisodeId) -> ClientResult<Option<Series>>;

    async fn get_episode(&self, id: EpisodeId) -> ClientResult<Option<Episode>>;

    async fn get_episodes_for_series(&self, id: SeriesId) -> ClientResult<Vec<Episode>>;

    async fn get_file(&self, id: FileId) -> ClientResult<Option<File>>;

    /// Files whose on-disk location ends with the given relative path.
    async fn get_files_by_path_suffix(&self, suffix: &str) -> ClientResult<Vec<File>>;

    async fn get_files_for_series(&self, id: SeriesId) -> ClientResult<Vec<File>>;

    async fn get_group(&self, id: GroupId) -> ClientResult<Option<Group>>;

    async fn get_group_for_series(&self, id: SeriesId) -> ClientResult<Option<Group>>;

    async fn get_series_in_group(&self, id: GroupId) -> ClientResult<Vec<Series>>;

    async fn get_cast(&self, id: SeriesId) -> ClientResult<Vec<Role>>;

    async fn get_tags(&self, id: SeriesId, filter: TagFilter) -> ClientResult<Vec<Tag>>;
}
