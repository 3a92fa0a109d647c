use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

use anibridge_config::CatalogConfig;
use anibridge_model::{
    Episode, EpisodeId, File, FileId, Group, GroupId, Role, Series, SeriesId, Tag, TagFilter,
};

use super::{CatalogClient, ClientError, ClientResult};

const API_KEY_HEADER: &str = "apikey";

/// HTTP implementation of [`CatalogClient`] against the catalog's JSON API.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    language: String,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Issue a GET and decode the JSON body. A 404 maps to `Ok(None)`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<Option<T>> {
        let url = self.endpoint(path)?;
        trace!(endpoint = %url, "catalog request");
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.language)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                endpoint: path.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| ClientError::Decode {
                endpoint: path.to_string(),
                source,
            })
    }

    /// Like [`Self::get_json`] but for list endpoints, where a 404 means an
    /// empty result rather than a missing record.
    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<Vec<T>> {
        Ok(self.get_json(path, query).await?.unwrap_or_default())
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_series(&self, id: SeriesId) -> ClientResult<Option<Series>> {
        self.get_json(&format!("api/v3/series/{id}"), &[]).await
    }

    async fn get_series_by_path_suffix(&self, suffix: &str) -> ClientResult<Vec<Series>> {
        self.get_list(
            "api/v3/series/path-ends-with",
            &[("path", suffix.to_string())],
        )
        .await
    }

    async fn get_series_for_episode(&self, id: EpisodeId) -> ClientResult<Option<Series>> {
        self.get_json(&format!("api/v3/episode/{id}/series"), &[])
            .await
    }

    async fn get_episode(&self, id: EpisodeId) -> ClientResult<Option<Episode>> {
        self.get_json(&format!("api/v3/episode/{id}"), &[]).await
    }

    async fn get_episodes_for_series(&self, id: SeriesId) -> ClientResult<Vec<Episode>> {
        self.get_list(&format!("api/v3/series/{id}/episodes"), &[])
            .await
    }

    async fn get_file(&self, id: FileId) -> ClientResult<Option<File>> {
        self.get_json(&format!("api/v3/file/{id}"), &[]).await
    }

    async fn get_files_by_path_suffix(&self, suffix: &str) -> ClientResult<Vec<File>> {
        self.get_list(
            "api/v3/file/path-ends-with",
            &[("path", suffix.to_string())],
        )
        .await
    }

    async fn get_files_for_series(&self, id: SeriesId) -> ClientResult<Vec<File>> {
        self.get_list(&format!("api/v3/series/{id}/files"), &[])
            .await
    }

    async fn get_group(&self, id: GroupId) -> ClientResult<Option<Group>> {
        self.get_json(&format!("api/v3/group/{id}"), &[]).await
    }

    async fn get_group_for_series(&self, id: SeriesId) -> ClientResult<Option<Group>> {
        self.get_json(&format!("api/v3/series/{id}/group"), &[])
            .await
    }

    async fn get_series_in_group(&self, id: GroupId) -> ClientResult<Vec<Series>> {
        self.get_list(&format!("api/v3/group/{id}/series"), &[])
            .await
    }

    async fn get_cast(&self, id: SeriesId) -> ClientResult<Vec<Role>> {
        self.get_list(&format!("api/v3/series/{id}/cast"), &[])
            .await
    }

    async fn get_tags(&self, id: SeriesId, filter: TagFilter) -> ClientResult<Vec<Tag>> {
        self.get_list(
            &format!("api/v3/series/{id}/tags"),
            &[("filter", filter.0.to_string())],
        )
        .await
    }
}
