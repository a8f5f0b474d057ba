use async_trait::async_trait;
use reqwest::Client;

use super::models::*;
use crate::error::ApiError;

/// Source of raw episode records, implemented over HTTP by [`PodcastrClient`].
#[async_trait]
pub trait EpisodeApi: Send + Sync {
    /// Most recent episodes, newest first.
    async fn latest_episodes(&self, query: EpisodesQuery) -> Result<Vec<RawEpisode>, ApiError>;

    /// A single episode by id.
    async fn episode(&self, id: &str) -> Result<RawEpisode, ApiError>;
}

#[derive(Clone)]
pub struct PodcastrClient {
    client: Client,
    base_url: String,
}

impl PodcastrClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn get_json<T>(&self, endpoint: &str) -> Result<T, ApiError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let url = self.endpoint_url(endpoint);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::RequestFailed { url: url.clone(), source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::RequestFailed { url: url.clone(), source })?;

        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                url,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::DecodeFailed { url, source })
    }
}

#[async_trait]
impl EpisodeApi for PodcastrClient {
    async fn latest_episodes(&self, query: EpisodesQuery) -> Result<Vec<RawEpisode>, ApiError> {
        let endpoint = format!("/episodes?{}", query.to_query_string());
        let episodes: Vec<RawEpisode> = self.get_json(&endpoint).await?;
        log::info!("Fetched {} episodes", episodes.len());
        Ok(episodes)
    }

    async fn episode(&self, id: &str) -> Result<RawEpisode, ApiError> {
        let endpoint = format!("/episodes/{}", urlencoding::encode(id));
        self.get_json(&endpoint).await
    }
}
