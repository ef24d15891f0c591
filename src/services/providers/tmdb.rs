/// TMDB metadata provider
///
/// API Flow:
/// 1. Movie record: /3/movie/{tmdb_id} → overview, poster_path, backdrop_path
/// 2. Image: {image_url}{poster_path | backdrop_path} → raw bytes
use reqwest::Client as HttpClient;
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::MovieDetails,
    services::providers::MetadataProvider,
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
    language: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String, image_url: String, language: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
            language,
        }
    }

    fn movie_url(&self, tmdb_id: u64) -> String {
        format!("{}/3/movie/{}", self.api_url, tmdb_id)
    }

    fn image_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.image_url, path)
        } else {
            format!("{}/{}", self.image_url, path)
        }
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MetadataFetch(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    #[instrument(skip(self))]
    async fn fetch_movie(&self, tmdb_id: u64) -> AppResult<MovieDetails> {
        let response = self
            .http_client
            .get(self.movie_url(tmdb_id))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        let response_text = Self::check_status(response).await?.text().await?;
        tracing::debug!(response = %response_text, "Raw TMDB movie response");

        let details: MovieDetails = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize TMDB response");
            AppError::MetadataFetch(format!("Failed to parse TMDB response: {}", e))
        })?;

        tracing::info!(
            tmdb_id,
            has_poster = details.poster_path.is_some(),
            has_backdrop = details.backdrop_path.is_some(),
            provider = "tmdb",
            "Movie metadata fetched"
        );

        Ok(details)
    }

    #[instrument(skip(self))]
    async fn fetch_image(&self, path: &str) -> AppResult<Vec<u8>> {
        let response = self.http_client.get(self.image_url(path)).send().await?;
        let bytes = Self::check_status(response).await?.bytes().await?;

        tracing::info!(bytes = bytes.len(), provider = "tmdb", "Image fetched");
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
