use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{Image, Link, MovieDetails},
    services::{providers::MetadataProvider, with_cancellation},
};

/// Lazily resolves per-movie metadata and memoizes it on the `Link`
///
/// Each cache slot on a link is a `tokio::sync::OnceCell`: concurrent callers
/// share a single in-flight fetch, failures leave the slot empty so the next
/// access retries, and a cancelled fetch never stores a partial value.
pub struct MetadataResolver {
    provider: Arc<dyn MetadataProvider>,
}

impl MetadataResolver {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    /// Fetches the provider record for a link unless it is already cached
    pub async fn ensure_metadata_fetched(
        &self,
        link: &Link,
        cancel: &CancellationToken,
    ) -> AppResult<Arc<MovieDetails>> {
        with_cancellation(cancel, self.details(link)).await
    }

    /// Cover (poster) image bytes
    ///
    /// `NotAvailable` when the record has no poster path.
    #[instrument(skip_all, fields(movie_id = %link.movie_id))]
    pub async fn cover_image(&self, link: &Link, cancel: &CancellationToken) -> AppResult<Image> {
        let fetch = link.cache.cover.get_or_try_init(|| async {
            let details = self.details(link).await?;
            let path = details
                .poster_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    AppError::NotAvailable(format!("no cover image for movie {}", link.movie_id))
                })?;
            self.fetch_image(path).await
        });
        with_cancellation(cancel, fetch).await.cloned()
    }

    /// Backdrop image bytes, `None` when the record has no backdrop path
    #[instrument(skip_all, fields(movie_id = %link.movie_id))]
    pub async fn backdrop_image(
        &self,
        link: &Link,
        cancel: &CancellationToken,
    ) -> AppResult<Option<Image>> {
        let fetch = link.cache.backdrop.get_or_try_init(|| async {
            let details = self.details(link).await?;
            match details.backdrop_path.as_deref().filter(|p| !p.is_empty()) {
                Some(path) => self.fetch_image(path).await.map(Some),
                None => {
                    tracing::debug!("Record has no backdrop");
                    Ok(None)
                }
            }
        });
        with_cancellation(cancel, fetch).await.cloned()
    }

    /// Overview text from the provider record
    ///
    /// `NotAvailable` when the record has no (or an empty) overview.
    pub async fn description(&self, link: &Link, cancel: &CancellationToken) -> AppResult<String> {
        let details = self.ensure_metadata_fetched(link, cancel).await?;
        details
            .overview
            .clone()
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| {
                AppError::NotAvailable(format!("no description for movie {}", link.movie_id))
            })
    }

    async fn details(&self, link: &Link) -> AppResult<Arc<MovieDetails>> {
        let tmdb_id = link.tmdb_id.ok_or_else(|| {
            AppError::NotAvailable(format!("movie {} has no provider id", link.movie_id))
        })?;

        link.cache
            .details
            .get_or_try_init(|| async {
                tracing::debug!(
                    movie_id = %link.movie_id,
                    tmdb_id,
                    provider = self.provider.name(),
                    "Fetching movie metadata"
                );
                self.provider
                    .fetch_movie(tmdb_id)
                    .await
                    .map(Arc::new)
                    .inspect_err(|e| {
                        tracing::warn!(movie_id = %link.movie_id, error = %e, "Metadata fetch failed")
                    })
            })
            .await
            .cloned()
    }

    async fn fetch_image(&self, path: &str) -> AppResult<Image> {
        let bytes = self.provider.fetch_image(path).await.inspect_err(|e| {
            tracing::warn!(path = %path, error = %e, "Image fetch failed");
        })?;
        Ok(Image::new(path, bytes))
    }
}
