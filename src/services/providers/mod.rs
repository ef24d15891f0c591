/// Remote movie metadata provider abstraction
///
/// The resolver only needs two calls from a provider: the movie record by the
/// provider's own id, and raw image bytes by the path that record hands out.
use crate::{error::AppResult, models::MovieDetails};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for remote metadata providers
///
/// Implementations report every network, status and parse failure as
/// `AppError::MetadataFetch` so callers can retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch the movie record (overview, poster and backdrop paths)
    async fn fetch_movie(&self, tmdb_id: u64) -> AppResult<MovieDetails>;

    /// Fetch raw image bytes for a path taken from a movie record
    async fn fetch_image(&self, path: &str) -> AppResult<Vec<u8>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
