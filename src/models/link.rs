use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::{Image, MovieDetails, MovieId};

/// Raw link record as stored in `links.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub movie_id: MovieId,
    #[serde(default)]
    pub imdb_id: String,
    /// Empty in the data when the provider has no entry for the movie
    #[serde(default, deserialize_with = "optional_external_id")]
    pub tmdb_id: Option<u64>,
}

/// Cross-reference from a catalog movie to the external metadata provider
///
/// Carries a per-link metadata cache. Each slot is filled at most once, by the
/// first successful fetch, and kept for the lifetime of the link.
#[derive(Debug)]
pub struct Link {
    pub movie_id: MovieId,
    pub imdb_id: String,
    pub tmdb_id: Option<u64>,
    pub(crate) cache: MetadataCache,
}

#[derive(Debug, Default)]
pub(crate) struct MetadataCache {
    pub(crate) details: OnceCell<Arc<MovieDetails>>,
    pub(crate) cover: OnceCell<Image>,
    pub(crate) backdrop: OnceCell<Option<Image>>,
}

impl Link {
    pub fn new(movie_id: MovieId, imdb_id: impl Into<String>, tmdb_id: Option<u64>) -> Self {
        Self {
            movie_id,
            imdb_id: imdb_id.into(),
            tmdb_id,
            cache: MetadataCache::default(),
        }
    }

    /// Provider record, if it has already been fetched
    pub fn cached_details(&self) -> Option<Arc<MovieDetails>> {
        self.cache.details.get().cloned()
    }

    pub fn cached_cover(&self) -> Option<Image> {
        self.cache.cover.get().cloned()
    }
}

impl From<LinkRecord> for Link {
    fn from(record: LinkRecord) -> Self {
        Link::new(record.movie_id, record.imdb_id, record.tmdb_id)
    }
}

fn optional_external_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(id)) => Ok(Some(id)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid tmdbId: {:?}", text))),
    }
}
