use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    config::{Config, RatingsBackendKind},
    db::{create_redis_client, JsonFileBackend, RatingBackend, RedisRatingBackend},
    error::AppResult,
    models::{Image, Movie, MovieId, Rating},
    services::{
        title_search, Catalog, HttpPredictor, MetadataResolver, RatingStore, Recommender,
        TmdbProvider,
    },
};

/// Shared application context
///
/// Built once at startup and cloned into every consumer. The catalog is
/// immutable; the rating store is the only mutable component and serializes
/// its own writes.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub ratings: Arc<RatingStore>,
    pub metadata: Arc<MetadataResolver>,
    pub recommender: Arc<Recommender>,
    /// Default number of recommendations per request
    pub recommendation_count: usize,
    /// Root token; cancelled on shutdown so in-flight fetches stop
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        ratings: RatingStore,
        metadata: MetadataResolver,
        recommender: Recommender,
        recommendation_count: usize,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            ratings: Arc::new(ratings),
            metadata: Arc::new(metadata),
            recommender: Arc::new(recommender),
            recommendation_count,
            shutdown: CancellationToken::new(),
        }
    }

    /// Loads the catalog, opens the rating backend and wires the remote clients
    ///
    /// A catalog that cannot be loaded is fatal and returned as an error.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let catalog = Catalog::from_json_files(&config.movies_path, &config.links_path)
            .inspect_err(|e| tracing::error!(error = %e, "Cannot start without a catalog"))?;

        let backend: Arc<dyn RatingBackend> = match config.ratings_backend {
            RatingsBackendKind::File => Arc::new(JsonFileBackend::open(&config.ratings_path).await?),
            RatingsBackendKind::Redis => {
                let client = create_redis_client(&config.redis_url)?;
                Arc::new(RedisRatingBackend::connect(client, config.ratings_redis_key.clone()).await?)
            }
        };
        tracing::info!(backend = backend.name(), "Rating store ready");

        let provider = TmdbProvider::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_image_url.clone(),
            config.tmdb_language.clone(),
        );
        let predictor = HttpPredictor::new(config.predictor_url.clone());

        Ok(Self::new(
            catalog,
            RatingStore::new(backend),
            MetadataResolver::new(Arc::new(provider)),
            Recommender::new(
                Arc::new(predictor),
                Duration::from_secs(config.predict_timeout_secs),
            ),
            config.recommendation_count,
        ))
    }

    pub fn search(&self, query: &str) -> Vec<Movie> {
        title_search::search(&self.catalog, query)
    }

    pub async fn rated_movies(&self) -> AppResult<Vec<Movie>> {
        self.ratings.rated_movies(&self.catalog).await
    }

    pub async fn recommend(&self, k: usize) -> AppResult<Vec<Movie>> {
        self.recommender
            .recommend(&self.catalog, &self.ratings, k, &self.shutdown.child_token())
            .await
    }

    /// Rates a catalog movie; unknown ids are `NotFound`
    pub async fn rate(&self, movie_id: MovieId, rating: Rating) -> AppResult<()> {
        self.catalog.movie(movie_id)?;
        self.ratings.set(movie_id, rating).await
    }

    pub async fn delete_rating(&self, movie_id: MovieId) -> AppResult<()> {
        self.catalog.movie(movie_id)?;
        self.ratings.delete(movie_id).await.map(|_| ())
    }

    pub async fn description(&self, movie_id: MovieId) -> AppResult<String> {
        let link = self.catalog.link(movie_id)?;
        self.metadata
            .description(&link, &self.shutdown.child_token())
            .await
    }

    pub async fn cover_image(&self, movie_id: MovieId) -> AppResult<Image> {
        let link = self.catalog.link(movie_id)?;
        self.metadata
            .cover_image(&link, &self.shutdown.child_token())
            .await
    }

    pub async fn backdrop_image(&self, movie_id: MovieId) -> AppResult<Option<Image>> {
        let link = self.catalog.link(movie_id)?;
        self.metadata
            .backdrop_image(&link, &self.shutdown.child_token())
            .await
    }
}
