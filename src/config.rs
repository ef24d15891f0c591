use serde::Deserialize;
use std::path::PathBuf;

/// Where user ratings are persisted
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RatingsBackendKind {
    File,
    Redis,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Base URL that poster and backdrop paths are appended to
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Language requested for movie overviews
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Static movie records (JSON array)
    #[serde(default = "default_movies_path")]
    pub movies_path: PathBuf,

    /// Static link records (JSON array)
    #[serde(default = "default_links_path")]
    pub links_path: PathBuf,

    #[serde(default = "default_ratings_backend")]
    pub ratings_backend: RatingsBackendKind,

    /// Ratings file used by the `file` backend
    #[serde(default = "default_ratings_path")]
    pub ratings_path: PathBuf,

    /// Redis connection URL used by the `redis` backend
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Redis hash holding the ratings
    #[serde(default = "default_ratings_redis_key")]
    pub ratings_redis_key: String,

    /// Model-serving endpoint for recommendation scoring
    #[serde(default = "default_predictor_url")]
    pub predictor_url: String,

    /// Number of recommendations requested from the predictor
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Upper bound on a single predictor call, in seconds
    #[serde(default = "default_predict_timeout_secs")]
    pub predict_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w185".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_movies_path() -> PathBuf {
    PathBuf::from("data/movies.json")
}

fn default_links_path() -> PathBuf {
    PathBuf::from("data/links.json")
}

fn default_ratings_backend() -> RatingsBackendKind {
    RatingsBackendKind::File
}

fn default_ratings_path() -> PathBuf {
    PathBuf::from("data/ratings.json")
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_ratings_redis_key() -> String {
    "reelrec:ratings".to_string()
}

fn default_predictor_url() -> String {
    "http://localhost:8501/v1/predict".to_string()
}

fn default_recommendation_count() -> usize {
    10
}

fn default_predict_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
