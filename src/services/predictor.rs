use std::collections::HashMap;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::MovieId,
};

/// Opaque recommendation model
///
/// Takes the user's interaction history (movie id → rating value) and returns
/// up to `k` candidate movies with a score each. How the scores are computed is
/// entirely up to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(
        &self,
        interactions: &HashMap<MovieId, f64>,
        k: usize,
    ) -> AppResult<HashMap<MovieId, f64>>;

    /// Predictor name for logging and debugging
    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    interactions: HashMap<String, f64>,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    recommendations: HashMap<String, f64>,
}

/// Predictor backed by a model-serving HTTP endpoint
///
/// `POST {url}` with `{"interactions": {"1": 5.0}, "k": 10}`, answered by
/// `{"recommendations": {"3": 0.9, "4": 0.2}}`.
#[derive(Clone)]
pub struct HttpPredictor {
    http_client: HttpClient,
    url: String,
}

impl HttpPredictor {
    pub fn new(url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            url,
        }
    }
}

#[async_trait::async_trait]
impl Predictor for HttpPredictor {
    #[instrument(skip(self, interactions), fields(interactions = interactions.len()))]
    async fn predict(
        &self,
        interactions: &HashMap<MovieId, f64>,
        k: usize,
    ) -> AppResult<HashMap<MovieId, f64>> {
        let request = PredictRequest {
            interactions: interactions
                .iter()
                .map(|(id, value)| (id.to_string(), *value))
                .collect(),
            k,
        };

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Prediction(format!("predictor unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Prediction(format!(
                "predictor returned status {}: {}",
                status, body
            )));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| AppError::Prediction(format!("invalid predictor response: {}", e)))?;

        let scores = body
            .recommendations
            .into_iter()
            .map(|(id, score)| {
                id.parse::<MovieId>()
                    .map(|id| (id, score))
                    .map_err(AppError::Prediction)
            })
            .collect::<AppResult<HashMap<_, _>>>()?;

        tracing::info!(candidates = scores.len(), "Predictor scored candidates");
        Ok(scores)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
