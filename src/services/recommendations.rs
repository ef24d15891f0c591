use std::{cmp::Ordering, collections::HashMap, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId},
    services::{predictor::Predictor, with_cancellation, Catalog, RatingStore},
};

/// Generates personalized recommendations from the user's ratings
///
/// The rating history is handed to the predictor as an interaction map; the
/// scored candidates come back best first and are resolved to catalog movies.
pub struct Recommender {
    predictor: Arc<dyn Predictor>,
    timeout: Duration,
}

impl Recommender {
    pub fn new(predictor: Arc<dyn Predictor>, timeout: Duration) -> Self {
        Self { predictor, timeout }
    }

    /// Up to `k` recommended movies, highest score first
    ///
    /// Fails with `Prediction` when there are no ratings to learn from, when
    /// the predictor fails or exceeds the timeout, and with `Cancelled` when the
    /// token fires first. Callers are expected to fall back to another view
    /// (e.g. the rated movies) on error.
    #[instrument(skip_all, fields(k = k, predictor = self.predictor.name()))]
    pub async fn recommend(
        &self,
        catalog: &Catalog,
        ratings: &RatingStore,
        k: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Movie>> {
        if k == 0 {
            return Err(AppError::InvalidInput(
                "recommendation count must be at least 1".to_string(),
            ));
        }

        let interactions: HashMap<MovieId, f64> = ratings
            .interactions()
            .await?
            .into_iter()
            .filter(|(id, _)| catalog.contains(*id))
            .map(|(id, rating)| (id, rating.value()))
            .collect();

        if interactions.is_empty() {
            return Err(AppError::Prediction(
                "rate at least one movie to get recommendations".to_string(),
            ));
        }

        let prediction = async {
            tokio::time::timeout(self.timeout, self.predictor.predict(&interactions, k))
                .await
                .map_err(|_| {
                    AppError::Prediction(format!("predictor timed out after {:?}", self.timeout))
                })?
                .map_err(|e| {
                    if matches!(e, AppError::Prediction(_) | AppError::Cancelled) {
                        e
                    } else {
                        AppError::Prediction(e.to_string())
                    }
                })
        };

        let scores = with_cancellation(cancel, prediction)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Recommendation failed"))?;

        let movies = assemble(catalog, scores, k)?;
        tracing::info!(
            interactions = interactions.len(),
            results = movies.len(),
            "Recommendations generated"
        );
        Ok(movies)
    }
}

/// Orders predictor output by descending score and resolves it to movies
///
/// Equal scores fall back to ascending movie id. Candidates the catalog does
/// not know are dropped before the `k` best are taken.
pub fn assemble(
    catalog: &Catalog,
    scores: HashMap<MovieId, f64>,
    k: usize,
) -> AppResult<Vec<Movie>> {
    if let Some((id, score)) = scores.iter().find(|(_, score)| !score.is_finite()) {
        return Err(AppError::Prediction(format!(
            "predictor returned non-finite score {} for movie {}",
            score, id
        )));
    }

    let mut ranked: Vec<(MovieId, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    Ok(ranked
        .into_iter()
        .filter_map(|(id, _)| match catalog.movie(id) {
            Ok(movie) => Some(movie.clone()),
            Err(_) => {
                tracing::warn!(movie_id = %id, "Predictor returned a movie missing from the catalog");
                None
            }
        })
        .take(k)
        .collect())
}
