use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::instrument;

use crate::{
    db::RatingBackend,
    error::AppResult,
    models::{Movie, MovieId, Rating},
    services::Catalog,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notification emitted after a rating mutation has been persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatingEvent {
    Rated {
        movie_id: MovieId,
        rating: Rating,
        at: DateTime<Utc>,
    },
    Cleared {
        movie_id: MovieId,
        at: DateTime<Utc>,
    },
}

impl RatingEvent {
    pub fn movie_id(&self) -> MovieId {
        match self {
            RatingEvent::Rated { movie_id, .. } | RatingEvent::Cleared { movie_id, .. } => *movie_id,
        }
    }
}

/// The user's ratings, backed by a persistent key-value store
///
/// All reads go to the backend. Mutations are serialized through a single
/// writer lock, so racing `set`/`delete` calls are applied one at a time.
pub struct RatingStore {
    backend: Arc<dyn RatingBackend>,
    write_lock: Mutex<()>,
    events: broadcast::Sender<RatingEvent>,
}

impl RatingStore {
    pub fn new(backend: Arc<dyn RatingBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Registers a new observer of rating changes
    ///
    /// Slow observers that fall more than the channel capacity behind receive
    /// `RecvError::Lagged` and skip ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<RatingEvent> {
        self.events.subscribe()
    }

    /// Current rating of a movie, `None` when unrated
    ///
    /// A persisted value outside the rating domain is treated as unrated.
    pub async fn get(&self, movie_id: MovieId) -> AppResult<Option<Rating>> {
        let raw = self.backend.get(&movie_id.to_string()).await?;
        Ok(raw.and_then(|value| checked_rating(&movie_id.to_string(), value)))
    }

    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn set(&self, movie_id: MovieId, rating: Rating) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.backend
            .set(&movie_id.to_string(), rating.value())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to persist rating"))?;

        tracing::info!(movie_id = %movie_id, rating = %rating, "Rating saved");
        self.notify(RatingEvent::Rated {
            movie_id,
            rating,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Removes a rating; deleting an absent rating is a no-op
    ///
    /// Returns whether a rating was removed. Observers are notified either
    /// way; a failed backend write notifies nobody.
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn delete(&self, movie_id: MovieId) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let removed = self
            .backend
            .delete(&movie_id.to_string())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to delete rating"))?;

        if removed {
            tracing::info!(movie_id = %movie_id, "Rating cleared");
        } else {
            tracing::debug!(movie_id = %movie_id, "No rating to clear");
        }
        self.notify(RatingEvent::Cleared {
            movie_id,
            at: Utc::now(),
        });
        Ok(removed)
    }

    /// Every valid persisted rating, keyed by movie id
    ///
    /// Entries with a non-numeric key or an out-of-domain value are skipped.
    pub async fn interactions(&self) -> AppResult<HashMap<MovieId, Rating>> {
        let raw = self.backend.all().await?;
        Ok(raw
            .into_iter()
            .filter_map(|(key, value)| {
                let movie_id = key
                    .parse::<MovieId>()
                    .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Skipping rating"))
                    .ok()?;
                checked_rating(&key, value).map(|rating| (movie_id, rating))
            })
            .collect())
    }

    /// Rated movies in catalog order
    pub async fn rated_movies(&self, catalog: &Catalog) -> AppResult<Vec<Movie>> {
        let ratings = self.interactions().await?;
        Ok(catalog
            .movies()
            .filter(|movie| ratings.contains_key(&movie.movie_id))
            .cloned()
            .collect())
    }

    fn notify(&self, event: RatingEvent) {
        // No receivers is not an error
        let _ = self.events.send(event);
    }
}

fn checked_rating(key: &str, value: f64) -> Option<Rating> {
    Rating::from_value(value)
        .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Ignoring persisted rating"))
        .ok()
}
