use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

pub mod catalog;
pub mod metadata;
pub mod predictor;
pub mod providers;
pub mod ratings;
pub mod recommendations;
pub mod title_search;

pub use catalog::Catalog;
pub use metadata::MetadataResolver;
pub use predictor::{HttpPredictor, Predictor};
pub use providers::{MetadataProvider, TmdbProvider};
pub use ratings::{RatingEvent, RatingStore};
pub use recommendations::Recommender;

/// Runs `fut` until it completes or `cancel` fires, whichever comes first
///
/// On cancellation the future is dropped and `AppError::Cancelled` returned.
pub(crate) async fn with_cancellation<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = fut => result,
    }
}
