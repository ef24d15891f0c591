use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
///
/// Only `CatalogLoad` is fatal; it is raised while bootstrapping and aborts startup.
/// Everything else is handed back to the caller as a value.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Catalog load error: {0}")]
    CatalogLoad(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rating persistence error: {0}")]
    Persistence(String),

    #[error("Metadata fetch error: {0}")]
    MetadataFetch(String),

    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("Recommendation unavailable: {0}")]
    Prediction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

/// Request URLs carry the provider credential, so they are stripped first
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::MetadataFetch(err.without_url().to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) | AppError::NotAvailable(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::CatalogLoad(_) | AppError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::MetadataFetch(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Prediction(_) | AppError::Cancelled => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
