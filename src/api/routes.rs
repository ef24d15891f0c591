use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Catalog
        .route("/movies/search", get(handlers::search_movies))
        .route("/movies/rated", get(handlers::get_rated_movies))
        .route("/movies/:id", get(handlers::get_movie))
        // Ratings
        .route(
            "/movies/:id/rating",
            axum::routing::put(handlers::put_rating).delete(handlers::delete_rating),
        )
        // Metadata
        .route("/movies/:id/description", get(handlers::get_description))
        .route("/movies/:id/cover", get(handlers::get_cover))
        .route("/movies/:id/backdrop", get(handlers::get_backdrop))
        // Recommendations
        .route("/recommendations", get(handlers::get_recommendations))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
