use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{Image, Movie, MovieId, Rating},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: f64,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub rating: Option<Rating>,
}

impl MovieResponse {
    fn new(movie: Movie, rating: Option<Rating>) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title,
            genres: movie.genres,
            rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub movie_id: MovieId,
    pub description: String,
}

/// Attaches the current rating to each movie, reading the store once
async fn with_ratings(state: &AppState, movies: Vec<Movie>) -> AppResult<Vec<MovieResponse>> {
    let ratings: HashMap<MovieId, Rating> = state.ratings.interactions().await?;
    Ok(movies
        .into_iter()
        .map(|movie| {
            let rating = ratings.get(&movie.movie_id).copied();
            MovieResponse::new(movie, rating)
        })
        .collect())
}

fn image_response(image: Image) -> Response {
    (
        [(header::CONTENT_TYPE, image.content_type())],
        image.bytes.to_vec(),
    )
        .into_response()
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Fuzzy title search over the catalog
pub async fn search_movies(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let movies = state.search(&params.q);
    Ok(Json(with_ratings(&state, movies).await?))
}

/// Movies the user has rated, in catalog order
pub async fn get_rated_movies(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let movies = state.rated_movies().await?;
    Ok(Json(with_ratings(&state, movies).await?))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<MovieResponse>> {
    let movie_id = MovieId(id);
    let movie = state.catalog.movie(movie_id)?.clone();
    let rating = state.ratings.get(movie_id).await?;
    Ok(Json(MovieResponse::new(movie, rating)))
}

/// Create or replace the user's rating for a movie
pub async fn put_rating(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<MovieResponse>> {
    let movie_id = MovieId(id);
    let rating = Rating::from_value(request.rating)?;
    state.rate(movie_id, rating).await?;

    let movie = state.catalog.movie(movie_id)?.clone();
    Ok(Json(MovieResponse::new(movie, Some(rating))))
}

/// Remove the user's rating; succeeds whether or not one existed
pub async fn delete_rating(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    state.delete_rating(MovieId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_description(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<DescriptionResponse>> {
    let movie_id = MovieId(id);
    let description = state.description(movie_id).await?;
    Ok(Json(DescriptionResponse {
        movie_id,
        description,
    }))
}

pub async fn get_cover(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Response> {
    let image = state.cover_image(MovieId(id)).await?;
    Ok(image_response(image))
}

/// Backdrop image, or 204 when the movie has none
pub async fn get_backdrop(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Response> {
    match state.backdrop_image(MovieId(id)).await? {
        Some(image) => Ok(image_response(image)),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Personalized recommendations, best first
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendQuery>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let k = params.k.unwrap_or(state.recommendation_count);
    let movies = state.recommend(k).await?;
    Ok(Json(with_ratings(&state, movies).await?))
}
