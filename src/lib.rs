//! Data layer of a movie recommendation client.
//!
//! A static movie catalog, persistent half-star ratings, fuzzy title search,
//! lazily cached TMDB metadata and predictor-backed recommendations, exposed
//! through [`api::AppState`] and a small JSON HTTP API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
