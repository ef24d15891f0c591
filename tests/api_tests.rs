use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use reelrec::{
    api::{create_router, AppState},
    db::MemoryBackend,
    error::{AppError, AppResult},
    models::{LinkRecord, MovieDetails, MovieId, MovieRecord},
    services::{Catalog, MetadataProvider, MetadataResolver, Predictor, RatingStore, Recommender},
};

struct FakeTmdb {
    movie_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl MetadataProvider for FakeTmdb {
    async fn fetch_movie(&self, tmdb_id: u64) -> AppResult<MovieDetails> {
        self.movie_calls.fetch_add(1, Ordering::SeqCst);
        match tmdb_id {
            862 => Ok(MovieDetails {
                id: Some(862),
                title: Some("Toy Story".to_string()),
                overview: Some("Led by Woody, Andy's toys live happily in his room.".to_string()),
                poster_path: Some("/toy.jpg".to_string()),
                backdrop_path: None,
            }),
            8844 => Ok(MovieDetails {
                id: Some(8844),
                title: Some("Jumanji".to_string()),
                overview: None,
                poster_path: None,
                backdrop_path: Some("/jungle.png".to_string()),
            }),
            _ => Err(AppError::MetadataFetch(format!("TMDB returned status 404 for {}", tmdb_id))),
        }
    }

    async fn fetch_image(&self, path: &str) -> AppResult<Vec<u8>> {
        Ok(path.as_bytes().to_vec())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Scores every unrated catalog movie by its id, highest id first
struct FakeModel;

#[async_trait::async_trait]
impl Predictor for FakeModel {
    async fn predict(
        &self,
        interactions: &HashMap<MovieId, f64>,
        k: usize,
    ) -> AppResult<HashMap<MovieId, f64>> {
        Ok((1..=5u64)
            .map(MovieId)
            .filter(|id| !interactions.contains_key(id))
            .take(k)
            .map(|id| (id, id.0 as f64 / 10.0))
            .collect())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn movie(id: u64, title: &str, genres: &str) -> MovieRecord {
    MovieRecord {
        movie_id: MovieId(id),
        title: title.to_string(),
        genres: genres.to_string(),
    }
}

fn link(id: u64, tmdb_id: Option<u64>) -> LinkRecord {
    LinkRecord {
        movie_id: MovieId(id),
        imdb_id: format!("{:07}", id),
        tmdb_id,
    }
}

fn create_test_server() -> (TestServer, Arc<FakeTmdb>) {
    let catalog = Catalog::load(
        vec![
            movie(1, "Toy Story (1995)", "Adventure|Animation|Children|Comedy|Fantasy"),
            movie(2, "Jumanji (1995)", "Adventure|Children|Fantasy"),
            movie(3, "Grumpier Old Men (1995)", "Comedy|Romance"),
            movie(4, "Waiting to Exhale (1995)", "Comedy|Drama|Romance"),
            movie(5, "Father of the Bride Part II (1995)", "Comedy"),
        ],
        vec![
            link(1, Some(862)),
            link(2, Some(8844)),
            link(3, Some(15602)),
            link(4, None),
        ],
    )
    .unwrap();

    let tmdb = Arc::new(FakeTmdb {
        movie_calls: AtomicUsize::new(0),
    });
    let state = AppState::new(
        catalog,
        RatingStore::new(Arc::new(MemoryBackend::new())),
        MetadataResolver::new(tmdb.clone()),
        Recommender::new(Arc::new(FakeModel), Duration::from_secs(5)),
        10,
    );
    let app = create_router(state);
    (TestServer::new(app).unwrap(), tmdb)
}

fn ids(body: &[Value]) -> Vec<u64> {
    body.iter()
        .map(|m| m["movie_id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let (server, _) = create_test_server();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-42");

    let response = server.get("/health").await;
    let generated = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_search_matches_fuzzy_title() {
    let (server, _) = create_test_server();

    let response = server
        .get("/movies/search")
        .add_query_param("q", "TOY STORY (1995)")
        .await;
    response.assert_status_ok();
    let results: Vec<Value> = response.json();
    assert_eq!(ids(&results), vec![1]);
    assert_eq!(results[0]["genres"][0], "Adventure");
    assert_eq!(results[0]["rating"], Value::Null);

    let response = server.get("/movies/search").add_query_param("q", "").await;
    let results: Vec<Value> = response.json();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_rate_list_and_delete() {
    let (server, _) = create_test_server();

    let response = server
        .put("/movies/3/rating")
        .json(&json!({ "rating": 4.5 }))
        .await;
    response.assert_status_ok();
    let rated: Value = response.json();
    assert_eq!(rated["rating"], 4.5);

    server
        .put("/movies/1/rating")
        .json(&json!({ "rating": 2 }))
        .await
        .assert_status_ok();

    let response = server.get("/movies/rated").await;
    let results: Vec<Value> = response.json();
    assert_eq!(ids(&results), vec![1, 3]);
    assert_eq!(results[0]["rating"], 2.0);

    let movie: Value = server.get("/movies/3").await.json();
    assert_eq!(movie["rating"], 4.5);

    server
        .delete("/movies/3/rating")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let movie: Value = server.get("/movies/3").await.json();
    assert_eq!(movie["rating"], Value::Null);

    // deleting again is a no-op
    server
        .delete("/movies/3/rating")
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_invalid_rating_rejected() {
    let (server, _) = create_test_server();

    let response = server
        .put("/movies/1/rating")
        .json(&json!({ "rating": 4.2 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let rated: Vec<Value> = server.get("/movies/rated").await.json();
    assert!(rated.is_empty());
}

#[tokio::test]
async fn test_unknown_movie_is_not_found() {
    let (server, _) = create_test_server();

    server.get("/movies/999").await.assert_status_not_found();
    server
        .put("/movies/999/rating")
        .json(&json!({ "rating": 3.0 }))
        .await
        .assert_status_not_found();
    server
        .get("/movies/999/description")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_description_and_cover_are_cached() {
    let (server, tmdb) = create_test_server();

    let response = server.get("/movies/1/description").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["description"].as_str().unwrap().starts_with("Led by Woody"));

    let response = server.get("/movies/1/cover").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/jpeg");
    assert_eq!(response.as_bytes().as_ref(), b"/toy.jpg");

    server.get("/movies/1/cover").await.assert_status_ok();
    server
        .get("/movies/1/backdrop")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(tmdb.movie_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_metadata_fields() {
    let (server, _) = create_test_server();

    // record without poster or overview
    server.get("/movies/2/cover").await.assert_status_not_found();
    server
        .get("/movies/2/description")
        .await
        .assert_status_not_found();
    let response = server.get("/movies/2/backdrop").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "image/png");

    // movie without a provider id, and movie without a link at all
    server.get("/movies/4/cover").await.assert_status_not_found();
    server.get("/movies/5/cover").await.assert_status_not_found();
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway_and_retried() {
    let (server, tmdb) = create_test_server();

    server
        .get("/movies/3/description")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
    server
        .get("/movies/3/description")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);

    assert_eq!(tmdb.movie_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_recommendations_need_ratings() {
    let (server, _) = create_test_server();

    let response = server.get("/recommendations").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("rate at least one movie"));
}

#[tokio::test]
async fn test_recommendations_best_first() {
    let (server, _) = create_test_server();

    server
        .put("/movies/1/rating")
        .json(&json!({ "rating": 5.0 }))
        .await
        .assert_status_ok();
    server
        .put("/movies/2/rating")
        .json(&json!({ "rating": 3.0 }))
        .await
        .assert_status_ok();

    let response = server.get("/recommendations").await;
    response.assert_status_ok();
    let results: Vec<Value> = response.json();
    assert_eq!(ids(&results), vec![5, 4, 3]);

    let response = server
        .get("/recommendations")
        .add_query_param("k", 2)
        .await;
    let results: Vec<Value> = response.json();
    assert_eq!(ids(&results), vec![4, 3]);
}
