//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use quizwire_test_support::RecordingArchive;
use tower::ServiceExt;

use quizwire_api::routes;
use quizwire_api::state::AppState;

/// Build the full app router over a recording archive, using the same
/// route structure as `main.rs`.
pub fn build_test_app(archive: Arc<RecordingArchive>) -> Router {
    let app_state = AppState::new(archive);
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/reports", routes::reports::router())
        .with_state(app_state)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
