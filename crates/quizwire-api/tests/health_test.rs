//! Integration tests for the health endpoint.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use quizwire_test_support::RecordingArchive;

use common::{build_test_app, get_json};

#[tokio::test]
async fn test_health_returns_ok_and_version() {
    let app = build_test_app(Arc::new(RecordingArchive::new()));

    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}
