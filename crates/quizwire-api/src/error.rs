//! Quizwire — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quizwire_core::error::QuizError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// Archive schema setup failed.
    #[error("archive error: {0}")]
    Archive(#[from] QuizError),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `QuizError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub QuizError);

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            QuizError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            QuizError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            QuizError::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
            QuizError::Persistence(_) | QuizError::Catalog(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: QuizError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(QuizError::NotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(QuizError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_persistence_maps_to_500() {
        assert_eq!(
            status_of(QuizError::Persistence("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transport_maps_to_502() {
        assert_eq!(
            status_of(QuizError::Transport("bus gone".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
