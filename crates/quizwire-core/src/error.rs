//! Common error type.

use thiserror::Error;
use uuid::Uuid;

/// Top-level error type shared across the quizwire crates.
#[derive(Debug, Error)]
pub enum QuizError {
    /// An operation was attempted in a session phase that does not allow it,
    /// or with arguments the state machine rejects.
    #[error("validation error: {0}")]
    Validation(String),

    /// A publish or subscribe operation against the channel transport failed.
    /// The session keeps running in a degraded state; the message is lost.
    #[error("transport error: {0}")]
    Transport(String),

    /// A historical-storage operation failed. Never propagated into the
    /// live game loop; logged at the call site.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A requested archive record does not exist.
    #[error("not found: {0}")]
    NotFound(Uuid),

    /// The question catalog could not be loaded or failed validation.
    #[error("catalog error: {0}")]
    Catalog(String),
}
