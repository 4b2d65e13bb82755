//! Shared application state.

use std::sync::Arc;

use quizwire_core::archive::QuizArchive;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The archive serving the read-side queries.
    pub archive: Arc<dyn QuizArchive>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(archive: Arc<dyn QuizArchive>) -> Self {
        Self { archive }
    }
}
