//! Quizwire Archive — PostgreSQL-backed historical storage.
//!
//! Implements the [`quizwire_core::archive::QuizArchive`] gateway over a
//! `PgPool`. The live session only ever reaches this crate through the
//! fire-and-forget mirror, so every method here may be slow or failing
//! without affecting a running game.

pub mod pg_quiz_archive;
pub mod schema;

pub use pg_quiz_archive::PgQuizArchive;
