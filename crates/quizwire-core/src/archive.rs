//! Archive gateway.
//!
//! The live session mirrors players, games, and per-question results into
//! historical storage through this trait. Every write is best-effort with
//! respect to the game loop: callers fire the operation and log failures,
//! they never wait on it before progressing the session. The read side
//! feeds the reporting view only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::QuizError;

/// One participant's final line in a completed game, as written to storage.
#[derive(Debug, Clone)]
pub struct FinalResultRecord {
    /// Archive id of the player (from [`QuizArchive::upsert_player`]).
    pub player_id: Uuid,
    /// Total points across the questions actually asked.
    pub total_points: u32,
    /// Number of distinct questions the player answered.
    pub questions_answered: u32,
    /// 1-based final rank.
    pub rank: u32,
}

/// One accepted answer, as written to storage while the round is live.
#[derive(Debug, Clone)]
pub struct QuestionResultRecord {
    /// Archive id of the player.
    pub player_id: Uuid,
    /// Sequential question number within the session (1-based).
    pub question_number: u32,
    /// Catalog id of the question.
    pub question_id: u32,
    /// The option index the player chose.
    pub answer_index: usize,
    /// Whether the chosen option was correct.
    pub is_correct: bool,
    /// Player-reported response time in seconds.
    pub response_time: f64,
    /// Points credited at arrival time (provisional; final standings are
    /// recomputed when the game completes).
    pub points: u32,
}

/// Summary row for the recent-games listing.
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    /// Archive id of the game.
    pub id: Uuid,
    /// The session id the game ran under on the wire.
    pub session_ext_id: String,
    /// Configured question count.
    pub question_count: i32,
    /// `in_progress` or `completed`.
    pub status: String,
    /// When the game was configured.
    pub created_at: DateTime<Utc>,
    /// When the game completed, if it did.
    pub completed_at: Option<DateTime<Utc>>,
    /// Display name of the winner, if the game completed with one.
    pub winner_name: Option<String>,
    /// Number of participants recorded.
    pub total_players: i64,
}

/// One participant's line in a game-details report.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantResult {
    /// Display name.
    pub player_name: String,
    /// Final points, if the game completed.
    pub total_points: Option<i32>,
    /// Distinct questions answered, if the game completed.
    pub questions_answered: Option<i32>,
    /// Final rank, if the game completed.
    pub final_rank: Option<i32>,
}

/// One recorded answer in a game-details report.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResultRow {
    /// Display name of the answering player.
    pub player_name: String,
    /// Sequential question number within the session.
    pub question_number: i32,
    /// Catalog id of the question.
    pub question_id: i32,
    /// Chosen option index.
    pub answer_index: i32,
    /// Whether the answer was correct.
    pub is_correct: bool,
    /// Player-reported response time in seconds.
    pub response_time: f64,
    /// Points credited at arrival time.
    pub points_earned: i32,
}

/// Full report for a single game.
#[derive(Debug, Clone, Serialize)]
pub struct GameDetails {
    /// The game's summary row.
    pub summary: GameSummary,
    /// Per-participant final lines.
    pub participants: Vec<ParticipantResult>,
    /// Every recorded answer, in insertion order.
    pub question_results: Vec<QuestionResultRow>,
}

/// Lifetime aggregate line for the top-players listing.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerTotals {
    /// Display name.
    pub name: String,
    /// Games won.
    pub total_wins: i32,
    /// Games participated in.
    pub total_games: i32,
    /// Points accumulated across all games.
    pub total_points: i32,
}

/// Historical storage for players, games, and results.
#[async_trait]
pub trait QuizArchive: Send + Sync {
    /// Registers or refreshes a player keyed by their wire uuid, returning
    /// the archive-side player id.
    async fn upsert_player(&self, ext_uuid: Uuid, name: &str) -> Result<Uuid, QuizError>;

    /// Creates a game record for a newly configured session.
    async fn create_game(&self, session_ext_id: &str, question_count: u32)
    -> Result<Uuid, QuizError>;

    /// Links a player to a game. Idempotent.
    async fn add_participant(&self, game_id: Uuid, player_id: Uuid) -> Result<(), QuizError>;

    /// Records one accepted answer.
    async fn record_question_result(
        &self,
        game_id: Uuid,
        record: QuestionResultRecord,
    ) -> Result<(), QuizError>;

    /// Marks a game completed and writes the final per-participant lines
    /// and lifetime player totals.
    async fn complete_game(
        &self,
        game_id: Uuid,
        winner_id: Option<Uuid>,
        total_players: u32,
        questions_asked: u32,
        final_results: &[FinalResultRecord],
    ) -> Result<(), QuizError>;

    /// Most recent games, newest first.
    async fn recent_games(&self, limit: i64) -> Result<Vec<GameSummary>, QuizError>;

    /// Full report for one game.
    ///
    /// Returns [`QuizError::NotFound`] when the game does not exist.
    async fn game_details(&self, game_id: Uuid) -> Result<GameDetails, QuizError>;

    /// Lifetime player totals ordered by wins.
    async fn top_players(&self, limit: i64) -> Result<Vec<PlayerTotals>, QuizError>;
}
