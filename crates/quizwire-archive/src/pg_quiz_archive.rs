//! `PostgreSQL` implementation of the `QuizArchive` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quizwire_core::archive::{
    FinalResultRecord, GameDetails, GameSummary, ParticipantResult, PlayerTotals,
    QuestionResultRecord, QuestionResultRow, QuizArchive,
};
use quizwire_core::error::QuizError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed quiz archive.
#[derive(Debug, Clone)]
pub struct PgQuizArchive {
    pool: PgPool,
}

impl PgQuizArchive {
    /// Creates a new `PgQuizArchive` over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the archive tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Persistence`] when the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), QuizError> {
        sqlx::raw_sql(crate::schema::CREATE_ARCHIVE_TABLES)
            .execute(&self.pool)
            .await
            .map_err(persistence_err)?;
        Ok(())
    }
}

fn persistence_err(e: sqlx::Error) -> QuizError {
    tracing::error!(error = %e, "archive query failed");
    QuizError::Persistence(e.to_string())
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[derive(sqlx::FromRow)]
struct GameSummaryRow {
    id: Uuid,
    session_ext_id: String,
    question_count: i32,
    status: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    winner_name: Option<String>,
    total_players: i64,
}

impl From<GameSummaryRow> for GameSummary {
    fn from(row: GameSummaryRow) -> Self {
        Self {
            id: row.id,
            session_ext_id: row.session_ext_id,
            question_count: row.question_count,
            status: row.status,
            created_at: row.created_at,
            completed_at: row.completed_at,
            winner_name: row.winner_name,
            total_players: row.total_players,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ParticipantResultRow {
    player_name: String,
    total_points: Option<i32>,
    questions_answered: Option<i32>,
    final_rank: Option<i32>,
}

impl From<ParticipantResultRow> for ParticipantResult {
    fn from(row: ParticipantResultRow) -> Self {
        Self {
            player_name: row.player_name,
            total_points: row.total_points,
            questions_answered: row.questions_answered,
            final_rank: row.final_rank,
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionResultDbRow {
    player_name: String,
    question_number: i32,
    question_id: i32,
    answer_index: i32,
    is_correct: bool,
    response_time: f64,
    points_earned: i32,
}

impl From<QuestionResultDbRow> for QuestionResultRow {
    fn from(row: QuestionResultDbRow) -> Self {
        Self {
            player_name: row.player_name,
            question_number: row.question_number,
            question_id: row.question_id,
            answer_index: row.answer_index,
            is_correct: row.is_correct,
            response_time: row.response_time,
            points_earned: row.points_earned,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlayerTotalsRow {
    name: String,
    total_wins: i32,
    total_games: i32,
    total_points: i32,
}

impl From<PlayerTotalsRow> for PlayerTotals {
    fn from(row: PlayerTotalsRow) -> Self {
        Self {
            name: row.name,
            total_wins: row.total_wins,
            total_games: row.total_games,
            total_points: row.total_points,
        }
    }
}

const GAME_SUMMARY_SELECT: &str = r"
SELECT g.id,
       g.session_ext_id,
       g.question_count,
       g.status,
       g.created_at,
       g.completed_at,
       w.name AS winner_name,
       (SELECT COUNT(*) FROM game_participants gp WHERE gp.game_id = g.id) AS total_players
FROM games g
LEFT JOIN players w ON w.id = g.winner_id
";

#[async_trait]
impl QuizArchive for PgQuizArchive {
    async fn upsert_player(&self, ext_uuid: Uuid, name: &str) -> Result<Uuid, QuizError> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO players (ext_uuid, name, last_seen)
            VALUES ($1, $2, NOW())
            ON CONFLICT (ext_uuid)
            DO UPDATE SET name = EXCLUDED.name, last_seen = NOW()
            RETURNING id
            ",
        )
        .bind(ext_uuid)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence_err)?;
        Ok(id)
    }

    async fn create_game(
        &self,
        session_ext_id: &str,
        question_count: u32,
    ) -> Result<Uuid, QuizError> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO games (session_ext_id, question_count, status)
            VALUES ($1, $2, 'in_progress')
            RETURNING id
            ",
        )
        .bind(session_ext_id)
        .bind(clamp_i32(question_count))
        .fetch_one(&self.pool)
        .await
        .map_err(persistence_err)?;
        Ok(id)
    }

    async fn add_participant(&self, game_id: Uuid, player_id: Uuid) -> Result<(), QuizError> {
        sqlx::query(
            r"
            INSERT INTO game_participants (game_id, player_id)
            VALUES ($1, $2)
            ON CONFLICT (game_id, player_id) DO NOTHING
            ",
        )
        .bind(game_id)
        .bind(player_id)
        .execute(&self.pool)
        .await
        .map_err(persistence_err)?;
        Ok(())
    }

    async fn record_question_result(
        &self,
        game_id: Uuid,
        record: QuestionResultRecord,
    ) -> Result<(), QuizError> {
        sqlx::query(
            r"
            INSERT INTO question_results
                (game_id, player_id, question_number, question_id,
                 answer_index, is_correct, response_time, points_earned)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(game_id)
        .bind(record.player_id)
        .bind(clamp_i32(record.question_number))
        .bind(clamp_i32(record.question_id))
        .bind(i32::try_from(record.answer_index).unwrap_or(i32::MAX))
        .bind(record.is_correct)
        .bind(record.response_time)
        .bind(clamp_i32(record.points))
        .execute(&self.pool)
        .await
        .map_err(persistence_err)?;
        Ok(())
    }

    async fn complete_game(
        &self,
        game_id: Uuid,
        winner_id: Option<Uuid>,
        total_players: u32,
        questions_asked: u32,
        final_results: &[FinalResultRecord],
    ) -> Result<(), QuizError> {
        let mut tx = self.pool.begin().await.map_err(persistence_err)?;

        sqlx::query(
            r"
            UPDATE games
            SET status = 'completed',
                completed_at = NOW(),
                winner_id = $2,
                total_players = $3,
                questions_asked = $4
            WHERE id = $1
            ",
        )
        .bind(game_id)
        .bind(winner_id)
        .bind(clamp_i32(total_players))
        .bind(clamp_i32(questions_asked))
        .execute(&mut *tx)
        .await
        .map_err(persistence_err)?;

        for result in final_results {
            sqlx::query(
                r"
                UPDATE game_participants
                SET total_points = $3, questions_answered = $4, final_rank = $5
                WHERE game_id = $1 AND player_id = $2
                ",
            )
            .bind(game_id)
            .bind(result.player_id)
            .bind(clamp_i32(result.total_points))
            .bind(clamp_i32(result.questions_answered))
            .bind(clamp_i32(result.rank))
            .execute(&mut *tx)
            .await
            .map_err(persistence_err)?;

            sqlx::query(
                r"
                UPDATE players
                SET total_games = total_games + 1,
                    total_wins = total_wins + $2,
                    total_points = total_points + $3
                WHERE id = $1
                ",
            )
            .bind(result.player_id)
            .bind(i32::from(result.rank == 1))
            .bind(clamp_i32(result.total_points))
            .execute(&mut *tx)
            .await
            .map_err(persistence_err)?;
        }

        tx.commit().await.map_err(persistence_err)?;
        Ok(())
    }

    async fn recent_games(&self, limit: i64) -> Result<Vec<GameSummary>, QuizError> {
        let query = format!("{GAME_SUMMARY_SELECT} ORDER BY g.created_at DESC LIMIT $1");
        let rows: Vec<GameSummaryRow> = sqlx::query_as(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_err)?;
        Ok(rows.into_iter().map(GameSummary::from).collect())
    }

    async fn game_details(&self, game_id: Uuid) -> Result<GameDetails, QuizError> {
        let query = format!("{GAME_SUMMARY_SELECT} WHERE g.id = $1");
        let summary: Option<GameSummaryRow> = sqlx::query_as(&query)
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence_err)?;
        let summary = summary.ok_or(QuizError::NotFound(game_id))?;

        let participants: Vec<ParticipantResultRow> = sqlx::query_as(
            r"
            SELECT p.name AS player_name,
                   gp.total_points,
                   gp.questions_answered,
                   gp.final_rank
            FROM game_participants gp
            JOIN players p ON p.id = gp.player_id
            WHERE gp.game_id = $1
            ORDER BY gp.final_rank NULLS LAST, p.name
            ",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;

        let question_results: Vec<QuestionResultDbRow> = sqlx::query_as(
            r"
            SELECT p.name AS player_name,
                   qr.question_number,
                   qr.question_id,
                   qr.answer_index,
                   qr.is_correct,
                   qr.response_time,
                   qr.points_earned
            FROM question_results qr
            JOIN players p ON p.id = qr.player_id
            WHERE qr.game_id = $1
            ORDER BY qr.id
            ",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;

        Ok(GameDetails {
            summary: summary.into(),
            participants: participants.into_iter().map(ParticipantResult::from).collect(),
            question_results: question_results
                .into_iter()
                .map(QuestionResultRow::from)
                .collect(),
        })
    }

    async fn top_players(&self, limit: i64) -> Result<Vec<PlayerTotals>, QuizError> {
        let rows: Vec<PlayerTotalsRow> = sqlx::query_as(
            r"
            SELECT name, total_wins, total_games, total_points
            FROM players
            ORDER BY total_wins DESC, total_points DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_err)?;
        Ok(rows.into_iter().map(PlayerTotals::from).collect())
    }
}
