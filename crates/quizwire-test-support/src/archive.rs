//! Recording and failing `QuizArchive` doubles.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use quizwire_core::archive::{
    FinalResultRecord, GameDetails, GameSummary, PlayerTotals, QuestionResultRecord, QuizArchive,
};
use quizwire_core::error::QuizError;
use uuid::Uuid;

/// One recorded write against the archive.
#[derive(Debug, Clone)]
pub enum ArchiveCall {
    /// `upsert_player(ext_uuid, name)` returning the mapped archive id.
    UpsertPlayer {
        /// Wire uuid presented.
        ext_uuid: Uuid,
        /// Name presented.
        name: String,
        /// Archive id handed back.
        player_id: Uuid,
    },
    /// `create_game(session_ext_id, question_count)` returning `game_id`.
    CreateGame {
        /// Wire session id presented.
        session_ext_id: String,
        /// Question count presented.
        question_count: u32,
        /// Archive id handed back.
        game_id: Uuid,
    },
    /// `add_participant(game_id, player_id)`.
    AddParticipant {
        /// Game linked.
        game_id: Uuid,
        /// Player linked.
        player_id: Uuid,
    },
    /// `record_question_result(game_id, record)`.
    RecordQuestionResult {
        /// Game written to.
        game_id: Uuid,
        /// The record as presented.
        record: QuestionResultRecord,
    },
    /// `complete_game(..)`.
    CompleteGame {
        /// Game completed.
        game_id: Uuid,
        /// Winner, if any.
        winner_id: Option<Uuid>,
        /// Participant count written.
        total_players: u32,
        /// Questions-asked count written.
        questions_asked: u32,
        /// Final lines written.
        final_results: Vec<FinalResultRecord>,
    },
}

/// An archive that records every write and serves configured read results.
///
/// `upsert_player` hands out a stable archive id per wire uuid, so tests
/// can follow a player across calls.
#[derive(Debug, Default)]
pub struct RecordingArchive {
    calls: Mutex<Vec<ArchiveCall>>,
    player_ids: Mutex<HashMap<Uuid, Uuid>>,
    games: Mutex<Vec<GameSummary>>,
    players: Mutex<Vec<PlayerTotals>>,
}

impl RecordingArchive {
    /// Creates an empty recording archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the result served by `recent_games`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_games(&self, games: Vec<GameSummary>) {
        *self.games.lock().unwrap() = games;
    }

    /// Seeds the result served by `top_players`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_players(&self, players: Vec<PlayerTotals>) {
        *self.players.lock().unwrap() = players;
    }

    /// Snapshot of every recorded call, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<ArchiveCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The archive id assigned to a wire uuid, if the player was upserted.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn player_id_for(&self, ext_uuid: Uuid) -> Option<Uuid> {
        self.player_ids.lock().unwrap().get(&ext_uuid).copied()
    }
}

#[async_trait]
impl QuizArchive for RecordingArchive {
    async fn upsert_player(&self, ext_uuid: Uuid, name: &str) -> Result<Uuid, QuizError> {
        let player_id = *self
            .player_ids
            .lock()
            .unwrap()
            .entry(ext_uuid)
            .or_insert_with(Uuid::new_v4);
        self.calls.lock().unwrap().push(ArchiveCall::UpsertPlayer {
            ext_uuid,
            name: name.to_owned(),
            player_id,
        });
        Ok(player_id)
    }

    async fn create_game(
        &self,
        session_ext_id: &str,
        question_count: u32,
    ) -> Result<Uuid, QuizError> {
        let game_id = Uuid::new_v4();
        self.calls.lock().unwrap().push(ArchiveCall::CreateGame {
            session_ext_id: session_ext_id.to_owned(),
            question_count,
            game_id,
        });
        Ok(game_id)
    }

    async fn add_participant(&self, game_id: Uuid, player_id: Uuid) -> Result<(), QuizError> {
        self.calls
            .lock()
            .unwrap()
            .push(ArchiveCall::AddParticipant { game_id, player_id });
        Ok(())
    }

    async fn record_question_result(
        &self,
        game_id: Uuid,
        record: QuestionResultRecord,
    ) -> Result<(), QuizError> {
        self.calls
            .lock()
            .unwrap()
            .push(ArchiveCall::RecordQuestionResult { game_id, record });
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
        self.calls.lock().unwrap().push(ArchiveCall::CompleteGame {
            game_id,
            winner_id,
            total_players,
            questions_asked,
            final_results: final_results.to_vec(),
        });
        Ok(())
    }

    async fn recent_games(&self, limit: i64) -> Result<Vec<GameSummary>, QuizError> {
        let games = self.games.lock().unwrap();
        let take = usize::try_from(limit).unwrap_or(0).min(games.len());
        Ok(games[..take].to_vec())
    }

    async fn game_details(&self, game_id: Uuid) -> Result<GameDetails, QuizError> {
        self.games
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.id == game_id)
            .map(|summary| GameDetails {
                summary: summary.clone(),
                participants: Vec::new(),
                question_results: Vec::new(),
            })
            .ok_or(QuizError::NotFound(game_id))
    }

    async fn top_players(&self, limit: i64) -> Result<Vec<PlayerTotals>, QuizError> {
        let players = self.players.lock().unwrap();
        let take = usize::try_from(limit).unwrap_or(0).min(players.len());
        Ok(players[..take].to_vec())
    }
}

/// An archive that fails every call. For verifying that persistence
/// failures never disturb the live session.
#[derive(Debug, Default)]
pub struct FailingArchive;

#[async_trait]
impl QuizArchive for FailingArchive {
    async fn upsert_player(&self, _ext_uuid: Uuid, _name: &str) -> Result<Uuid, QuizError> {
        Err(QuizError::Persistence("connection refused".to_owned()))
    }

    async fn create_game(
        &self,
        _session_ext_id: &str,
        _question_count: u32,
    ) -> Result<Uuid, QuizError> {
        Err(QuizError::Persistence("connection refused".to_owned()))
    }

    async fn add_participant(&self, _game_id: Uuid, _player_id: Uuid) -> Result<(), QuizError> {
        Err(QuizError::Persistence("connection refused".to_owned()))
    }

    async fn record_question_result(
        &self,
        _game_id: Uuid,
        _record: QuestionResultRecord,
    ) -> Result<(), QuizError> {
        Err(QuizError::Persistence("connection refused".to_owned()))
    }

    async fn complete_game(
        &self,
        _game_id: Uuid,
        _winner_id: Option<Uuid>,
        _total_players: u32,
        _questions_asked: u32,
        _final_results: &[FinalResultRecord],
    ) -> Result<(), QuizError> {
        Err(QuizError::Persistence("connection refused".to_owned()))
    }

    async fn recent_games(&self, _limit: i64) -> Result<Vec<GameSummary>, QuizError> {
        Err(QuizError::Persistence("connection refused".to_owned()))
    }

    async fn game_details(&self, _game_id: Uuid) -> Result<GameDetails, QuizError> {
        Err(QuizError::Persistence("connection refused".to_owned()))
    }

    async fn top_players(&self, _limit: i64) -> Result<Vec<PlayerTotals>, QuizError> {
        Err(QuizError::Persistence("connection refused".to_owned()))
    }
}
