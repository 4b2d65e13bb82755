//! Per-channel message types.
//!
//! Field names and `type` tags match the wire format the original
//! deployment established, so a mixed fleet of clients stays compatible.
//! `target_player`, where present, narrows a broadcast: every client
//! receives the message, only the addressed client acts on it.

use chrono::{DateTime, Utc};
use quizwire_scoring::FinalStanding;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages on the Lobby channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LobbyMessage {
    /// A player announces themselves.
    PlayerJoin {
        /// The player's stable wire uuid.
        player_uuid: Uuid,
        /// Display name.
        player_name: String,
        /// When the player joined, by their clock.
        joined_at: DateTime<Utc>,
    },
    /// A player departs.
    PlayerLeave {
        /// The player's stable wire uuid.
        player_uuid: Uuid,
        /// Display name.
        player_name: String,
    },
}

/// The question as players see it: no correct index, no explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPayload {
    /// Catalog id.
    pub id: u32,
    /// Question text.
    pub text: String,
    /// Answer options in display order.
    pub options: Vec<String>,
}

/// Messages on the Questions channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionMessage {
    /// The host opens a question.
    QuestionAsked {
        /// The question, with the answer withheld.
        question: QuestionPayload,
        /// The session this question belongs to.
        session_id: String,
        /// Sequence number within the session (1-based).
        question_number: u32,
        /// Configured question count.
        total_questions: u32,
        /// When set, only this player should act (late-join re-send).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_player: Option<Uuid>,
    },
}

/// Messages on the Answers channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerMessage {
    /// A player submits an answer to the open question.
    AnswerSubmitted {
        /// The answering player.
        player_uuid: Uuid,
        /// Display name.
        player_name: String,
        /// Catalog id of the question being answered.
        question_id: u32,
        /// Chosen option index.
        answer_index: usize,
        /// When the answer was selected, by the player's clock.
        answered_at: DateTime<Utc>,
        /// When the question arrived at the player.
        question_asked_at: DateTime<Utc>,
        /// Elapsed seconds between question receipt and selection.
        response_time: f64,
    },
    /// The host's verdict on one player's answer (or lack of one).
    AnswerResult {
        /// The addressed player; other clients ignore the message.
        player_uuid: Uuid,
        /// Whether the chosen option was correct.
        is_correct: bool,
        /// Whether this was the fastest correct answer recorded so far.
        was_fastest: bool,
        /// Human-readable verdict line.
        feedback: String,
        /// The question's explanation text.
        explanation: String,
        /// The response time being judged, in seconds.
        response_time: f64,
        /// Catalog id of the judged question.
        question_id: u32,
        /// The correct option index, revealed with the verdict.
        correct_answer_index: usize,
        /// The correct option's text.
        correct_answer_text: String,
    },
}

/// Session configuration as broadcast to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// The generated session id.
    pub session_id: String,
    /// How many questions the session will ask.
    pub question_count: u32,
}

/// Completion metadata attached to final results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Configured question count.
    pub total_questions: u32,
    /// When the session completed.
    pub completed_at: DateTime<Utc>,
}

/// The winner's line in the final results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerSummary {
    /// The winning player.
    pub player_uuid: Uuid,
    /// Display name.
    pub player_name: String,
    /// Winning total.
    pub total_points: u32,
    /// Congratulations line for direct display.
    pub message: String,
}

/// Messages on the GameControl channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// A session has been configured (and, atomically, started).
    QuizConfigured {
        /// The session's configuration.
        config: SessionConfig,
        /// When set, a late-join recovery re-send for one player.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_player: Option<Uuid>,
    },
    /// The session is underway.
    QuizStarted {
        /// The session id.
        session_id: String,
        /// Configured question count.
        question_count: u32,
        /// Host-side start instant.
        start_time: DateTime<Utc>,
    },
    /// Final standings at session completion.
    QuizResults {
        /// The session id.
        session_id: String,
        /// Ranked standings, winner first.
        results: Vec<FinalStanding>,
        /// Completion metadata.
        summary: SessionSummary,
        /// The winner, when any participant was present.
        winner: Option<WinnerSummary>,
    },
    /// The host terminated the session without standings.
    GameEnd,
    /// A (late-joining) player asks for the current session state.
    RequestQuizState {
        /// The requesting player.
        player_uuid: Uuid,
        /// Display name.
        player_name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lobby_join_wire_tag() {
        let msg = LobbyMessage::PlayerJoin {
            player_uuid: Uuid::new_v4(),
            player_name: "alice".to_owned(),
            joined_at: Utc::now(),
        };

        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "player_join");
        assert_eq!(value["player_name"], "alice");
    }

    #[test]
    fn test_unknown_tag_fails_to_parse() {
        let value = serde_json::json!({ "type": "new_round", "round": 2 });

        let parsed: Result<ControlMessage, _> = serde_json::from_value(value);

        assert!(parsed.is_err());
    }

    #[test]
    fn test_question_asked_omits_target_when_broadcast() {
        let msg = QuestionMessage::QuestionAsked {
            question: QuestionPayload {
                id: 7,
                text: "?".to_owned(),
                options: vec!["a".to_owned(), "b".to_owned()],
            },
            session_id: "quiz-1".to_owned(),
            question_number: 1,
            total_questions: 3,
            target_player: None,
        };

        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "question_asked");
        assert!(value.get("target_player").is_none());
    }

    #[test]
    fn test_question_asked_round_trips_with_target() {
        let target = Uuid::new_v4();
        let msg = QuestionMessage::QuestionAsked {
            question: QuestionPayload {
                id: 7,
                text: "?".to_owned(),
                options: vec!["a".to_owned(), "b".to_owned()],
            },
            session_id: "quiz-1".to_owned(),
            question_number: 2,
            total_questions: 3,
            target_player: Some(target),
        };

        let value = serde_json::to_value(&msg).unwrap();
        let back: QuestionMessage = serde_json::from_value(value).unwrap();

        assert_eq!(back, msg);
    }

    #[test]
    fn test_game_end_is_a_bare_tag() {
        let value = serde_json::to_value(&ControlMessage::GameEnd).unwrap();
        assert_eq!(value, serde_json::json!({ "type": "game_end" }));
    }
}
