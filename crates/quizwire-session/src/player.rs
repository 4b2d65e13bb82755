//! Client-side player state machine.
//!
//! One instance per participant. Reconciles inbound session, question,
//! and feedback messages into local state and publishes joins, leaves,
//! and answers. Tolerates the transport's delivery quirks: duplicate
//! feedback is absorbed by a processed-set, targeted messages for other
//! players are ignored, and a late-join recovery question arriving before
//! its configuration message still lands correctly.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quizwire_core::clock::Clock;
use quizwire_protocol::{
    AnswerMessage, Channel, ChannelTransport, ControlMessage, Envelope, LobbyMessage,
    QuestionMessage, QuestionPayload, SessionConfig, SessionSummary, WinnerSummary,
};
use quizwire_scoring::FinalStanding;
use serde::Serialize;
use uuid::Uuid;

use crate::orchestrator::ConnectionHealth;

/// Player lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    /// Not announced to the lobby.
    NotJoined,
    /// Joined; no session configuration seen yet.
    AwaitingConfig,
    /// Session configured; waiting for a question.
    QuizReady,
    /// A question is on screen and unanswered.
    QuestionActive,
    /// Answer sent; waiting for the host's verdict.
    AnsweredAwaitingFeedback,
    /// Verdict received for the current question.
    FeedbackReceived,
    /// Final standings received.
    Completed,
}

/// The question currently in front of the player.
#[derive(Debug, Clone)]
pub struct ActiveQuestion {
    /// The question payload as broadcast.
    pub payload: QuestionPayload,
    /// Sequence number within the session.
    pub question_number: u32,
    /// Configured question count.
    pub total_questions: u32,
    /// Local receipt instant; response time measures from here.
    received_at: DateTime<Utc>,
    /// Whether an answer has been sent (exactly-once from this side).
    pub answered: bool,
    /// The option the player chose, once answered.
    pub selected: Option<usize>,
}

/// The host's verdict on the player's answer, as shown to them.
#[derive(Debug, Clone)]
pub struct FeedbackView {
    /// Catalog id of the judged question.
    pub question_id: u32,
    /// Whether the answer was correct.
    pub is_correct: bool,
    /// Whether it was the fastest correct answer at evaluation time.
    pub was_fastest: bool,
    /// Verdict line.
    pub feedback: String,
    /// Explanation text.
    pub explanation: String,
    /// The judged response time in seconds.
    pub response_time: f64,
    /// The correct option index.
    pub correct_answer_index: usize,
    /// The correct option text.
    pub correct_answer_text: String,
}

/// Final results as delivered at session completion.
#[derive(Debug, Clone)]
pub struct SessionResults {
    /// Ranked standings, winner first.
    pub standings: Vec<FinalStanding>,
    /// Completion metadata.
    pub summary: SessionSummary,
    /// The winner, when one was named.
    pub winner: Option<WinnerSummary>,
}

/// Running local tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStats {
    /// Questions this player has answered this session.
    pub questions_answered: u32,
    /// Cumulative points credited from feedback, each question counted
    /// exactly once.
    pub total_points: u32,
}

/// Client-side state machine for one participant.
pub struct PlayerSession {
    uuid: Uuid,
    name: String,
    phase: PlayerPhase,
    transport: Arc<dyn ChannelTransport>,
    clock: Arc<dyn Clock>,
    config: Option<SessionConfig>,
    question: Option<ActiveQuestion>,
    feedback: Option<FeedbackView>,
    results: Option<SessionResults>,
    stats: PlayerStats,
    /// Question ids whose feedback has already been counted. Cleared on
    /// every new session configuration.
    processed_questions: HashSet<u32>,
    joined_mid_session: bool,
    health: ConnectionHealth,
}

impl PlayerSession {
    /// Creates an unjoined player session.
    #[must_use]
    pub fn new(
        uuid: Uuid,
        name: impl Into<String>,
        transport: Arc<dyn ChannelTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            uuid,
            name: name.into(),
            phase: PlayerPhase::NotJoined,
            transport,
            clock,
            config: None,
            question: None,
            feedback: None,
            results: None,
            stats: PlayerStats::default(),
            processed_questions: HashSet::new(),
            joined_mid_session: false,
            health: ConnectionHealth::Connected,
        }
    }

    /// The player's wire uuid.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The player's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    /// Running tally.
    #[must_use]
    pub fn stats(&self) -> PlayerStats {
        self.stats
    }

    /// The question currently on screen, if any.
    #[must_use]
    pub fn current_question(&self) -> Option<&ActiveQuestion> {
        self.question.as_ref()
    }

    /// The most recent verdict, if any.
    #[must_use]
    pub fn last_feedback(&self) -> Option<&FeedbackView> {
        self.feedback.as_ref()
    }

    /// Final standings, once the session completed.
    #[must_use]
    pub fn session_results(&self) -> Option<&SessionResults> {
        self.results.as_ref()
    }

    /// The session configuration this player has seen.
    #[must_use]
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// Whether this player recovered into a session already in progress.
    #[must_use]
    pub fn joined_mid_session(&self) -> bool {
        self.joined_mid_session
    }

    /// Transport health as of the last publish attempt.
    #[must_use]
    pub fn health(&self) -> ConnectionHealth {
        self.health
    }

    /// Announces the player and requests session state, so the flow is
    /// identical whether or not a session is already running. No-op when
    /// already joined.
    pub async fn join(&mut self) {
        if !matches!(self.phase, PlayerPhase::NotJoined) {
            tracing::debug!(player = %self.uuid, "join ignored: already joined");
            return;
        }
        let joined_at = self.clock.now();
        let join = LobbyMessage::PlayerJoin {
            player_uuid: self.uuid,
            player_name: self.name.clone(),
            joined_at,
        };
        self.publish(Channel::Lobby, &join).await;
        let request = ControlMessage::RequestQuizState {
            player_uuid: self.uuid,
            player_name: self.name.clone(),
        };
        self.publish(Channel::GameControl, &request).await;
        self.phase = PlayerPhase::AwaitingConfig;
        tracing::info!(player = %self.uuid, name = %self.name, "joined lobby");
    }

    /// Announces departure and resets to the unjoined baseline.
    pub async fn leave(&mut self) {
        if matches!(self.phase, PlayerPhase::NotJoined) {
            tracing::debug!(player = %self.uuid, "leave ignored: not joined");
            return;
        }
        let leave = LobbyMessage::PlayerLeave {
            player_uuid: self.uuid,
            player_name: self.name.clone(),
        };
        self.publish(Channel::Lobby, &leave).await;
        self.phase = PlayerPhase::NotJoined;
        self.config = None;
        self.question = None;
        self.feedback = None;
        self.results = None;
        self.stats = PlayerStats::default();
        self.processed_questions.clear();
        self.joined_mid_session = false;
        tracing::info!(player = %self.uuid, "left lobby");
    }

    /// Selects an answer for the active question and submits it.
    ///
    /// A no-op once the question has been answered: from this side an
    /// answer is sent exactly once, even though the host would accept an
    /// overwrite. Response time is the elapsed time since the question
    /// arrived locally.
    #[allow(clippy::cast_precision_loss)]
    pub async fn select_answer(&mut self, answer_index: usize) {
        if !matches!(self.phase, PlayerPhase::QuestionActive) {
            tracing::debug!(player = %self.uuid, "answer ignored: no active question");
            return;
        }
        let Some(question) = self.question.as_ref() else {
            return;
        };
        if question.answered {
            return;
        }
        if answer_index >= question.payload.options.len() {
            tracing::debug!(player = %self.uuid, answer_index, "answer ignored: out of range");
            return;
        }

        let answered_at = self.clock.now();
        let response_time =
            answered_at.signed_duration_since(question.received_at).num_milliseconds() as f64
                / 1000.0;
        let message = AnswerMessage::AnswerSubmitted {
            player_uuid: self.uuid,
            player_name: self.name.clone(),
            question_id: question.payload.id,
            answer_index,
            answered_at,
            question_asked_at: question.received_at,
            response_time,
        };

        if let Some(question) = self.question.as_mut() {
            question.answered = true;
            question.selected = Some(answer_index);
        }
        self.stats.questions_answered += 1;
        self.phase = PlayerPhase::AnsweredAwaitingFeedback;
        self.publish(Channel::Answers, &message).await;
    }

    /// Dispatches one delivered envelope. Payloads that fail to parse,
    /// messages targeted at other players, and types this machine does
    /// not consume are ignored.
    pub async fn handle_envelope(&mut self, envelope: Envelope) {
        if matches!(self.phase, PlayerPhase::NotJoined) {
            return;
        }
        match envelope.channel {
            Channel::Questions => match serde_json::from_value(envelope.payload) {
                Ok(QuestionMessage::QuestionAsked {
                    question,
                    question_number,
                    total_questions,
                    target_player,
                    ..
                }) => self.apply_question(question, question_number, total_questions, target_player),
                Err(e) => tracing::debug!(error = %e, "ignoring unparseable question payload"),
            },
            Channel::Answers => match serde_json::from_value(envelope.payload) {
                Ok(AnswerMessage::AnswerResult {
                    player_uuid,
                    is_correct,
                    was_fastest,
                    feedback,
                    explanation,
                    response_time,
                    question_id,
                    correct_answer_index,
                    correct_answer_text,
                }) if player_uuid == self.uuid => self.apply_feedback(FeedbackView {
                    question_id,
                    is_correct,
                    was_fastest,
                    feedback,
                    explanation,
                    response_time,
                    correct_answer_index,
                    correct_answer_text,
                }),
                // Another player's verdict, or a submission echo.
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "ignoring unparseable answer payload"),
            },
            Channel::GameControl => match serde_json::from_value(envelope.payload) {
                Ok(ControlMessage::QuizConfigured {
                    config,
                    target_player,
                }) => self.apply_config(config, target_player),
                Ok(ControlMessage::QuizStarted { .. }) => {
                    self.question = None;
                    self.feedback = None;
                    self.results = None;
                    self.phase = PlayerPhase::QuizReady;
                }
                Ok(ControlMessage::QuizResults {
                    results,
                    summary,
                    winner,
                    ..
                }) => {
                    self.results = Some(SessionResults {
                        standings: results,
                        summary,
                        winner,
                    });
                    self.question = None;
                    self.phase = PlayerPhase::Completed;
                }
                Ok(ControlMessage::GameEnd) => {
                    self.question = None;
                    self.feedback = None;
                    self.phase = if self.config.is_some() {
                        PlayerPhase::QuizReady
                    } else {
                        PlayerPhase::AwaitingConfig
                    };
                }
                // REQUEST_QUIZ_STATE is host-consumed.
                Ok(ControlMessage::RequestQuizState { .. }) => {}
                Err(e) => tracing::debug!(error = %e, "ignoring unparseable control payload"),
            },
            // Lobby traffic is host-consumed.
            Channel::Lobby => {}
        }
    }

    fn apply_question(
        &mut self,
        payload: QuestionPayload,
        question_number: u32,
        total_questions: u32,
        target_player: Option<Uuid>,
    ) {
        if target_player.is_some_and(|target| target != self.uuid) {
            return;
        }
        self.question = Some(ActiveQuestion {
            payload,
            question_number,
            total_questions,
            received_at: self.clock.now(),
            answered: false,
            selected: None,
        });
        self.feedback = None;
        self.phase = PlayerPhase::QuestionActive;
        tracing::debug!(player = %self.uuid, question_number, "question received");
    }

    fn apply_config(&mut self, config: SessionConfig, target_player: Option<Uuid>) {
        if target_player.is_some_and(|target| target != self.uuid) {
            return;
        }
        let targeted = target_player.is_some();
        self.config = Some(config);
        self.results = None;
        self.stats = PlayerStats::default();
        self.processed_questions.clear();
        self.joined_mid_session = targeted;
        // A late-join recovery may deliver the open question before this
        // configuration message (cross-channel order is not guaranteed);
        // keep an already-active question in that case.
        if targeted && self.question.is_some() {
            return;
        }
        self.question = None;
        self.phase = PlayerPhase::QuizReady;
    }

    fn apply_feedback(&mut self, view: FeedbackView) {
        let question_id = view.question_id;
        self.feedback = Some(view);
        if matches!(
            self.phase,
            PlayerPhase::QuestionActive | PlayerPhase::AnsweredAwaitingFeedback
        ) {
            self.phase = PlayerPhase::FeedbackReceived;
        }

        // Idempotency guard: a question id affects the total exactly once,
        // no matter how often or in what order its verdict is delivered.
        if !self.processed_questions.insert(question_id) {
            tracing::debug!(player = %self.uuid, question_id, "duplicate feedback ignored");
            return;
        }
        let points = match self.feedback.as_ref() {
            Some(f) if f.is_correct && f.was_fastest => 3,
            Some(f) if f.is_correct => 1,
            _ => 0,
        };
        self.stats.total_points += points;
    }

    /// Best-effort publish, mirroring the orchestrator's policy: failures
    /// degrade health and drop the message, the machine never halts.
    async fn publish<T: Serialize>(&mut self, channel: Channel, message: &T) {
        // Serialization of derived Serialize types to Value is infallible.
        let payload =
            serde_json::to_value(message).expect("wire message serialization is infallible");
        match self.transport.publish(channel, payload).await {
            Ok(()) => self.health = ConnectionHealth::Connected,
            Err(e) => {
                self.health = ConnectionHealth::Degraded;
                tracing::warn!(%channel, error = %e, "publish failed, message lost");
            }
        }
    }
}
