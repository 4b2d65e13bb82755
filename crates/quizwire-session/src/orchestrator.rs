//! Host-side session authority.
//!
//! Exactly one `Orchestrator` owns a session's mutable state. It is
//! driven by a serialized event loop ([`crate::runtime::HostRuntime`]):
//! handlers run to completion one at a time, which is what makes the
//! overwrite-on-resubmit and fastest-so-far logic correct without locks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quizwire_bank::{Question, QuestionBank};
use quizwire_core::clock::Clock;
use quizwire_core::error::QuizError;
use quizwire_core::rng::Rng;
use quizwire_protocol::{
    AnswerMessage, Channel, ChannelTransport, ControlMessage, Envelope, LobbyMessage,
    QuestionMessage, QuestionPayload, SessionConfig, SessionSummary, WinnerSummary,
};
use quizwire_scoring::{ParticipantRef, RoundAnswer, RoundRecord, final_standings};
use serde::Serialize;
use uuid::Uuid;

use crate::mirror::{ArchiveMirror, ArchiveOp, StandingSnapshot};

/// Session lifecycle phases. Transitions are one-directional except for
/// the reconfigure edge out of `Completed` and the reset edge of `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session configured.
    Idle,
    /// Configured and started; no question open.
    Configured,
    /// A question is open and accepting answers.
    QuestionOpen,
    /// The question closed; awaiting advance or the next ask.
    QuestionClosed,
    /// The session completed with standings; reconfigure is allowed.
    Completed,
}

/// Transport health as seen from this machine's publish attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    /// Last publish succeeded.
    Connected,
    /// Last publish failed; messages are being lost, not queued.
    Degraded,
}

/// A registered participant. Roster order is join order.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Stable wire uuid.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Join instant, by the player's clock.
    pub joined_at: DateTime<Utc>,
}

/// An answer as received from the wire, before the orchestrator stamps it.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    /// The answering player.
    pub player_uuid: Uuid,
    /// Display name carried with the answer.
    pub player_name: String,
    /// Catalog id the player believes is open.
    pub question_id: u32,
    /// Chosen option index.
    pub answer_index: usize,
    /// Selection instant, by the player's clock.
    pub answered_at: DateTime<Utc>,
    /// Question receipt instant, by the player's clock.
    pub question_asked_at: DateTime<Utc>,
    /// Elapsed seconds between receipt and selection.
    pub response_time: f64,
}

/// An accepted answer with host-side stamps. Mutable (replaceable) until
/// the question closes.
#[derive(Debug, Clone)]
struct RecordedAnswer {
    answer_index: usize,
    response_time: f64,
    received_at: DateTime<Utc>,
    arrival_seq: u64,
}

/// The currently open question and its per-round answer state.
#[derive(Debug)]
struct OpenRound {
    question: Question,
    number: u32,
    answers: HashMap<Uuid, RecordedAnswer>,
}

/// Host-side authority for one session at a time.
pub struct Orchestrator {
    phase: SessionPhase,
    config: Option<SessionConfig>,
    roster: Vec<Participant>,
    used_questions: HashSet<u32>,
    questions_asked: u32,
    round: Option<OpenRound>,
    /// Bounded accumulator: one record per participant per asked question.
    rounds: Vec<RoundRecord>,
    arrival_seq: u64,
    bank: QuestionBank,
    transport: Arc<dyn ChannelTransport>,
    mirror: ArchiveMirror,
    clock: Arc<dyn Clock>,
    rng: Box<dyn Rng>,
    health: ConnectionHealth,
}

impl Orchestrator {
    /// Creates an idle orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        bank: QuestionBank,
        transport: Arc<dyn ChannelTransport>,
        mirror: ArchiveMirror,
        clock: Arc<dyn Clock>,
        rng: Box<dyn Rng>,
    ) -> Self {
        Self {
            phase: SessionPhase::Idle,
            config: None,
            roster: Vec::new(),
            used_questions: HashSet::new(),
            questions_asked: 0,
            round: None,
            rounds: Vec::new(),
            arrival_seq: 0,
            bank,
            transport,
            mirror,
            clock,
            rng,
            health: ConnectionHealth::Connected,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Transport health as of the last publish attempt.
    #[must_use]
    pub fn health(&self) -> ConnectionHealth {
        self.health
    }

    /// Registered participants in join order.
    #[must_use]
    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    /// The active configuration, when a session is underway.
    #[must_use]
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// Questions asked so far in the active session.
    #[must_use]
    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    /// The open question, while one is open.
    #[must_use]
    pub fn open_question(&self) -> Option<&Question> {
        self.round.as_ref().map(|r| &r.question)
    }

    /// Configures and immediately starts a new session.
    ///
    /// A `question_count` larger than the catalog is accepted; exhaustion
    /// at draw time completes the session early instead.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Validation`] unless the phase is `Idle` or
    /// `Completed`, or when `question_count` is zero.
    pub async fn configure(&mut self, question_count: u32) -> Result<(), QuizError> {
        if !matches!(self.phase, SessionPhase::Idle | SessionPhase::Completed) {
            return Err(QuizError::Validation(
                "a session is already in progress".to_owned(),
            ));
        }
        if question_count == 0 {
            return Err(QuizError::Validation(
                "question count must be positive".to_owned(),
            ));
        }

        self.reset_session_state();
        let session_id = format!("quiz-{}", Uuid::new_v4().simple());
        let config = SessionConfig {
            session_id: session_id.clone(),
            question_count,
        };
        self.config = Some(config.clone());
        self.phase = SessionPhase::Configured;
        tracing::info!(%session_id, question_count, "session configured");

        self.mirror.record(ArchiveOp::GameStarted {
            session_id: session_id.clone(),
            question_count,
            roster: self.roster.iter().map(|p| p.uuid).collect(),
        });

        self.publish(
            Channel::GameControl,
            &ControlMessage::QuizConfigured {
                config,
                target_player: None,
            },
        )
        .await;
        let start_time = self.clock.now();
        self.publish(
            Channel::GameControl,
            &ControlMessage::QuizStarted {
                session_id,
                question_count,
                start_time,
            },
        )
        .await;
        Ok(())
    }

    /// Opens the next question, or completes the session when the
    /// configured count has been asked or the catalog is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Validation`] unless the phase is `Configured`
    /// or `QuestionClosed`.
    pub async fn ask_next(&mut self) -> Result<(), QuizError> {
        if !matches!(
            self.phase,
            SessionPhase::Configured | SessionPhase::QuestionClosed
        ) {
            return Err(QuizError::Validation(
                "cannot ask a question in this phase".to_owned(),
            ));
        }
        let Some(config) = self.config.clone() else {
            return Err(QuizError::Validation("no session configured".to_owned()));
        };

        if self.questions_asked >= config.question_count {
            return self.complete().await;
        }
        let Some(question) = self
            .bank
            .draw_unused(&self.used_questions, self.rng.as_mut())
            .cloned()
        else {
            tracing::info!("question pool exhausted, completing early");
            return self.complete().await;
        };

        self.used_questions.insert(question.id);
        self.questions_asked += 1;
        let number = self.questions_asked;
        let message = QuestionMessage::QuestionAsked {
            question: QuestionPayload {
                id: question.id,
                text: question.text.clone(),
                options: question.options.clone(),
            },
            session_id: config.session_id,
            question_number: number,
            total_questions: config.question_count,
            target_player: None,
        };
        self.round = Some(OpenRound {
            question,
            number,
            answers: HashMap::new(),
        });
        self.phase = SessionPhase::QuestionOpen;
        tracing::info!(question_number = number, "question opened");

        self.publish(Channel::Questions, &message).await;
        Ok(())
    }

    /// Accepts an answer for the open question.
    ///
    /// Silently ignores answers outside `QuestionOpen`, for a different
    /// question id, from unregistered players, or with an out-of-range
    /// option index (fails closed). A resubmission replaces the previous
    /// answer, timing included, and is restamped with the new receipt
    /// time. Every accepted submission triggers immediate feedback
    /// evaluated against the answers recorded so far — a faster answer
    /// arriving later does not retroactively correct feedback already
    /// delivered.
    pub async fn submit_answer(&mut self, submission: AnswerSubmission) {
        if !matches!(self.phase, SessionPhase::QuestionOpen) {
            tracing::debug!(player = %submission.player_uuid, "answer ignored: no open question");
            return;
        }
        if !self.roster.iter().any(|p| p.uuid == submission.player_uuid) {
            tracing::debug!(player = %submission.player_uuid, "answer ignored: unknown player");
            return;
        }

        let received_at = self.clock.now();
        let arrival_seq = self.arrival_seq;
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if round.question.id != submission.question_id {
            tracing::debug!(
                player = %submission.player_uuid,
                question_id = submission.question_id,
                "answer ignored: not the open question"
            );
            return;
        }
        if submission.answer_index >= round.question.options.len() {
            tracing::debug!(
                player = %submission.player_uuid,
                answer_index = submission.answer_index,
                "answer ignored: option index out of range"
            );
            return;
        }

        round.answers.insert(
            submission.player_uuid,
            RecordedAnswer {
                answer_index: submission.answer_index,
                response_time: submission.response_time,
                received_at,
                arrival_seq,
            },
        );
        self.arrival_seq += 1;

        let correct_index = round.question.correct_index;
        let is_correct = submission.answer_index == correct_index;
        let fastest_correct = round
            .answers
            .values()
            .filter(|a| a.answer_index == correct_index)
            .map(|a| a.response_time)
            .min_by(f64::total_cmp);
        let was_fastest = is_correct
            && fastest_correct.is_some_and(|m| submission.response_time.total_cmp(&m).is_eq());
        let correct_count = round
            .answers
            .values()
            .filter(|a| a.answer_index == correct_index)
            .count();
        let feedback = if is_correct {
            if was_fastest {
                "Right, and fastest!"
            } else {
                "Right, but not fastest"
            }
        } else {
            "Wrong"
        };
        let result = AnswerMessage::AnswerResult {
            player_uuid: submission.player_uuid,
            is_correct,
            was_fastest,
            feedback: feedback.to_owned(),
            explanation: round.question.explanation.clone(),
            response_time: submission.response_time,
            question_id: round.question.id,
            correct_answer_index: correct_index,
            correct_answer_text: round.question.options[correct_index].clone(),
        };
        let points = if is_correct {
            if correct_count == 1 { 3 } else { 1 }
        } else {
            0
        };
        let mirror_op = ArchiveOp::AnswerRecorded {
            player_uuid: submission.player_uuid,
            question_number: round.number,
            question_id: round.question.id,
            answer_index: submission.answer_index,
            is_correct,
            response_time: submission.response_time,
            points,
        };

        self.mirror.record(mirror_op);
        self.publish(Channel::Answers, &result).await;
    }

    /// Closes the open question: every registered participant without a
    /// recorded answer receives a synthesized "no answer" verdict carrying
    /// the correct answer and explanation, and the round folds into the
    /// accumulator.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Validation`] unless the phase is `QuestionOpen`.
    pub async fn close_question(&mut self) -> Result<(), QuizError> {
        if !matches!(self.phase, SessionPhase::QuestionOpen) {
            return Err(QuizError::Validation("no question is open".to_owned()));
        }
        let Some(round) = self.round.as_ref() else {
            return Err(QuizError::Validation("no question is open".to_owned()));
        };

        let verdicts: Vec<AnswerMessage> = self
            .roster
            .iter()
            .filter(|p| !round.answers.contains_key(&p.uuid))
            .map(|p| AnswerMessage::AnswerResult {
                player_uuid: p.uuid,
                is_correct: false,
                was_fastest: false,
                feedback: "No answer submitted".to_owned(),
                explanation: round.question.explanation.clone(),
                response_time: 0.0,
                question_id: round.question.id,
                correct_answer_index: round.question.correct_index,
                correct_answer_text: round.question.options[round.question.correct_index].clone(),
            })
            .collect();

        for verdict in &verdicts {
            self.publish(Channel::Answers, verdict).await;
        }
        self.fold_open_round();
        self.phase = SessionPhase::QuestionClosed;
        tracing::info!(question_number = self.questions_asked, "question closed");
        Ok(())
    }

    /// Clears the closed question, returning to accepting `ask_next`.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Validation`] unless the phase is
    /// `QuestionClosed`.
    pub fn advance(&mut self) -> Result<(), QuizError> {
        if !matches!(self.phase, SessionPhase::QuestionClosed) {
            return Err(QuizError::Validation(
                "no closed question to advance past".to_owned(),
            ));
        }
        self.round = None;
        self.phase = SessionPhase::Configured;
        Ok(())
    }

    /// Completes the session: folds any still-open round, computes final
    /// standings for every known participant, broadcasts them with the
    /// winner, mirrors completion, and resets to the idle baseline.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Validation`] when no session is configured.
    pub async fn complete(&mut self) -> Result<(), QuizError> {
        let Some(config) = self.config.take() else {
            return Err(QuizError::Validation("no session configured".to_owned()));
        };
        if matches!(self.phase, SessionPhase::QuestionOpen) {
            self.fold_open_round();
        }

        let participants: Vec<ParticipantRef> = self
            .roster
            .iter()
            .map(|p| ParticipantRef {
                uuid: p.uuid,
                name: p.name.clone(),
            })
            .collect();
        let standings = final_standings(&self.rounds, &participants);
        let winner = standings.first().map(|top| WinnerSummary {
            player_uuid: top.player_uuid,
            player_name: top.player_name.clone(),
            total_points: top.total_points,
            message: format!(
                "Congratulations {}! You won with {} points!",
                top.player_name, top.total_points
            ),
        });

        self.mirror.record(ArchiveOp::GameCompleted {
            winner: winner.as_ref().map(|w| w.player_uuid),
            total_players: u32::try_from(self.roster.len()).unwrap_or(u32::MAX),
            questions_asked: self.questions_asked,
            results: standings
                .iter()
                .map(|row| StandingSnapshot {
                    player_uuid: row.player_uuid,
                    total_points: row.total_points,
                    questions_answered: row.questions_answered,
                    rank: row.rank,
                })
                .collect(),
        });

        let completed_at = self.clock.now();
        let message = ControlMessage::QuizResults {
            session_id: config.session_id.clone(),
            results: standings,
            summary: SessionSummary {
                total_questions: config.question_count,
                completed_at,
            },
            winner,
        };
        self.publish(Channel::GameControl, &message).await;

        self.reset_session_state();
        self.phase = SessionPhase::Completed;
        tracing::info!(session_id = %config.session_id, "session completed");
        Ok(())
    }

    /// Terminates the session without computing standings: broadcasts
    /// `GAME_END` and resets every piece of ephemeral state.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Validation`] when the phase is `Idle`.
    pub async fn stop(&mut self) -> Result<(), QuizError> {
        if matches!(self.phase, SessionPhase::Idle) {
            return Err(QuizError::Validation("no session to stop".to_owned()));
        }
        self.publish(Channel::GameControl, &ControlMessage::GameEnd)
            .await;
        self.config = None;
        self.reset_session_state();
        self.phase = SessionPhase::Idle;
        tracing::info!("session stopped");
        Ok(())
    }

    /// Registers a participant. Idempotent: a repeated join is a no-op.
    pub fn handle_join(&mut self, uuid: Uuid, name: &str, joined_at: DateTime<Utc>) {
        if self.roster.iter().any(|p| p.uuid == uuid) {
            tracing::debug!(%uuid, "duplicate join ignored");
            return;
        }
        self.roster.push(Participant {
            uuid,
            name: name.to_owned(),
            joined_at,
        });
        tracing::info!(%uuid, name, "player joined");
        self.mirror.record(ArchiveOp::PlayerSeen {
            uuid,
            name: name.to_owned(),
        });
    }

    /// Removes a participant. Idempotent: leaving twice is a no-op.
    pub fn handle_leave(&mut self, uuid: Uuid) {
        let before = self.roster.len();
        self.roster.retain(|p| p.uuid != uuid);
        if self.roster.len() < before {
            tracing::info!(%uuid, "player left");
        }
    }

    /// Late-join recovery: re-sends the current configuration, and the
    /// open question if one is live, addressed to the requesting player.
    /// A no-op when no session is active.
    pub async fn handle_state_request(&mut self, player_uuid: Uuid) {
        let Some(config) = self.config.clone() else {
            return;
        };
        self.publish(
            Channel::GameControl,
            &ControlMessage::QuizConfigured {
                config: config.clone(),
                target_player: Some(player_uuid),
            },
        )
        .await;

        if !matches!(self.phase, SessionPhase::QuestionOpen) {
            return;
        }
        let Some(round) = self.round.as_ref() else {
            return;
        };
        let message = QuestionMessage::QuestionAsked {
            question: QuestionPayload {
                id: round.question.id,
                text: round.question.text.clone(),
                options: round.question.options.clone(),
            },
            session_id: config.session_id,
            question_number: round.number,
            total_questions: config.question_count,
            target_player: Some(player_uuid),
        };
        self.publish(Channel::Questions, &message).await;
    }

    /// Dispatches one delivered envelope. Payloads that fail to parse and
    /// message types this machine does not consume (including its own
    /// broadcasts echoing back) are ignored.
    pub async fn handle_envelope(&mut self, envelope: Envelope) {
        match envelope.channel {
            Channel::Lobby => match serde_json::from_value(envelope.payload) {
                Ok(LobbyMessage::PlayerJoin {
                    player_uuid,
                    player_name,
                    joined_at,
                }) => self.handle_join(player_uuid, &player_name, joined_at),
                Ok(LobbyMessage::PlayerLeave { player_uuid, .. }) => {
                    self.handle_leave(player_uuid);
                }
                Err(e) => tracing::debug!(error = %e, "ignoring unparseable lobby payload"),
            },
            Channel::Answers => match serde_json::from_value(envelope.payload) {
                Ok(AnswerMessage::AnswerSubmitted {
                    player_uuid,
                    player_name,
                    question_id,
                    answer_index,
                    answered_at,
                    question_asked_at,
                    response_time,
                }) => {
                    self.submit_answer(AnswerSubmission {
                        player_uuid,
                        player_name,
                        question_id,
                        answer_index,
                        answered_at,
                        question_asked_at,
                        response_time,
                    })
                    .await;
                }
                // The host's own verdicts echo back on this channel.
                Ok(AnswerMessage::AnswerResult { .. }) => {}
                Err(e) => tracing::debug!(error = %e, "ignoring unparseable answer payload"),
            },
            Channel::GameControl => match serde_json::from_value(envelope.payload) {
                Ok(ControlMessage::RequestQuizState { player_uuid, .. }) => {
                    self.handle_state_request(player_uuid).await;
                }
                // The host's own control broadcasts echo back.
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "ignoring unparseable control payload"),
            },
            // The host publishes questions, it never consumes them.
            Channel::Questions => {}
        }
    }

    /// Folds the open round's final answers into the bounded accumulator.
    fn fold_open_round(&mut self) {
        if let Some(round) = self.round.as_mut() {
            let answers = round
                .answers
                .drain()
                .map(|(player_uuid, a)| RoundAnswer {
                    player_uuid,
                    answer_index: a.answer_index,
                    response_time: a.response_time,
                    arrival_seq: a.arrival_seq,
                })
                .collect();
            self.rounds.push(RoundRecord {
                question_number: round.number,
                correct_index: round.question.correct_index,
                answers,
            });
        }
    }

    /// Resets every piece of session-scoped state. The roster survives:
    /// connected players roll over into the next session.
    fn reset_session_state(&mut self) {
        self.used_questions.clear();
        self.rounds.clear();
        self.questions_asked = 0;
        self.round = None;
        self.arrival_seq = 0;
    }

    /// Best-effort publish: a failure flips health to `Degraded` and the
    /// message is lost; the state machine never halts on transport errors.
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
