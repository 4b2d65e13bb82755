//! Fire-and-forget mirroring into the archive.
//!
//! The orchestrator never awaits storage. It drops [`ArchiveOp`] values
//! into an unbounded queue; a spawned worker drains the queue in order,
//! resolves wire uuids to archive ids, and logs failures. A slow or dead
//! archive costs nothing but log lines — question progression and
//! feedback delivery never wait on it.

use std::collections::HashMap;
use std::sync::Arc;

use quizwire_core::archive::{FinalResultRecord, QuestionResultRecord, QuizArchive};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// One participant's final line, as the orchestrator hands it to the mirror.
#[derive(Debug, Clone)]
pub struct StandingSnapshot {
    /// The participant's wire uuid.
    pub player_uuid: Uuid,
    /// Final points.
    pub total_points: u32,
    /// Distinct questions answered.
    pub questions_answered: u32,
    /// 1-based rank.
    pub rank: u32,
}

/// Operations the live session mirrors into storage.
#[derive(Debug)]
pub enum ArchiveOp {
    /// A participant joined (or re-announced themselves).
    PlayerSeen {
        /// Wire uuid.
        uuid: Uuid,
        /// Display name.
        name: String,
    },
    /// A session was configured and started.
    GameStarted {
        /// Wire session id.
        session_id: String,
        /// Configured question count.
        question_count: u32,
        /// Wire uuids of participants present at start.
        roster: Vec<Uuid>,
    },
    /// An answer was accepted for the open question.
    AnswerRecorded {
        /// The answering participant.
        player_uuid: Uuid,
        /// Sequential question number (1-based).
        question_number: u32,
        /// Catalog id of the question.
        question_id: u32,
        /// Chosen option index.
        answer_index: usize,
        /// Whether the answer was correct.
        is_correct: bool,
        /// Player-reported response time in seconds.
        response_time: f64,
        /// Provisional points credited at arrival.
        points: u32,
    },
    /// The session completed with final standings.
    GameCompleted {
        /// Winner's wire uuid, if any participant was present.
        winner: Option<Uuid>,
        /// Number of participants at completion.
        total_players: u32,
        /// Questions actually asked.
        questions_asked: u32,
        /// Final lines, ranked.
        results: Vec<StandingSnapshot>,
    },
    /// Resolves once every previously queued operation has been applied.
    /// Used by shutdown paths and tests.
    Flush(oneshot::Sender<()>),
}

/// Handle for queueing archive operations. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ArchiveMirror {
    tx: mpsc::UnboundedSender<ArchiveOp>,
}

impl ArchiveMirror {
    /// Spawns the worker task and returns the queue handle.
    #[must_use]
    pub fn spawn(archive: Arc<dyn QuizArchive>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(archive, rx));
        Self { tx }
    }

    /// A handle whose worker never existed. Every record is dropped.
    /// For deployments and tests that run without historical storage.
    #[must_use]
    pub fn disconnected() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }

    /// Queues an operation. Never blocks; if the worker is gone the
    /// operation is dropped, matching best-effort semantics.
    pub fn record(&self, op: ArchiveOp) {
        if self.tx.send(op).is_err() {
            tracing::debug!("archive mirror worker is gone, dropping record");
        }
    }

    /// Waits until every operation queued before this call has been
    /// applied (or dropped, when no worker exists).
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(ArchiveOp::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

async fn run_worker(archive: Arc<dyn QuizArchive>, mut rx: mpsc::UnboundedReceiver<ArchiveOp>) {
    let mut worker = MirrorWorker {
        archive,
        players: HashMap::new(),
        game: None,
    };
    while let Some(op) = rx.recv().await {
        worker.apply(op).await;
    }
}

/// Worker-side state: the uuid → archive-id map and the active game.
struct MirrorWorker {
    archive: Arc<dyn QuizArchive>,
    players: HashMap<Uuid, Uuid>,
    game: Option<Uuid>,
}

impl MirrorWorker {
    async fn apply(&mut self, op: ArchiveOp) {
        match op {
            ArchiveOp::PlayerSeen { uuid, name } => match
                self.archive.upsert_player(uuid, &name).await
            {
                Ok(player_id) => {
                    self.players.insert(uuid, player_id);
                    if let Some(game_id) = self.game
                        && let Err(e) = self.archive.add_participant(game_id, player_id).await
                    {
                        tracing::warn!(error = %e, %uuid, "failed to link late participant");
                    }
                }
                Err(e) => tracing::warn!(error = %e, %uuid, "failed to upsert player"),
            },
            ArchiveOp::GameStarted {
                session_id,
                question_count,
                roster,
            } => match self.archive.create_game(&session_id, question_count).await {
                Ok(game_id) => {
                    self.game = Some(game_id);
                    for uuid in roster {
                        if let Some(&player_id) = self.players.get(&uuid)
                            && let Err(e) =
                                self.archive.add_participant(game_id, player_id).await
                        {
                            tracing::warn!(error = %e, %uuid, "failed to link participant");
                        }
                    }
                }
                Err(e) => {
                    self.game = None;
                    tracing::warn!(error = %e, %session_id, "failed to create game record");
                }
            },
            ArchiveOp::AnswerRecorded {
                player_uuid,
                question_number,
                question_id,
                answer_index,
                is_correct,
                response_time,
                points,
            } => {
                let (Some(game_id), Some(&player_id)) =
                    (self.game, self.players.get(&player_uuid))
                else {
                    tracing::debug!(%player_uuid, "no archive ids for answer, skipping");
                    return;
                };
                let record = QuestionResultRecord {
                    player_id,
                    question_number,
                    question_id,
                    answer_index,
                    is_correct,
                    response_time,
                    points,
                };
                if let Err(e) = self.archive.record_question_result(game_id, record).await {
                    tracing::warn!(error = %e, %player_uuid, "failed to record answer");
                }
            }
            ArchiveOp::GameCompleted {
                winner,
                total_players,
                questions_asked,
                results,
            } => {
                let Some(game_id) = self.game.take() else {
                    tracing::debug!("no game record open, skipping completion");
                    return;
                };
                let winner_id = winner.and_then(|uuid| self.players.get(&uuid).copied());
                let final_results: Vec<FinalResultRecord> = results
                    .iter()
                    .filter_map(|row| {
                        self.players
                            .get(&row.player_uuid)
                            .map(|&player_id| FinalResultRecord {
                                player_id,
                                total_points: row.total_points,
                                questions_answered: row.questions_answered,
                                rank: row.rank,
                            })
                    })
                    .collect();
                if let Err(e) = self
                    .archive
                    .complete_game(
                        game_id,
                        winner_id,
                        total_players,
                        questions_asked,
                        &final_results,
                    )
                    .await
                {
                    tracing::warn!(error = %e, "failed to complete game record");
                }
            }
            ArchiveOp::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
