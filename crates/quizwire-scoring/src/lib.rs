//! Quizwire Scoring — pure functions over collected answers.
//!
//! No clocks, no transport, no storage: a closed question's answers go in,
//! statuses and points come out. The orchestrator calls into this crate
//! both for the final standings and nowhere else — immediate per-arrival
//! feedback is a protocol concern and deliberately stays out of here.

mod outcome;
mod standings;

pub use outcome::{AnswerStatus, PlayerOutcome, RoundAnswer, question_outcomes};
pub use standings::{FinalStanding, ParticipantRef, RoundRecord, final_standings};
