//! Per-question outcome computation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How one participant fared on one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerStatus {
    /// Correct with the lowest response time among correct answers
    /// (ties broken by arrival order).
    FirstCorrect,
    /// Correct, but another correct answer was faster.
    Correct,
    /// An incorrect option was chosen.
    Wrong,
    /// No answer was recorded before the question closed.
    NoAnswer,
}

impl AnswerStatus {
    /// Points awarded for this status.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Self::FirstCorrect => 3,
            Self::Correct => 1,
            Self::Wrong | Self::NoAnswer => 0,
        }
    }

    /// Human-readable label used in result breakdowns.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstCorrect => "First Correct",
            Self::Correct => "Correct",
            Self::Wrong => "Wrong",
            Self::NoAnswer => "No Answer",
        }
    }
}

/// One participant's final answer to one question, after the round's
/// last-write-wins reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundAnswer {
    /// The answering participant.
    pub player_uuid: Uuid,
    /// The option index chosen.
    pub answer_index: usize,
    /// Player-reported response time in seconds.
    pub response_time: f64,
    /// Host-side arrival sequence, used to break response-time ties.
    pub arrival_seq: u64,
}

/// A scored line for one participant on one question.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOutcome {
    /// The participant.
    pub player_uuid: Uuid,
    /// The scored status.
    pub status: AnswerStatus,
    /// Response time, when an answer was recorded.
    pub response_time: Option<f64>,
    /// Points awarded (`status.points()`).
    pub points: u32,
}

/// Scores one question for every listed participant.
///
/// The fastest correct answer (minimum response time, ties broken by the
/// host-side arrival sequence) earns `FirstCorrect`; other correct answers
/// earn `Correct`; incorrect answers earn `Wrong`; participants without an
/// entry in `answers` earn `NoAnswer`.
#[must_use]
pub fn question_outcomes(
    answers: &[RoundAnswer],
    correct_index: usize,
    participants: &[Uuid],
) -> Vec<PlayerOutcome> {
    let fastest_correct = answers
        .iter()
        .filter(|a| a.answer_index == correct_index)
        .min_by(|a, b| {
            a.response_time
                .total_cmp(&b.response_time)
                .then(a.arrival_seq.cmp(&b.arrival_seq))
        })
        .map(|a| a.player_uuid);

    participants
        .iter()
        .map(|&uuid| {
            let answer = answers.iter().find(|a| a.player_uuid == uuid);
            let status = match answer {
                None => AnswerStatus::NoAnswer,
                Some(a) if a.answer_index != correct_index => AnswerStatus::Wrong,
                Some(a) if fastest_correct == Some(a.player_uuid) => AnswerStatus::FirstCorrect,
                Some(_) => AnswerStatus::Correct,
            };
            PlayerOutcome {
                player_uuid: uuid,
                status,
                response_time: answer.map(|a| a.response_time),
                points: status.points(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(uuid: Uuid, index: usize, time: f64, seq: u64) -> RoundAnswer {
        RoundAnswer {
            player_uuid: uuid,
            answer_index: index,
            response_time: time,
            arrival_seq: seq,
        }
    }

    #[test]
    fn test_first_correct_earns_three_points() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let answers = vec![answer(a, 1, 1.2, 0), answer(b, 1, 2.0, 1)];

        let outcomes = question_outcomes(&answers, 1, &[a, b]);

        assert_eq!(outcomes[0].status, AnswerStatus::FirstCorrect);
        assert_eq!(outcomes[0].points, 3);
        assert_eq!(outcomes[1].status, AnswerStatus::Correct);
        assert_eq!(outcomes[1].points, 1);
    }

    #[test]
    fn test_wrong_answer_earns_zero() {
        let a = Uuid::new_v4();
        let answers = vec![answer(a, 2, 0.5, 0)];

        let outcomes = question_outcomes(&answers, 0, &[a]);

        assert_eq!(outcomes[0].status, AnswerStatus::Wrong);
        assert_eq!(outcomes[0].points, 0);
        assert_eq!(outcomes[0].response_time, Some(0.5));
    }

    #[test]
    fn test_missing_answer_is_no_answer() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let answers = vec![answer(a, 0, 1.0, 0)];

        let outcomes = question_outcomes(&answers, 0, &[a, b]);

        assert_eq!(outcomes[1].status, AnswerStatus::NoAnswer);
        assert_eq!(outcomes[1].points, 0);
        assert_eq!(outcomes[1].response_time, None);
    }

    #[test]
    fn test_fastest_wins_even_when_it_arrived_later() {
        // B submitted after A but with a smaller response time; final
        // scoring is authoritative and awards B the three points.
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let answers = vec![answer(a, 1, 2.0, 0), answer(b, 1, 1.1, 1)];

        let outcomes = question_outcomes(&answers, 1, &[a, b]);

        assert_eq!(outcomes[0].status, AnswerStatus::Correct);
        assert_eq!(outcomes[1].status, AnswerStatus::FirstCorrect);
    }

    #[test]
    fn test_response_time_tie_broken_by_arrival_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let answers = vec![answer(b, 1, 1.5, 1), answer(a, 1, 1.5, 0)];

        let outcomes = question_outcomes(&answers, 1, &[a, b]);

        assert_eq!(outcomes[0].status, AnswerStatus::FirstCorrect);
        assert_eq!(outcomes[1].status, AnswerStatus::Correct);
    }

    #[test]
    fn test_no_correct_answers_means_no_first_correct() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let answers = vec![answer(a, 2, 1.0, 0), answer(b, 3, 1.5, 1)];

        let outcomes = question_outcomes(&answers, 1, &[a, b]);

        assert!(
            outcomes
                .iter()
                .all(|o| o.status == AnswerStatus::Wrong && o.points == 0)
        );
    }

    #[test]
    fn test_points_match_status_table() {
        assert_eq!(AnswerStatus::FirstCorrect.points(), 3);
        assert_eq!(AnswerStatus::Correct.points(), 1);
        assert_eq!(AnswerStatus::Wrong.points(), 0);
        assert_eq!(AnswerStatus::NoAnswer.points(), 0);
    }
}
