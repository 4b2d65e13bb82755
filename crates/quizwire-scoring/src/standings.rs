//! Final standings aggregation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::outcome::{RoundAnswer, question_outcomes};

/// One closed question and its reconciled answers.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    /// Sequential question number within the session (1-based).
    pub question_number: u32,
    /// The question's correct option index.
    pub correct_index: usize,
    /// Final per-participant answers for this question.
    pub answers: Vec<RoundAnswer>,
}

/// A participant as the standings computation sees them. Slice order is
/// join order and provides the last tie-break.
#[derive(Debug, Clone)]
pub struct ParticipantRef {
    /// The participant's wire uuid.
    pub uuid: Uuid,
    /// Display name carried into the standings rows.
    pub name: String,
}

/// A participant's final line: points, coverage, rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStanding {
    /// The participant's wire uuid.
    pub player_uuid: Uuid,
    /// Display name.
    pub player_name: String,
    /// Total points across the questions actually asked.
    pub total_points: u32,
    /// Distinct questions the participant answered.
    pub questions_answered: u32,
    /// 1-based rank after sorting.
    pub rank: u32,
}

/// Computes final standings over the questions actually asked.
///
/// Aggregates per-question outcomes for every participant, then sorts by
/// `(total_points desc, questions_answered desc, join order asc)` — the
/// stable sort keeps join order for full ties — and assigns 1-based ranks.
/// The winner, when any participant exists, is the first row.
#[must_use]
pub fn final_standings(rounds: &[RoundRecord], participants: &[ParticipantRef]) -> Vec<FinalStanding> {
    let uuids: Vec<Uuid> = participants.iter().map(|p| p.uuid).collect();

    let mut rows: Vec<FinalStanding> = participants
        .iter()
        .map(|p| FinalStanding {
            player_uuid: p.uuid,
            player_name: p.name.clone(),
            total_points: 0,
            questions_answered: 0,
            rank: 0,
        })
        .collect();

    for round in rounds {
        for outcome in question_outcomes(&round.answers, round.correct_index, &uuids) {
            // rows and uuids share participant order.
            if let Some(row) = rows.iter_mut().find(|r| r.player_uuid == outcome.player_uuid) {
                row.total_points += outcome.points;
                if outcome.response_time.is_some() {
                    row.questions_answered += 1;
                }
            }
        }
    }

    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then(b.questions_answered.cmp(&a.questions_answered))
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = u32::try_from(i + 1).unwrap_or(u32::MAX);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: &str) -> ParticipantRef {
        ParticipantRef {
            uuid: Uuid::new_v4(),
            name: name.to_owned(),
        }
    }

    fn round(number: u32, correct: usize, answers: Vec<RoundAnswer>) -> RoundRecord {
        RoundRecord {
            question_number: number,
            correct_index: correct,
            answers,
        }
    }

    fn answer(uuid: Uuid, index: usize, time: f64, seq: u64) -> RoundAnswer {
        RoundAnswer {
            player_uuid: uuid,
            answer_index: index,
            response_time: time,
            arrival_seq: seq,
        }
    }

    #[test]
    fn test_higher_points_rank_first() {
        let a = participant("alice");
        let b = participant("bob");
        let rounds = vec![
            round(1, 1, vec![answer(a.uuid, 1, 1.0, 0), answer(b.uuid, 1, 2.0, 1)]),
            round(2, 0, vec![answer(a.uuid, 0, 1.5, 0), answer(b.uuid, 0, 2.5, 1)]),
        ];

        let standings = final_standings(&rounds, &[a.clone(), b.clone()]);

        // Alice: 3 + 3 = 6; Bob: 1 + 1 = 2.
        assert_eq!(standings[0].player_uuid, a.uuid);
        assert_eq!(standings[0].total_points, 6);
        assert_eq!(standings[0].questions_answered, 2);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[1].player_uuid, b.uuid);
        assert_eq!(standings[1].total_points, 2);
        assert_eq!(standings[1].rank, 2);
    }

    #[test]
    fn test_points_tie_broken_by_questions_answered() {
        let a = participant("alice");
        let b = participant("bob");
        let rounds = vec![
            round(1, 0, vec![answer(a.uuid, 0, 1.0, 0), answer(b.uuid, 1, 0.5, 1)]),
            round(2, 0, vec![answer(b.uuid, 0, 2.0, 0)]),
        ];

        let standings = final_standings(&rounds, &[a.clone(), b.clone()]);

        // Both hold 3 points; Bob answered two questions to Alice's one,
        // so Bob ranks first despite the later join.
        assert_eq!(standings[0].player_uuid, b.uuid);
        assert_eq!(standings[0].total_points, 3);
        assert_eq!(standings[0].questions_answered, 2);
        assert_eq!(standings[1].player_uuid, a.uuid);
        assert_eq!(standings[1].total_points, 3);
        assert_eq!(standings[1].questions_answered, 1);
    }

    #[test]
    fn test_full_tie_keeps_join_order() {
        let a = participant("alice");
        let b = participant("bob");
        let rounds = vec![round(
            1,
            0,
            vec![answer(b.uuid, 1, 1.0, 0), answer(a.uuid, 1, 2.0, 1)],
        )];

        let standings = final_standings(&rounds, &[a.clone(), b.clone()]);

        // Both wrong: 0 points, 1 answered each — join order decides.
        assert_eq!(standings[0].player_uuid, a.uuid);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[1].player_uuid, b.uuid);
        assert_eq!(standings[1].rank, 2);
    }

    #[test]
    fn test_questions_answered_counts_distinct_rounds() {
        let a = participant("alice");
        let rounds = vec![
            round(1, 0, vec![answer(a.uuid, 1, 1.0, 0)]),
            round(2, 0, vec![]),
            round(3, 0, vec![answer(a.uuid, 0, 1.0, 0)]),
        ];

        let standings = final_standings(&rounds, &[a.clone()]);

        assert_eq!(standings[0].questions_answered, 2);
        // Wrong on round 1, first-correct on round 3.
        assert_eq!(standings[0].total_points, 3);
    }

    #[test]
    fn test_no_participants_yields_empty_standings() {
        let standings = final_standings(&[], &[]);
        assert!(standings.is_empty());
    }

    #[test]
    fn test_early_stop_aggregates_only_asked_rounds() {
        // Two questions asked of a five-question configuration: totals
        // reflect the two rounds present, nothing else.
        let a = participant("alice");
        let rounds = vec![
            round(1, 0, vec![answer(a.uuid, 0, 1.0, 0)]),
            round(2, 1, vec![answer(a.uuid, 1, 1.0, 0)]),
        ];

        let standings = final_standings(&rounds, &[a.clone()]);

        assert_eq!(standings[0].total_points, 6);
        assert_eq!(standings[0].questions_answered, 2);
    }
}
