//! Quiz scoring

use crate::topic::QuizQuestion;
use serde::Serialize;

/// Outcome of one quiz attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
}

impl std::fmt::Display for QuizScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

/// Score `answers` (chosen option indices, in question order).
///
/// Missing answers count as wrong; extra answers are ignored.
pub fn score(questions: &[QuizQuestion], answers: &[usize]) -> QuizScore {
    let correct = questions
        .iter()
        .zip(answers)
        .filter(|&(q, &answer)| q.answer_index == answer)
        .count();
    QuizScore {
        correct: correct as u32,
        total: questions.len() as u32,
    }
}
