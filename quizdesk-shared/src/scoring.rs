//! Quiz grading and rating aggregation
//!
//! Grading is pure: it compares submitted answer indices against the stored
//! questions. Rating turns summed result rows into a 0..=1 score.
//!
//! # Example
//!
//! ```
//! use quizdesk_shared::scoring::rate;
//!
//! // Two attempts, 3/5 and 4/5
//! assert_eq!(rate(3 + 4, 5 + 5), Some(0.7));
//! assert_eq!(rate(0, 0), None);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::quiz::Question;

/// How one question was answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: Uuid,

    /// Submitted index, `None` if the question was skipped
    pub selected: Option<i32>,

    pub correct: bool,
}

/// Graded attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    /// Questions answered correctly
    pub right_answers: i32,

    /// Questions in the quiz
    pub answers: i32,

    /// Per-question detail, in quiz order
    pub outcomes: Vec<QuestionOutcome>,
}

/// Grades a submission
///
/// `submitted` maps question IDs to answer indices. Questions missing from
/// it count as wrong; entries for IDs not in `questions` are ignored.
pub fn grade(questions: &[Question], submitted: &HashMap<Uuid, i32>) -> Grade {
    let outcomes: Vec<QuestionOutcome> = questions
        .iter()
        .map(|q| {
            let selected = submitted.get(&q.id).copied();
            QuestionOutcome {
                question_id: q.id,
                selected,
                correct: selected == Some(q.correct_answer),
            }
        })
        .collect();

    let right_answers = outcomes.iter().filter(|o| o.correct).count() as i32;

    Grade {
        right_answers,
        answers: outcomes.len() as i32,
        outcomes,
    }
}

/// Ratio of right answers to answers, rounded to 2 decimals
///
/// Returns `None` when there is nothing to rate.
pub fn rate(right_answers: i64, answers: i64) -> Option<f64> {
    if answers <= 0 {
        return None;
    }

    let ratio = right_answers as f64 / answers as f64;
    Some((ratio * 100.0).round() / 100.0)
}
