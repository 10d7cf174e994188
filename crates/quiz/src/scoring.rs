use std::fmt;

use serde::{Deserialize, Serialize};
use solfa_domain::{Notation, Note};

use crate::round::Round;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn is_correct(self) -> bool {
        self == Verdict::Correct
    }

    pub fn score_delta(self) -> u32 {
        match self {
            Verdict::Correct => 1,
            Verdict::Incorrect => 0,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Correct => f.write_str("Correct"),
            Verdict::Incorrect => f.write_str("Incorrect"),
        }
    }
}

/// Outcome of a completed round, carrying the expected sequence for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Feedback {
    pub verdict: Verdict,
    pub expected: Vec<Note>,
}

impl Feedback {
    pub fn is_correct(&self) -> bool {
        self.verdict.is_correct()
    }

    pub fn message(&self, notation: Notation) -> String {
        match self.verdict {
            Verdict::Correct => self.verdict.to_string(),
            Verdict::Incorrect => {
                let expected: Vec<&str> = self
                    .expected
                    .iter()
                    .map(|note| note.label(notation))
                    .collect();
                format!("{}. The answer was {}.", self.verdict, expected.join(", "))
            }
        }
    }
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Positional name comparison; `None` until every note has an answer.
    pub fn evaluate(&self, round: &Round, answers: &[Note]) -> Option<Feedback> {
        if answers.len() != round.len() {
            return None;
        }
        let matched = round
            .notes()
            .iter()
            .zip(answers)
            .all(|(expected, given)| expected.name == given.name);
        let verdict = if matched {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        Some(Feedback {
            verdict,
            expected: round.notes().to_vec(),
        })
    }
}
