use serde::{Deserialize, Serialize};

use crate::scoring::Verdict;

/// Running score for the current session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statistics {
    pub score: u32,
    pub attempts: u32,
    pub streak: u32,
    pub best_streak: u32,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, verdict: Verdict) {
        self.attempts += 1;
        self.score += verdict.score_delta();
        if verdict.is_correct() {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
    }

    pub fn accuracy(&self) -> f32 {
        if self.attempts == 0 {
            0.0
        } else {
            self.score as f32 / self.attempts as f32
        }
    }
}
