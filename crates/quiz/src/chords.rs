use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solfa_audio::{PlaybackRequest, Speed};
use solfa_domain::{Chord, CHORDS};
use solfa_notation::DurationClass;
use tracing::info;

use crate::analytics::Statistics;
use crate::scoring::Verdict;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordFeedback {
    pub verdict: Verdict,
    pub expected: &'static str,
}

impl ChordFeedback {
    pub fn message(&self) -> String {
        match self.verdict {
            Verdict::Correct => self.verdict.to_string(),
            Verdict::Incorrect => format!("{}. The answer was {}.", self.verdict, self.expected),
        }
    }
}

/// Name-the-chord drill with typed answers.
pub struct ChordDrill<R = StdRng> {
    rng: R,
    chords: &'static [Chord],
    current: usize,
    stats: Statistics,
}

impl ChordDrill<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl Default for ChordDrill<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ChordDrill<R> {
    pub fn with_rng(mut rng: R) -> Self {
        let current = rng.random_range(0..CHORDS.len());
        Self {
            rng,
            chords: CHORDS,
            current,
            stats: Statistics::new(),
        }
    }

    pub fn current(&self) -> &Chord {
        &self.chords[self.current]
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Case-insensitive comparison against the chord name.
    pub fn submit(&mut self, answer: &str) -> ChordFeedback {
        let expected = self.current().name;
        let verdict = if answer.trim().to_lowercase() == expected.to_lowercase() {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        self.stats.record(verdict);
        info!(chord = expected, %verdict, score = self.stats.score, "chord answered");
        ChordFeedback { verdict, expected }
    }

    /// Picks a different chord than the one just shown.
    pub fn next(&mut self) {
        let count = self.chords.len();
        if count < 2 {
            return;
        }
        let pick = self.rng.random_range(0..count - 1);
        self.current = if pick >= self.current { pick + 1 } else { pick };
    }

    pub fn staff_notes(&self) -> Vec<(&'static str, DurationClass)> {
        self.current()
            .pitch_ids
            .iter()
            .map(|id| (*id, DurationClass::Whole))
            .collect()
    }

    pub fn playback_request(&self) -> PlaybackRequest {
        PlaybackRequest::new(self.current().pitch_ids.iter().copied())
            .with_speed(Speed::VeryFast)
            .with_sustain(true)
    }
}
