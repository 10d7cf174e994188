use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solfa_audio::{PlaybackRequest, Sampler};
use solfa_domain::{Config, ConfigPatch, Mode, Note};
use solfa_notation::DurationClass;
use tracing::{debug, info, warn};

use crate::analytics::Statistics;
use crate::candidates::{CandidateSet, DEFAULT_CHOICES};
use crate::error::QuizError;
use crate::round::{generate_round, Round};
use crate::scoring::{Feedback, ScoringEngine, Verdict};

pub const CORRECT_ADVANCE_DELAY: Duration = Duration::from_millis(1500);
pub const INCORRECT_ADVANCE_DELAY: Duration = Duration::from_millis(2500);

pub fn advance_delay(verdict: Verdict) -> Duration {
    match verdict {
        Verdict::Correct => CORRECT_ADVANCE_DELAY,
        Verdict::Incorrect => INCORRECT_ADVANCE_DELAY,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Showing,
    Answering,
    Evaluated(Feedback),
    /// Flashcard answer uncovered, waiting for the learner to move on.
    Revealed,
}

/// Next-round generation scheduled for the round it was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    pub round_id: u64,
    pub due: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Click arrived while no answer could be taken.
    Ignored,
    Recorded { remaining: usize },
    Evaluated(Feedback),
}

/// Owns every piece of quiz state: preferences, the round, answers and score.
pub struct QuizSession<R = StdRng> {
    config: Config,
    rng: R,
    next_round_id: u64,
    round: Option<Round>,
    candidates: CandidateSet,
    answers: Vec<Note>,
    phase: Phase,
    stats: Statistics,
    pending: Option<PendingAdvance>,
    max_choices: usize,
}

impl QuizSession<StdRng> {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> QuizSession<R> {
    pub fn with_rng(config: Config, rng: R) -> Self {
        Self {
            config,
            rng,
            next_round_id: 0,
            round: None,
            candidates: CandidateSet::empty(),
            answers: Vec::new(),
            phase: Phase::Idle,
            stats: Statistics::new(),
            pending: None,
            max_choices: DEFAULT_CHOICES,
        }
    }

    pub fn with_max_choices(mut self, max_choices: usize) -> Self {
        self.max_choices = max_choices;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn answers(&self) -> &[Note] {
        &self.answers
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn pending(&self) -> Option<PendingAdvance> {
        self.pending
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        match &self.phase {
            Phase::Evaluated(feedback) => Some(feedback),
            _ => None,
        }
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.phase, Phase::Revealed | Phase::Evaluated(_))
    }

    /// Generates the first round synchronously.
    pub fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.next_round();
        }
    }

    fn next_round(&mut self) {
        self.pending = None;
        self.next_round_id += 1;
        let round = generate_round(
            self.config.clef,
            self.config.round_len(),
            self.next_round_id,
            &mut self.rng,
        );
        self.candidates = match self.config.mode {
            Mode::Practice => {
                CandidateSet::build(&round, self.config.clef, self.max_choices, &mut self.rng)
            }
            Mode::Flashcards => CandidateSet::empty(),
        };
        info!(
            round = round.id(),
            clef = self.config.clef.id(),
            notes = round.len(),
            "new round"
        );
        self.round = Some(round);
        self.answers.clear();
        self.phase = Phase::Showing;
    }

    /// Records a click on the candidate called `name`.
    pub fn select(&mut self, name: &str, now: Instant) -> Result<SelectOutcome, QuizError> {
        if self.config.mode != Mode::Practice
            || !matches!(self.phase, Phase::Showing | Phase::Answering)
        {
            debug!(name, phase = ?self.phase, "ignoring selection");
            return Ok(SelectOutcome::Ignored);
        }
        let Some(round) = self.round.as_ref() else {
            return Ok(SelectOutcome::Ignored);
        };
        let note = self
            .candidates
            .find(name)
            .ok_or_else(|| QuizError::UnknownCandidate(name.to_string()))?;
        if self.answers.len() >= round.len() {
            return Ok(SelectOutcome::Ignored);
        }
        self.answers.push(note);

        let Some(feedback) = ScoringEngine.evaluate(round, &self.answers) else {
            self.phase = Phase::Answering;
            return Ok(SelectOutcome::Recorded {
                remaining: round.len() - self.answers.len(),
            });
        };
        self.stats.record(feedback.verdict);
        let delay = advance_delay(feedback.verdict);
        self.pending = Some(PendingAdvance {
            round_id: round.id(),
            due: now + delay,
        });
        info!(
            round = round.id(),
            verdict = %feedback.verdict,
            score = self.stats.score,
            "round evaluated"
        );
        self.phase = Phase::Evaluated(feedback.clone());
        Ok(SelectOutcome::Evaluated(feedback))
    }

    /// Fires the scheduled advance once due; returns whether a new round began.
    /// Anything that replaces the round clears the pending advance first, so
    /// a due advance always belongs to the round on screen.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        if now < pending.due {
            return false;
        }
        debug!(round = pending.round_id, "advance due");
        self.next_round();
        true
    }

    /// Merges `patch` into the preferences, cancelling any scheduled advance.
    pub fn apply_config(&mut self, patch: &ConfigPatch) {
        let next = self.config.merged(patch);
        if next == self.config {
            return;
        }
        self.config = next;
        if self.phase != Phase::Idle {
            self.next_round();
        }
    }

    /// Flashcards: uncover the current notes without scoring.
    pub fn reveal(&mut self) -> bool {
        if self.config.mode == Mode::Flashcards && self.phase == Phase::Showing {
            self.phase = Phase::Revealed;
            true
        } else {
            false
        }
    }

    /// Explicit move to a fresh round, cancelling any scheduled advance.
    pub fn advance(&mut self) {
        self.next_round();
    }

    pub fn staff_notes(&self) -> Vec<(&'static str, DurationClass)> {
        self.round
            .as_ref()
            .map(Round::staff_notes)
            .unwrap_or_default()
    }

    pub fn playback_request(&self) -> Option<PlaybackRequest> {
        if !self.config.sound_enabled {
            return None;
        }
        self.round
            .as_ref()
            .map(|round| PlaybackRequest::from_notes(round.notes()))
    }

    /// Plays the current round; failures are logged and never retried.
    pub fn announce(&self, sampler: &mut dyn Sampler) {
        let Some(request) = self.playback_request() else {
            return;
        };
        if !sampler.is_ready() {
            debug!("sampler not ready, skipping playback");
            return;
        }
        if let Err(err) = sampler.play(&request) {
            warn!(%err, "playback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solfa_domain::{Clef, Notation};

    fn session(config: Config) -> QuizSession<StdRng> {
        let mut session = QuizSession::with_rng(config, StdRng::seed_from_u64(42));
        session.start();
        session
    }

    fn answer_round(
        session: &mut QuizSession<StdRng>,
        reverse: bool,
        now: Instant,
    ) -> SelectOutcome {
        let mut names: Vec<&str> = session
            .round()
            .unwrap()
            .notes()
            .iter()
            .map(|n| n.name)
            .collect();
        if reverse {
            names.reverse();
        }
        let mut outcome = SelectOutcome::Ignored;
        for name in names {
            outcome = session.select(name, now).unwrap();
        }
        outcome
    }

    fn is_palindrome(round: &Round) -> bool {
        let names: Vec<&str> = round.notes().iter().map(|n| n.name).collect();
        names.iter().eq(names.iter().rev())
    }

    #[derive(Default)]
    struct RecordingSampler {
        ready: bool,
        fail: bool,
        played: Vec<PlaybackRequest>,
    }

    impl Sampler for RecordingSampler {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn play(&mut self, request: &PlaybackRequest) -> anyhow::Result<()> {
            self.played.push(request.clone());
            if self.fail {
                anyhow::bail!("autoplay blocked");
            }
            Ok(())
        }
    }

    #[test]
    fn start_shows_a_round_immediately() {
        let session = session(Config::default());
        assert_eq!(session.phase(), &Phase::Showing);
        assert_eq!(session.round().unwrap().len(), 1);
        assert!(session.answers().is_empty());
        assert_eq!(session.candidates().len(), DEFAULT_CHOICES);
    }

    #[test]
    fn correct_answer_scores_and_schedules_short_delay() {
        let mut session = session(Config::default());
        let now = Instant::now();
        let outcome = answer_round(&mut session, false, now);
        let SelectOutcome::Evaluated(feedback) = outcome else {
            panic!("round should be evaluated");
        };
        assert_eq!(feedback.message(Notation::Latin), "Correct");
        assert_eq!(session.stats().score, 1);
        assert_eq!(session.pending().unwrap().due, now + CORRECT_ADVANCE_DELAY);
    }

    #[test]
    fn wrong_order_is_incorrect() {
        let config = Config {
            notes_to_show: 3,
            ..Config::default()
        };
        let mut session = session(config);
        let now = Instant::now();
        // Reversing a palindrome by name would still be correct.
        while is_palindrome(session.round().unwrap()) {
            session.advance();
        }
        let outcome = answer_round(&mut session, true, now);
        assert!(matches!(outcome, SelectOutcome::Evaluated(ref f) if !f.is_correct()));
        assert_eq!(session.stats().score, 0);
        assert_eq!(session.pending().unwrap().due, now + INCORRECT_ADVANCE_DELAY);
    }

    #[test]
    fn answers_are_ignored_during_cooldown() {
        let mut session = session(Config::default());
        let now = Instant::now();
        answer_round(&mut session, false, now);
        let name = session.candidates().notes()[0].name;
        assert_eq!(session.select(name, now).unwrap(), SelectOutcome::Ignored);
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn partial_answers_wait_for_the_rest() {
        let config = Config {
            notes_to_show: 2,
            ..Config::default()
        };
        let mut session = session(config);
        let first = session.round().unwrap().notes()[0].name;
        let outcome = session.select(first, Instant::now()).unwrap();
        assert_eq!(outcome, SelectOutcome::Recorded { remaining: 1 });
        assert_eq!(session.phase(), &Phase::Answering);
        assert!(session.pending().is_none());
    }

    #[test]
    fn unknown_candidates_are_rejected() {
        let mut session = session(Config::default());
        assert!(matches!(
            session.select("Ut", Instant::now()),
            Err(QuizError::UnknownCandidate(_))
        ));
    }

    #[test]
    fn tick_advances_only_when_due() {
        let mut session = session(Config::default());
        let now = Instant::now();
        answer_round(&mut session, false, now);
        let first_id = session.round().unwrap().id();
        assert!(!session.tick(now + Duration::from_millis(100)));
        assert!(session.tick(now + CORRECT_ADVANCE_DELAY));
        assert_ne!(session.round().unwrap().id(), first_id);
        assert_eq!(session.phase(), &Phase::Showing);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn due_advance_replaces_the_round_it_was_scheduled_for() {
        let mut session = session(Config::default());
        let now = Instant::now();
        let first = session.round().unwrap().id();
        answer_round(&mut session, false, now);
        assert_eq!(session.pending().unwrap().round_id, first);
        assert!(!session.tick(now + CORRECT_ADVANCE_DELAY - Duration::from_millis(1)));
        assert!(session.tick(now + CORRECT_ADVANCE_DELAY));
        assert_ne!(session.round().unwrap().id(), first);
        assert!(session.pending().is_none());
        assert!(!session.tick(now + INCORRECT_ADVANCE_DELAY));
    }

    #[test]
    fn config_change_cancels_pending_advance() {
        let mut session = session(Config::default());
        let now = Instant::now();
        answer_round(&mut session, false, now);
        session.apply_config(&ConfigPatch::clef(Clef::Bass));
        let bass_round = session.round().unwrap().id();
        assert!(session.pending().is_none());
        assert!(!session.tick(now + INCORRECT_ADVANCE_DELAY));
        assert_eq!(session.round().unwrap().id(), bass_round);
        assert_eq!(session.round().unwrap().clef(), Clef::Bass);
    }

    #[test]
    fn empty_patch_keeps_the_round() {
        let mut session = session(Config::default());
        let id = session.round().unwrap().id();
        session.apply_config(&ConfigPatch::default());
        assert_eq!(session.round().unwrap().id(), id);
    }

    #[test]
    fn flashcards_reveal_and_advance_on_demand() {
        let config = Config {
            mode: Mode::Flashcards,
            ..Config::default()
        };
        let mut session = session(config);
        assert!(session.candidates().is_empty());
        let name = session.round().unwrap().notes()[0].name;
        assert_eq!(session.select(name, Instant::now()).unwrap(), SelectOutcome::Ignored);
        assert!(session.reveal());
        assert!(session.is_revealed());
        assert!(!session.tick(Instant::now() + INCORRECT_ADVANCE_DELAY));
        let id = session.round().unwrap().id();
        session.advance();
        assert_ne!(session.round().unwrap().id(), id);
        assert_eq!(session.stats().attempts, 0);
    }

    #[test]
    fn announce_respects_sound_and_readiness() {
        let mut sampler = RecordingSampler::default();
        let session_on = session(Config::default());
        session_on.announce(&mut sampler);
        assert!(sampler.played.is_empty());

        sampler.ready = true;
        session_on.announce(&mut sampler);
        assert_eq!(sampler.played.len(), 1);

        let session_off = session(Config {
            sound_enabled: false,
            ..Config::default()
        });
        session_off.announce(&mut sampler);
        assert_eq!(sampler.played.len(), 1);
    }

    #[test]
    fn playback_failures_are_swallowed() {
        let mut sampler = RecordingSampler {
            ready: true,
            fail: true,
            ..Default::default()
        };
        let session = session(Config::default());
        session.announce(&mut sampler);
        assert_eq!(sampler.played.len(), 1);
    }
}
