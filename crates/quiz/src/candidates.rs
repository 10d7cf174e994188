use rand::seq::SliceRandom;
use rand::Rng;
use solfa_domain::catalog::{distinct_names, representative};
use solfa_domain::{Clef, Notation, Note};

use crate::round::Round;

pub const MIN_CHOICES: usize = 4;
pub const MAX_CHOICES: usize = 7;
/// One name short of a full scale, so a single unused name is always left out.
pub const DEFAULT_CHOICES: usize = 6;

/// Clickable answer options for the current round, one per note name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateSet {
    notes: Vec<Note>,
}

impl CandidateSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every name in `round` plus shuffled distractors from `clef`, capped at
    /// `max_choices` (kept within 4..=7, never below the round's own names).
    pub fn build<R: Rng>(round: &Round, clef: Clef, max_choices: usize, rng: &mut R) -> Self {
        let mut notes: Vec<Note> = Vec::new();
        for note in round.notes() {
            if !notes.iter().any(|chosen| chosen.name == note.name) {
                notes.push(*note);
            }
        }
        let cap = max_choices
            .clamp(MIN_CHOICES, MAX_CHOICES)
            .max(notes.len());

        let mut distractors: Vec<&'static str> = distinct_names(clef)
            .into_iter()
            .filter(|name| !notes.iter().any(|chosen| chosen.name == *name))
            .collect();
        distractors.shuffle(rng);
        notes.extend(
            distractors
                .into_iter()
                .take(cap - notes.len())
                .filter_map(|name| representative(clef, name)),
        );
        notes.shuffle(rng);
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn find(&self, name: &str) -> Option<Note> {
        self.notes.iter().find(|note| note.name == name).copied()
    }

    /// Looks an option up by its displayed label, ignoring case.
    pub fn find_label(&self, label: &str, notation: Notation) -> Option<Note> {
        let label = label.trim();
        self.notes
            .iter()
            .find(|note| note.label(notation).eq_ignore_ascii_case(label))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::generate_round;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn candidates_cover_every_round_name() {
        let mut rng = StdRng::seed_from_u64(5);
        for clef in Clef::ALL {
            for len in 1..=3 {
                for id in 0..300 {
                    let round = generate_round(clef, len, id, &mut rng);
                    let set = CandidateSet::build(&round, clef, DEFAULT_CHOICES, &mut rng);
                    for name in round.distinct_names() {
                        assert!(set.contains(name), "{name} missing from candidates");
                    }
                }
            }
        }
    }

    #[test]
    fn default_cap_leaves_one_name_out() {
        let mut rng = StdRng::seed_from_u64(9);
        let round = generate_round(Clef::Treble, 1, 1, &mut rng);
        let set = CandidateSet::build(&round, Clef::Treble, DEFAULT_CHOICES, &mut rng);
        assert_eq!(set.len(), 6);
        let names: HashSet<&str> = set.notes().iter().map(|n| n.name).collect();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn cap_is_clamped() {
        let mut rng = StdRng::seed_from_u64(1);
        let round = generate_round(Clef::Bass, 3, 1, &mut rng);
        assert_eq!(CandidateSet::build(&round, Clef::Bass, 1, &mut rng).len(), 4);
        assert_eq!(CandidateSet::build(&round, Clef::Bass, 50, &mut rng).len(), 7);
    }

    #[test]
    fn shuffles_vary_between_builds() {
        let mut rng = StdRng::seed_from_u64(21);
        let round = generate_round(Clef::Treble, 1, 1, &mut rng);
        let orders: HashSet<Vec<&str>> = (0..20)
            .map(|_| {
                CandidateSet::build(&round, Clef::Treble, MAX_CHOICES, &mut rng)
                    .notes()
                    .iter()
                    .map(|n| n.name)
                    .collect()
            })
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn labels_resolve_case_insensitively() {
        let mut rng = StdRng::seed_from_u64(2);
        let round = generate_round(Clef::Treble, 1, 1, &mut rng);
        let set = CandidateSet::build(&round, Clef::Treble, MAX_CHOICES, &mut rng);
        assert_eq!(set.find_label(" sol ", Notation::Latin).unwrap().name, "Sol");
        assert_eq!(set.find_label("g", Notation::English).unwrap().name, "Sol");
        assert!(set.find_label("H", Notation::English).is_none());
    }
}
