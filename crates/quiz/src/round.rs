use rand::Rng;
use serde::Serialize;
use solfa_domain::{Clef, Note};
use solfa_notation::DurationClass;
use tracing::{debug, instrument};

/// The note sequence the learner must currently identify.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Round {
    id: u64,
    clef: Clef,
    notes: Vec<Note>,
}

impl Round {
    pub fn new(id: u64, clef: Clef, notes: Vec<Note>) -> Self {
        Self { id, clef, notes }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn clef(&self) -> Clef {
        self.clef
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

    /// Names in order of first appearance.
    pub fn distinct_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for note in &self.notes {
            if !names.contains(&note.name) {
                names.push(note.name);
            }
        }
        names
    }

    /// Pairs handed to a staff renderer.
    pub fn staff_notes(&self) -> Vec<(&'static str, DurationClass)> {
        self.notes
            .iter()
            .map(|note| (note.pitch_id, DurationClass::Quarter))
            .collect()
    }
}

/// Draws `len` notes uniformly from the clef's table, never repeating a pitch
/// back to back.
#[instrument(skip(rng))]
pub fn generate_round<R: Rng>(clef: Clef, len: usize, id: u64, rng: &mut R) -> Round {
    let table = clef.notes();
    let mut notes = Vec::with_capacity(len);
    let mut previous: Option<usize> = None;
    for _ in 0..len {
        let index = match previous {
            Some(prev) if table.len() > 1 => {
                // Uniform over every index except the previous one.
                let pick = rng.random_range(0..table.len() - 1);
                if pick >= prev {
                    pick + 1
                } else {
                    pick
                }
            }
            _ => rng.random_range(0..table.len()),
        };
        notes.push(table[index]);
        previous = Some(index);
    }
    debug!(
        pitches = ?notes.iter().map(|n| n.pitch_id).collect::<Vec<_>>(),
        "generated round"
    );
    Round::new(id, clef, notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rounds_never_repeat_adjacent_pitches() {
        let mut rng = StdRng::seed_from_u64(7);
        for clef in Clef::ALL {
            for len in 1..=3 {
                for id in 0..500 {
                    let round = generate_round(clef, len, id, &mut rng);
                    assert_eq!(round.len(), len);
                    assert!(round
                        .notes()
                        .windows(2)
                        .all(|pair| pair[0].pitch_id != pair[1].pitch_id));
                }
            }
        }
    }

    #[test]
    fn rounds_draw_from_the_active_clef() {
        let mut rng = StdRng::seed_from_u64(11);
        for id in 0..200 {
            let round = generate_round(Clef::Bass, 3, id, &mut rng);
            assert!(round.notes().iter().all(|n| Clef::Bass.notes().contains(n)));
            assert_eq!(round.clef(), Clef::Bass);
        }
    }

    #[test]
    fn every_table_entry_is_reachable() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for id in 0..2_000 {
            for note in generate_round(Clef::Treble, 2, id, &mut rng).notes() {
                seen.insert(note.pitch_id);
            }
        }
        assert_eq!(seen.len(), Clef::Treble.notes().len());
    }

    #[test]
    fn distinct_names_keep_first_appearance() {
        let table = Clef::Treble.notes();
        // Do (c/4), Mi (e/4), Do (c/5)
        let round = Round::new(1, Clef::Treble, vec![table[0], table[2], table[7]]);
        assert_eq!(round.distinct_names(), vec!["Do", "Mi"]);
        assert_eq!(round.staff_notes()[2], ("c/5", DurationClass::Quarter));
    }
}
