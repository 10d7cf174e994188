use serde::{Deserialize, Serialize};
use solfa_domain::{Accidental, Clef, DomainError, Pitch};

/// Half-step positions of the five staff lines (bottom to top).
pub const STAFF_LINE_POSITIONS: [i32; 5] = [2, 4, 6, 8, 10];
const MIDDLE_LINE: i32 = 6;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DurationClass {
    Whole,
    Half,
    #[default]
    Quarter,
}

impl DurationClass {
    /// Renderer duration code.
    pub fn code(self) -> &'static str {
        match self {
            DurationClass::Whole => "w",
            DurationClass::Half => "h",
            DurationClass::Quarter => "q",
        }
    }

    pub fn has_stem(self) -> bool {
        !matches!(self, DurationClass::Whole)
    }

    pub fn filled(self) -> bool {
        matches!(self, DurationClass::Quarter)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StemDirection {
    Up,
    Down,
}

fn reference_index(clef: Clef) -> i32 {
    // Position 0 sits one ledger line below the staff: c/4 in treble, e/2 in bass.
    match clef {
        Clef::Treble => 4 * 7,
        Clef::Bass => 2 * 7 + 2,
    }
}

/// Half-step position of `pitch` on the staff, bottom line = 2.
pub fn staff_position(pitch: &Pitch, clef: Clef) -> i32 {
    pitch.diatonic_index() - reference_index(clef)
}

/// Staff line number of `pitch`: 1..=5 are the staff lines, spaces are halves.
pub fn key_line(pitch: &Pitch, clef: Clef) -> f32 {
    staff_position(pitch, clef) as f32 / 2.0
}

/// Notes on or above the middle line take a downward stem.
pub fn stem_direction(position: i32) -> StemDirection {
    if position >= MIDDLE_LINE {
        StemDirection::Down
    } else {
        StemDirection::Up
    }
}

/// Positions of the ledger lines a note at `position` needs.
pub fn ledger_positions(position: i32) -> Vec<i32> {
    let lowest = STAFF_LINE_POSITIONS[0];
    let highest = STAFF_LINE_POSITIONS[4];
    if position < lowest {
        (position..lowest).filter(|p| p % 2 == 0).rev().collect()
    } else if position > highest {
        (highest + 1..=position).filter(|p| p % 2 == 0).collect()
    } else {
        Vec::new()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedNote {
    pub pitch: Pitch,
    pub position: i32,
    pub duration: DurationClass,
    pub stem: StemDirection,
    pub ledgers: Vec<i32>,
}

impl PlacedNote {
    pub fn accidental(&self) -> Accidental {
        self.pitch.accidental
    }
}

/// Geometry shared by every staff renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct StaffLayout {
    pub clef: Clef,
    pub notes: Vec<PlacedNote>,
}

impl StaffLayout {
    pub fn new(clef: Clef, notes: &[(&str, DurationClass)]) -> Result<Self, DomainError> {
        let notes = notes
            .iter()
            .map(|(id, duration)| {
                let pitch = Pitch::parse(id)?;
                let position = staff_position(&pitch, clef);
                Ok(PlacedNote {
                    pitch,
                    position,
                    duration: *duration,
                    stem: stem_direction(position),
                    ledgers: ledger_positions(position),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        Ok(Self { clef, notes })
    }

    /// Highest and lowest half-step positions the drawing must cover.
    pub fn vertical_extent(&self) -> (i32, i32) {
        let top = self
            .notes
            .iter()
            .map(|n| n.position)
            .max()
            .unwrap_or(STAFF_LINE_POSITIONS[4])
            .max(STAFF_LINE_POSITIONS[4]);
        let bottom = self
            .notes
            .iter()
            .map(|n| n.position)
            .min()
            .unwrap_or(STAFF_LINE_POSITIONS[0])
            .min(STAFF_LINE_POSITIONS[0]);
        (top, bottom)
    }
}

/// A drawing surface that accepts a clef and `(pitch id, duration)` pairs.
pub trait StaffRenderer {
    fn render(&mut self, clef: Clef, notes: &[(&str, DurationClass)]) -> Result<(), DomainError>;
}
