use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// Position within the diatonic octave, C = 0.
    pub fn step(self) -> u8 {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    /// Semitones above C in the same octave.
    pub fn semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'c' => Some(Letter::C),
            'd' => Some(Letter::D),
            'e' => Some(Letter::E),
            'f' => Some(Letter::F),
            'g' => Some(Letter::G),
            'a' => Some(Letter::A),
            'b' => Some(Letter::B),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Letter::C => 'c',
            Letter::D => 'd',
            Letter::E => 'e',
            Letter::F => 'f',
            Letter::G => 'g',
            Letter::A => 'a',
            Letter::B => 'b',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Accidental {
    #[default]
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    pub fn offset(self) -> i32 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// A concrete pitch as encoded by identifiers such as `c/4` or `f#/4`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub letter: Letter,
    pub accidental: Accidental,
    pub octave: u8,
}

impl Pitch {
    pub const MAX_OCTAVE: u8 = 8;

    pub fn new(letter: Letter, accidental: Accidental, octave: u8) -> Self {
        Self {
            letter,
            accidental,
            octave,
        }
    }

    pub fn natural(letter: Letter, octave: u8) -> Self {
        Self::new(letter, Accidental::Natural, octave)
    }

    pub fn parse(id: &str) -> Result<Self, DomainError> {
        let (head, octave) = id
            .split_once('/')
            .ok_or_else(|| DomainError::invalid_pitch(id, "missing '/' separator"))?;
        let mut chars = head.chars();
        let letter = chars
            .next()
            .and_then(Letter::from_char)
            .ok_or_else(|| DomainError::invalid_pitch(id, "unknown note letter"))?;
        let accidental = match chars.as_str() {
            "" => Accidental::Natural,
            "#" => Accidental::Sharp,
            "b" => Accidental::Flat,
            _ => return Err(DomainError::invalid_pitch(id, "unknown accidental")),
        };
        let octave: u8 = octave
            .parse()
            .map_err(|_| DomainError::invalid_pitch(id, "octave is not a number"))?;
        if octave > Self::MAX_OCTAVE {
            return Err(DomainError::invalid_pitch(id, "octave out of range"));
        }
        Ok(Self::new(letter, accidental, octave))
    }

    pub fn id(&self) -> String {
        self.to_string()
    }

    /// Staff position counted in diatonic steps from c/0.
    pub fn diatonic_index(&self) -> i32 {
        self.octave as i32 * 7 + self.letter.step() as i32
    }

    pub fn midi_number(&self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.letter.semitone() + self.accidental.offset()
    }

    /// Equal temperament frequency with A4 at 440 Hz.
    pub fn frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.midi_number() - 69) as f32 / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accidental = match self.accidental {
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        };
        write!(f, "{}{}/{}", self.letter.as_char(), accidental, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
