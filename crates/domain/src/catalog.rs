use serde::{Deserialize, Serialize};

use crate::config::Notation;
use crate::pitch::Pitch;
use crate::DomainError;

/// One entry of a clef's note table.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
pub struct Note {
    pub name: &'static str,
    pub english_name: Option<&'static str>,
    pub pitch_id: &'static str,
}

impl Note {
    const fn new(name: &'static str, english_name: &'static str, pitch_id: &'static str) -> Self {
        Self {
            name,
            english_name: Some(english_name),
            pitch_id,
        }
    }

    pub fn label(&self, notation: Notation) -> &'static str {
        match notation {
            Notation::English => self.english_name.unwrap_or(self.name),
            Notation::Latin => self.name,
        }
    }

    pub fn pitch(&self) -> Result<Pitch, DomainError> {
        Pitch::parse(self.pitch_id)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
}

impl Clef {
    pub const ALL: [Clef; 2] = [Clef::Treble, Clef::Bass];

    pub fn notes(self) -> &'static [Note] {
        match self {
            Clef::Treble => TREBLE_NOTES,
            Clef::Bass => BASS_NOTES,
        }
    }

    /// Identifier understood by staff renderers.
    pub fn id(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
        }
    }

    pub fn display_name(self, notation: Notation) -> &'static str {
        match (self, notation) {
            (Clef::Treble, Notation::Latin) => "Clave de Sol",
            (Clef::Bass, Notation::Latin) => "Clave de Fa",
            (Clef::Treble, Notation::English) => "Treble clef",
            (Clef::Bass, Notation::English) => "Bass clef",
        }
    }
}

static TREBLE_NOTES: &[Note] = &[
    Note::new("Do", "C", "c/4"),
    Note::new("Re", "D", "d/4"),
    Note::new("Mi", "E", "e/4"),
    Note::new("Fa", "F", "f/4"),
    Note::new("Sol", "G", "g/4"),
    Note::new("La", "A", "a/4"),
    Note::new("Si", "B", "b/4"),
    Note::new("Do", "C", "c/5"),
    Note::new("Re", "D", "d/5"),
    Note::new("Mi", "E", "e/5"),
    Note::new("Fa", "F", "f/5"),
    Note::new("Sol", "G", "g/5"),
    Note::new("La", "A", "a/5"),
];

static BASS_NOTES: &[Note] = &[
    Note::new("Mi", "E", "e/2"),
    Note::new("Fa", "F", "f/2"),
    Note::new("Sol", "G", "g/2"),
    Note::new("La", "A", "a/2"),
    Note::new("Si", "B", "b/2"),
    Note::new("Do", "C", "c/3"),
    Note::new("Re", "D", "d/3"),
    Note::new("Mi", "E", "e/3"),
    Note::new("Fa", "F", "f/3"),
    Note::new("Sol", "G", "g/3"),
    Note::new("La", "A", "a/3"),
    Note::new("Si", "B", "b/3"),
    Note::new("Do", "C", "c/4"),
];

/// Distinct note names of a clef in table order.
pub fn distinct_names(clef: Clef) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for note in clef.notes() {
        if !names.contains(&note.name) {
            names.push(note.name);
        }
    }
    names
}

/// First table entry carrying `name`, used as the clickable representative.
pub fn representative(clef: Clef, name: &str) -> Option<Note> {
    clef.notes().iter().find(|note| note.name == name).copied()
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Chord {
    pub name: &'static str,
    pub pitch_ids: &'static [&'static str],
    pub note_names: &'static [&'static str],
}

impl Chord {
    pub fn pitches(&self) -> Result<Vec<Pitch>, DomainError> {
        self.pitch_ids.iter().map(|id| Pitch::parse(id)).collect()
    }
}

pub static CHORDS: &[Chord] = &[
    Chord {
        name: "Do Mayor (C)",
        pitch_ids: &["c/4", "e/4", "g/4"],
        note_names: &["Do", "Mi", "Sol"],
    },
    Chord {
        name: "Re Mayor (D)",
        pitch_ids: &["d/4", "f#/4", "a/4"],
        note_names: &["Re", "Fa#", "La"],
    },
    Chord {
        name: "Mi Mayor (E)",
        pitch_ids: &["e/4", "g#/4", "b/4"],
        note_names: &["Mi", "Sol#", "Si"],
    },
    Chord {
        name: "Fa Mayor (F)",
        pitch_ids: &["f/4", "a/4", "c/5"],
        note_names: &["Fa", "La", "Do"],
    },
    Chord {
        name: "Sol Mayor (G)",
        pitch_ids: &["g/4", "b/4", "d/5"],
        note_names: &["Sol", "Si", "Re"],
    },
    Chord {
        name: "La Mayor (A)",
        pitch_ids: &["a/4", "c#/5", "e/5"],
        note_names: &["La", "Do#", "Mi"],
    },
    Chord {
        name: "Si Mayor (B)",
        pitch_ids: &["b/4", "d#/5", "f#/5"],
        note_names: &["Si", "Re#", "Fa#"],
    },
    Chord {
        name: "Do menor (Cm)",
        pitch_ids: &["c/4", "eb/4", "g/4"],
        note_names: &["Do", "Mib", "Sol"],
    },
    Chord {
        name: "Re menor (Dm)",
        pitch_ids: &["d/4", "f/4", "a/4"],
        note_names: &["Re", "Fa", "La"],
    },
    Chord {
        name: "Mi menor (Em)",
        pitch_ids: &["e/4", "g/4", "b/4"],
        note_names: &["Mi", "Sol", "Si"],
    },
];
