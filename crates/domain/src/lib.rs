pub mod catalog;
pub mod config;
pub mod error;
pub mod pitch;

pub use crate::catalog::{Chord, Clef, Note, CHORDS};
pub use crate::config::{Config, ConfigPatch, Mode, Notation};
pub use crate::error::DomainError;
pub use crate::pitch::{Accidental, Letter, Pitch};
