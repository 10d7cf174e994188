use serde::{Deserialize, Serialize};

use crate::catalog::Clef;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    /// Solfège names (Do, Re, Mi).
    #[default]
    Latin,
    /// Letter names (C, D, E).
    English,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Practice,
    Flashcards,
}

/// Learner preferences persisted between sessions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub clef: Clef,
    pub notes_to_show: u8,
    pub notation: Notation,
    pub mode: Mode,
    pub sound_enabled: bool,
}

impl Config {
    pub const MIN_NOTES: u8 = 1;
    pub const MAX_NOTES: u8 = 3;

    pub fn merge(&mut self, patch: &ConfigPatch) {
        if let Some(clef) = patch.clef {
            self.clef = clef;
        }
        if let Some(count) = patch.notes_to_show {
            self.notes_to_show = count;
        }
        if let Some(notation) = patch.notation {
            self.notation = notation;
        }
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(sound) = patch.sound_enabled {
            self.sound_enabled = sound;
        }
    }

    pub fn merged(&self, patch: &ConfigPatch) -> Self {
        let mut next = self.clone();
        next.merge(patch);
        next
    }

    /// Round length actually generated; the stored count is not validated.
    pub fn round_len(&self) -> usize {
        self.notes_to_show.clamp(Self::MIN_NOTES, Self::MAX_NOTES) as usize
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clef: Clef::Treble,
            notes_to_show: 1,
            notation: Notation::Latin,
            mode: Mode::Practice,
            sound_enabled: true,
        }
    }
}

/// Partial update applied on top of the current [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    pub clef: Option<Clef>,
    pub notes_to_show: Option<u8>,
    pub notation: Option<Notation>,
    pub mode: Option<Mode>,
    pub sound_enabled: Option<bool>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn clef(clef: Clef) -> Self {
        Self {
            clef: Some(clef),
            ..Self::default()
        }
    }

    pub fn notes_to_show(count: u8) -> Self {
        Self {
            notes_to_show: Some(count),
            ..Self::default()
        }
    }

    pub fn notation(notation: Notation) -> Self {
        Self {
            notation: Some(notation),
            ..Self::default()
        }
    }

    pub fn mode(mode: Mode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn sound_enabled(enabled: bool) -> Self {
        Self {
            sound_enabled: Some(enabled),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fresh_install() {
        let config = Config::default();
        assert_eq!(config.clef, Clef::Treble);
        assert_eq!(config.notes_to_show, 1);
        assert_eq!(config.notation, Notation::Latin);
        assert_eq!(config.mode, Mode::Practice);
        assert!(config.sound_enabled);
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let mut config = Config::default();
        config.merge(&ConfigPatch::clef(Clef::Bass));
        assert_eq!(config.clef, Clef::Bass);
        assert_eq!(config.notes_to_show, 1);

        let before = config.clone();
        config.merge(&ConfigPatch::default());
        assert_eq!(config, before);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert_eq!(
            json,
            r#"{"clef":"treble","notesToShow":1,"notation":"latin","mode":"practice","soundEnabled":true}"#
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"clef":"bass","notesCount":2}"#).unwrap();
        assert_eq!(config.clef, Clef::Bass);
        assert_eq!(config.notes_to_show, 1);
        assert!(config.sound_enabled);
    }

    #[test]
    fn round_len_clamps_unvalidated_counts() {
        let mut config = Config::default();
        config.merge(&ConfigPatch::notes_to_show(9));
        assert_eq!(config.notes_to_show, 9);
        assert_eq!(config.round_len(), 3);
        config.merge(&ConfigPatch::notes_to_show(0));
        assert_eq!(config.round_len(), 1);
    }
}
