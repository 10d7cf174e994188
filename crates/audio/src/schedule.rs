use serde::{Deserialize, Serialize};
use solfa_domain::{Note, Pitch};
use time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackStyle {
    /// Notes in the order given.
    #[default]
    Normal,
    /// Notes sorted from lowest to highest before playing.
    Scale,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Speed {
    #[default]
    Normal,
    Fast,
    VeryFast,
}

impl Speed {
    /// Distance between consecutive onsets.
    pub fn step(self) -> Duration {
        match self {
            Speed::Normal => Duration::milliseconds(600),
            Speed::Fast => Duration::milliseconds(300),
            Speed::VeryFast => Duration::milliseconds(150),
        }
    }

    pub fn note_length(self) -> Duration {
        match self {
            Speed::Normal => Duration::milliseconds(500),
            Speed::Fast => Duration::milliseconds(280),
            Speed::VeryFast => Duration::milliseconds(140),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaybackRequest {
    pub pitch_ids: Vec<String>,
    pub style: PlaybackStyle,
    pub speed: Speed,
    /// Hold every note until the last one ends, like a sustain pedal.
    pub sustain: bool,
}

impl PlaybackRequest {
    pub fn new<I, S>(pitch_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pitch_ids: pitch_ids.into_iter().map(Into::into).collect(),
            style: PlaybackStyle::Normal,
            speed: Speed::Normal,
            sustain: false,
        }
    }

    pub fn from_notes(notes: &[Note]) -> Self {
        Self::new(notes.iter().map(|note| note.pitch_id))
    }

    pub fn with_style(mut self, style: PlaybackStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_sustain(mut self, sustain: bool) -> Self {
        self.sustain = sustain;
        self
    }

    pub fn schedule(&self) -> Vec<ScheduledNote> {
        let mut pitches: Vec<Pitch> = self
            .pitch_ids
            .iter()
            .filter_map(|id| match Pitch::parse(id) {
                Ok(pitch) => Some(pitch),
                Err(err) => {
                    debug!(%err, "skipping unplayable pitch");
                    None
                }
            })
            .collect();
        if self.style == PlaybackStyle::Scale {
            pitches.sort_by(|a, b| a.frequency().total_cmp(&b.frequency()));
        }

        let step = self.speed.step();
        let length = self.speed.note_length();
        let mut notes: Vec<ScheduledNote> = pitches
            .into_iter()
            .enumerate()
            .map(|(index, pitch)| {
                let onset = step * index as u32;
                ScheduledNote {
                    pitch,
                    frequency: pitch.frequency(),
                    onset,
                    release: onset + length,
                }
            })
            .collect();

        if self.sustain {
            if let Some(end) = notes.last().map(|note| note.release) {
                for note in &mut notes {
                    note.release = end;
                }
            }
        }
        notes
    }
}

/// A timed attack/release pair produced from a [`PlaybackRequest`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledNote {
    pub pitch: Pitch,
    pub frequency: f32,
    pub onset: Duration,
    pub release: Duration,
}

impl ScheduledNote {
    pub fn length(&self) -> Duration {
        self.release - self.onset
    }
}

/// Opening flourish played when a session starts with sound enabled.
pub fn welcome_scale() -> PlaybackRequest {
    PlaybackRequest::new(["g/3", "c/4", "d/4", "e/4", "g/4", "c/5"])
        .with_style(PlaybackStyle::Scale)
        .with_speed(Speed::VeryFast)
        .with_sustain(true)
}

pub fn total_length(schedule: &[ScheduledNote]) -> Duration {
    schedule
        .iter()
        .map(|note| note.release)
        .max()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_style_keeps_order_and_spacing() {
        let schedule = PlaybackRequest::new(["e/4", "c/4"]).schedule();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].pitch.id(), "e/4");
        assert_eq!(schedule[1].onset, Duration::milliseconds(600));
        assert_eq!(schedule[1].length(), Duration::milliseconds(500));
    }

    #[test]
    fn scale_style_sorts_ascending() {
        let schedule = PlaybackRequest::new(["c/5", "g/3", "e/4"])
            .with_style(PlaybackStyle::Scale)
            .schedule();
        let ids: Vec<String> = schedule.iter().map(|n| n.pitch.id()).collect();
        assert_eq!(ids, ["g/3", "e/4", "c/5"]);
    }

    #[test]
    fn sustain_holds_until_last_release() {
        let schedule = PlaybackRequest::new(["g/3", "c/4", "d/4", "e/4", "g/4", "c/5"])
            .with_style(PlaybackStyle::Scale)
            .with_speed(Speed::VeryFast)
            .with_sustain(true)
            .schedule();
        let end = total_length(&schedule);
        assert_eq!(end, Duration::milliseconds(150 * 5 + 140));
        assert!(schedule.iter().all(|n| n.release == end));
    }

    #[test]
    fn welcome_scale_is_sustained_and_fast() {
        let request = welcome_scale();
        assert!(request.sustain);
        assert_eq!(request.speed, Speed::VeryFast);
        assert_eq!(request.schedule().len(), 6);
    }

    #[test]
    fn unknown_pitches_are_skipped() {
        let schedule = PlaybackRequest::new(["c/4", "nope", "d/4"]).schedule();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[1].onset, Duration::milliseconds(600));
    }
}
