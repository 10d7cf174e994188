use solfa_domain::Pitch;
use time::Duration;

use crate::io::SampleBank;
use crate::schedule::{total_length, ScheduledNote};

/// Synth voice gain at attack, decaying exponentially to [`DECAY_FLOOR`].
pub const ATTACK_GAIN: f32 = 0.5;
pub const DECAY_FLOOR: f32 = 0.01;
const TAIL: Duration = Duration::milliseconds(50);
const RELEASE_FADE_SECS: f32 = 0.03;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakLevel {
    pub max: f32,
    pub min: f32,
}

impl PeakLevel {
    pub fn silence() -> Self {
        Self { max: 0.0, min: 0.0 }
    }

    pub fn magnitude(&self) -> f32 {
        self.max.abs().max(self.min.abs())
    }
}

pub fn measure_peak(buffer: &[f32]) -> PeakLevel {
    let mut peak = PeakLevel::silence();
    for sample in buffer {
        peak.max = peak.max.max(*sample);
        peak.min = peak.min.min(*sample);
    }
    peak
}

/// Scales the buffer down when overlapping voices push it past unity.
pub fn limit_buffer(buffer: &mut [f32]) -> PeakLevel {
    let peak = measure_peak(buffer);
    let magnitude = peak.magnitude();
    if magnitude > 1.0 {
        for sample in buffer.iter_mut() {
            *sample /= magnitude;
        }
    }
    peak
}

fn seconds_to_frames(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_seconds_f64().max(0.0) * sample_rate as f64).round() as usize
}

/// Mixes a schedule into a mono buffer at `sample_rate`.
pub fn render(schedule: &[ScheduledNote], sample_rate: u32, bank: Option<&SampleBank>) -> Vec<f32> {
    if schedule.is_empty() || sample_rate == 0 {
        return Vec::new();
    }
    let total = seconds_to_frames(total_length(schedule) + TAIL, sample_rate);
    let mut buffer = vec![0.0f32; total];
    for note in schedule {
        let start = seconds_to_frames(note.onset, sample_rate);
        let frames = seconds_to_frames(note.length(), sample_rate);
        let end = (start + frames).min(total);
        let Some(target) = buffer.get_mut(start..end) else {
            continue;
        };
        match bank.filter(|bank| !bank.is_empty()) {
            Some(bank) => mix_sample(target, &note.pitch, bank, sample_rate),
            None => mix_sine(target, note.frequency, sample_rate),
        }
    }
    limit_buffer(&mut buffer);
    buffer
}

fn mix_sine(target: &mut [f32], frequency: f32, sample_rate: u32) {
    let len = target.len().max(1) as f32;
    let ratio = DECAY_FLOOR / ATTACK_GAIN;
    let omega = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    for (index, out) in target.iter_mut().enumerate() {
        let gain = ATTACK_GAIN * ratio.powf(index as f32 / len);
        *out += (omega * index as f32).sin() * gain;
    }
}

fn mix_sample(target: &mut [f32], pitch: &Pitch, bank: &SampleBank, sample_rate: u32) {
    let Some((audio, rate)) = bank.nearest(pitch) else {
        return;
    };
    if audio.samples.is_empty() {
        return;
    }
    let step = rate * audio.sample_rate as f32 / sample_rate as f32;
    let fade = (RELEASE_FADE_SECS * sample_rate as f32).max(1.0);
    let len = target.len();
    for (index, out) in target.iter_mut().enumerate() {
        let position = index as f32 * step;
        let base = position.floor() as usize;
        let Some(&left) = audio.samples.get(base) else {
            break;
        };
        let right = audio.samples.get(base + 1).copied().unwrap_or(left);
        let frac = position - base as f32;
        let remaining = (len - index) as f32;
        let envelope = (remaining / fade).min(1.0);
        *out += (left + (right - left) * frac) * envelope;
    }
}
