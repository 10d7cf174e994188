use anyhow::{anyhow, bail, Result};
use cpal::SampleFormat;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info, warn};

use crate::dsp::render;
use crate::io::SampleBank;
use crate::schedule::PlaybackRequest;

/// Something that can turn a playback request into sound.
pub trait Sampler {
    /// Whether the back end has finished loading and can accept requests.
    fn is_ready(&self) -> bool;
    fn play(&mut self, request: &PlaybackRequest) -> Result<()>;
}

/// Silent sampler used when sound is unavailable or disabled.
#[derive(Debug, Default)]
pub struct NullSampler;

impl Sampler for NullSampler {
    fn is_ready(&self) -> bool {
        true
    }

    fn play(&mut self, request: &PlaybackRequest) -> Result<()> {
        debug!(notes = ?request.pitch_ids, style = ?request.style, "null sampler playback");
        Ok(())
    }
}

/// Plays rendered requests through the default output device.
pub struct CpalSampler {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: SampleFormat,
    bank: Option<SampleBank>,
    stream: Option<cpal::Stream>,
}

impl CpalSampler {
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no audio output device available"))?;
        let supported = device.default_output_config()?;
        let format = supported.sample_format();
        if !matches!(
            format,
            SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
        ) {
            bail!("unsupported output sample format {format:?}");
        }
        let config = supported.config();
        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".into()),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            format = ?format,
            "opened audio output"
        );
        Ok(Self {
            device,
            config,
            format,
            bank: None,
            stream: None,
        })
    }

    pub fn with_bank(mut self, bank: SampleBank) -> Self {
        self.bank = Some(bank);
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }
}

impl CpalSampler {
    fn build_stream<T>(&self, buffer: Vec<f32>, convert: fn(f32) -> T) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + Send + 'static,
    {
        let channels = self.config.channels.max(1) as usize;
        let silence = convert(0.0);
        let mut cursor = 0usize;
        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = buffer.get(cursor).map_or(silence, |s| convert(*s));
                    for out in frame {
                        *out = sample;
                    }
                    cursor = cursor.saturating_add(1);
                }
            },
            |err| warn!(%err, "audio output stream error"),
            None,
        )?;
        Ok(stream)
    }
}

/// Converts a rendered sample to signed 16-bit, clipping outside -1..=1.
pub fn sample_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Converts a rendered sample to unsigned 16-bit centred on the midpoint.
pub fn sample_to_u16(sample: f32) -> u16 {
    let center = (u16::MAX / 2) as f32;
    (sample.clamp(-1.0, 1.0) * center + center).round() as u16
}

impl Sampler for CpalSampler {
    fn is_ready(&self) -> bool {
        true
    }

    fn play(&mut self, request: &PlaybackRequest) -> Result<()> {
        let schedule = request.schedule();
        if schedule.is_empty() {
            return Ok(());
        }
        let buffer = render(&schedule, self.sample_rate(), self.bank.as_ref());
        let stream = match self.format {
            SampleFormat::F32 => self.build_stream(buffer, |sample| sample)?,
            SampleFormat::I16 => self.build_stream(buffer, sample_to_i16)?,
            SampleFormat::U16 => self.build_stream(buffer, sample_to_u16)?,
            other => bail!("unsupported output sample format {other:?}"),
        };
        stream.play()?;
        // Replacing the handle stops whatever was still sounding.
        self.stream = Some(stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sampler_accepts_requests() {
        let mut sampler = NullSampler;
        assert!(sampler.is_ready());
        assert!(sampler.play(&PlaybackRequest::new(["c/4"])).is_ok());
    }

    #[test]
    fn signed_conversion_spans_full_range() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), i16::MAX);
        assert_eq!(sample_to_i16(-1.0), -i16::MAX);
        assert_eq!(sample_to_i16(3.0), i16::MAX);
    }

    #[test]
    fn unsigned_conversion_is_centred() {
        assert_eq!(sample_to_u16(0.0), u16::MAX / 2);
        assert_eq!(sample_to_u16(1.0), u16::MAX - 1);
        assert_eq!(sample_to_u16(-1.0), 0);
        assert!(sample_to_u16(0.5) > sample_to_u16(0.0));
        assert_eq!(sample_to_u16(-4.0), 0);
    }

    #[test]
    fn open_default_does_not_panic() {
        // Output device availability varies by environment; just ensure no panic.
        let _ = CpalSampler::open_default();
    }
}
