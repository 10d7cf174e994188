use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use solfa_domain::Pitch;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

const SAMPLE_EXTENSIONS: [&str; 4] = ["wav", "mp3", "flac", "ogg"];

/// Mono PCM decoded from a sample file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

pub struct AudioDecoder;

impl AudioDecoder {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<DecodedAudio> {
        let path_ref = path.as_ref();
        let file =
            File::open(path_ref).with_context(|| format!("open audio file {:?}", path_ref))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = path_ref.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| anyhow::anyhow!("no default track found"))?;
        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
        let mut samples = Vec::new();

        loop {
            match format.next_packet() {
                Ok(packet) => {
                    if packet.track_id() != track_id {
                        continue;
                    }
                    let decoded = match decoder.decode(&packet) {
                        Ok(decoded) => decoded,
                        Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
                        Err(err) => return Err(err.into()),
                    };
                    let spec = *decoded.spec();
                    let channels = spec.channels.count().max(1);
                    let mut interleaved = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
                    interleaved.copy_interleaved_ref(decoded);
                    samples.extend(
                        interleaved
                            .samples()
                            .chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                    );
                }
                Err(err) => {
                    use symphonia::core::errors::Error as SymphError;
                    match err {
                        SymphError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                            break;
                        }
                        SymphError::ResetRequired => break,
                        _ => return Err(err.into()),
                    }
                }
            }
        }

        Ok(DecodedAudio {
            sample_rate,
            samples,
        })
    }
}

/// Recorded notes keyed by pitch, played back resampled to nearby pitches.
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    samples: Vec<(Pitch, DecodedAudio)>,
}

impl SampleBank {
    pub fn new(samples: Vec<(Pitch, DecodedAudio)>) -> Self {
        Self { samples }
    }

    /// Loads every file named like `C4.wav`, `Fs3.mp3` or `Eb5.flac` in `dir`.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("read sample directory {:?}", dir))?;
        let mut samples = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SAMPLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if !supported {
                continue;
            }
            let Some(pitch) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(pitch_from_stem)
            else {
                debug!(path = %path.display(), "ignoring sample without pitch name");
                continue;
            };
            match AudioDecoder::open(&path) {
                Ok(audio) => samples.push((pitch, audio)),
                Err(err) => warn!(path = %path.display(), %err, "failed to decode sample"),
            }
        }
        info!(count = samples.len(), dir = %dir.display(), "loaded sample bank");
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Closest recorded sample and the playback rate that retunes it to `pitch`.
    pub fn nearest(&self, pitch: &Pitch) -> Option<(&DecodedAudio, f32)> {
        let target = pitch.midi_number();
        self.samples
            .iter()
            .min_by_key(|(recorded, _)| (recorded.midi_number() - target).abs())
            .map(|(recorded, audio)| (audio, pitch.frequency() / recorded.frequency()))
    }
}

/// Parses sample file stems such as `C4`, `Fs4`, `F#4` or `Bb2`.
pub fn pitch_from_stem(stem: &str) -> Option<Pitch> {
    let digits = stem.find(|c: char| c.is_ascii_digit())?;
    let (head, octave) = stem.split_at(digits);
    let mut chars = head.chars();
    let letter = chars.next()?.to_ascii_lowercase();
    let accidental = match chars.as_str() {
        "" => "",
        "s" | "S" | "#" => "#",
        "b" => "b",
        _ => return None,
    };
    Pitch::parse(&format!("{letter}{accidental}/{octave}")).ok()
}
