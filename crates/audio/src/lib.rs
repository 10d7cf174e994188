pub mod backend;
pub mod dsp;
pub mod io;
pub mod schedule;

pub use backend::{CpalSampler, NullSampler, Sampler};
pub use dsp::{limit_buffer, render, PeakLevel};
pub use io::{AudioDecoder, DecodedAudio, SampleBank};
pub use schedule::{welcome_scale, PlaybackRequest, PlaybackStyle, ScheduledNote, Speed};
