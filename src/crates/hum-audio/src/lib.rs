//! Signal processing for hummed and sung recordings
//!
//! This crate provides the audio side of the feature pipeline:
//! - Decode any format symphonia understands into a mono waveform
//! - Trim leading and trailing silence, then cut to a duration
//! - Split a waveform into non-overlapping windows
//! - Magnitude spectrograms in dB restricted to a frequency band
//! - Onset times from spectral flux
//! - WAV output of processed takes

pub mod decode;
pub mod frames;
pub mod onset;
pub mod processor;
pub mod spectral;
pub mod trim;
pub mod wav;

pub use decode::{decode_bytes, decode_file};
pub use frames::{frame_len, frames};
pub use onset::{detect_onsets, OnsetParams};
pub use processor::{HumProcessor, SignalProcessor};
pub use spectral::{amplitude_to_db, fft_frequencies, spectrogram, Spectrogram};
pub use trim::{trim, trim_silence, TrimParams};
pub use wav::write_wav;

/// Audio processing errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Failed to decode audio: {0}")]
    DecodeError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("WAV error: {0}")]
    WavError(#[from] hound::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Mono audio samples in [-1, 1] with their sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Waveform {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
pub(crate) mod test_signals {
    use std::f32::consts::PI;

    pub fn silence(len: usize) -> Vec<f32> {
        vec![0.0; len]
    }

    pub fn sine(freq: f32, amplitude: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_duration() {
        let wave = Waveform::new(vec![0.0; 22050], 44100);
        assert_eq!(wave.duration_secs(), 0.5);
        assert_eq!(Waveform::new(vec![], 0).duration_secs(), 0.0);
    }
}
