use ndarray::Array2;
use std::path::Path;

use crate::frames::{frame_len, frames};
use crate::onset::{detect_onsets, OnsetParams};
use crate::spectral::{spectrogram, Spectrogram};
use crate::trim::{trim, TrimParams};
use crate::{decode, wav, Result, Waveform};

/// The signal operations the audio batch relies on.
pub trait SignalProcessor {
    fn decode_file(&self, path: &Path) -> Result<Waveform>;

    /// Remove silent edges, then keep at most `max_secs` seconds
    fn trim(&self, waveform: &Waveform, max_secs: f64) -> Waveform;

    /// Non-overlapping windows of `frame_secs` seconds, one per row
    fn frames(&self, waveform: &Waveform, frame_secs: f64) -> Result<Array2<f32>>;

    /// dB spectrogram with one STFT frame per `frame_secs` window
    fn spectrogram(
        &self,
        waveform: &Waveform,
        frame_secs: f64,
        freq_range: (f32, f32),
    ) -> Result<Spectrogram>;

    /// Onset times in seconds
    fn onsets(&self, waveform: &Waveform) -> Result<Vec<f64>>;

    fn write_wav(&self, path: &Path, waveform: &Waveform) -> Result<()>;
}

/// Default [`SignalProcessor`] built on symphonia, rustfft and hound.
#[derive(Debug, Clone, Default)]
pub struct HumProcessor {
    pub trim: TrimParams,
    pub onset: OnsetParams,
}

impl HumProcessor {
    pub fn new(trim: TrimParams, onset: OnsetParams) -> Self {
        HumProcessor { trim, onset }
    }
}

impl SignalProcessor for HumProcessor {
    fn decode_file(&self, path: &Path) -> Result<Waveform> {
        decode::decode_file(path)
    }

    fn trim(&self, waveform: &Waveform, max_secs: f64) -> Waveform {
        trim(waveform, max_secs, &self.trim)
    }

    fn frames(&self, waveform: &Waveform, frame_secs: f64) -> Result<Array2<f32>> {
        let len = frame_len(waveform.sample_rate, frame_secs)?;
        frames(&waveform.samples, len)
    }

    fn spectrogram(
        &self,
        waveform: &Waveform,
        frame_secs: f64,
        freq_range: (f32, f32),
    ) -> Result<Spectrogram> {
        let len = frame_len(waveform.sample_rate, frame_secs)?;
        spectrogram(&waveform.samples, waveform.sample_rate, len, len, freq_range)
    }

    fn onsets(&self, waveform: &Waveform) -> Result<Vec<f64>> {
        detect_onsets(&waveform.samples, waveform.sample_rate, &self.onset)
    }

    fn write_wav(&self, path: &Path, waveform: &Waveform) -> Result<()> {
        wav::write_wav(path, waveform)
    }
}
