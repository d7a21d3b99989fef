//! Spectral processing utilities (STFT, dB conversion, band selection)

use ndarray::{Array2, Axis};
use rustfft::{num_complex::Complex32, FftPlanner};

use crate::{AudioError, Result};

/// Amplitude floor used before taking logarithms
const AMPLITUDE_FLOOR: f32 = 1e-5;

/// Dynamic range kept below the loudest bin
const TOP_DB: f32 = 80.0;

/// Band-limited magnitude spectrogram in dB.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// One row per frequency bin, one column per frame
    pub db: Array2<f32>,
    /// Center frequency of each row in Hz
    pub freqs: Vec<f32>,
    /// Center time of each column in seconds
    pub times: Vec<f32>,
}

/// Periodic Hann window
fn hann(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Frequencies of the `n_fft / 2 + 1` non-negative FFT bins
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    (0..n_fft / 2 + 1)
        .map(|i| i as f32 * sample_rate as f32 / n_fft as f32)
        .collect()
}

/// Magnitude STFT with centered frames, zero padded by `n_fft / 2` on both sides.
///
/// Returns `(n_fft / 2 + 1, 1 + len / hop)` bins by frames.
pub fn stft_magnitude(y: &[f32], n_fft: usize, hop_length: usize) -> Result<Array2<f32>> {
    if n_fft == 0 || hop_length == 0 {
        return Err(AudioError::InvalidParameter(format!(
            "n_fft ({}) and hop ({}) must be positive",
            n_fft, hop_length
        )));
    }

    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; y.len() + 2 * pad];
    padded[pad..pad + y.len()].copy_from_slice(y);

    let n_frames = 1 + y.len() / hop_length;
    let n_bins = n_fft / 2 + 1;
    let mut mag = Array2::<f32>::zeros((n_bins, n_frames));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);
    let window = hann(n_fft);

    for frame_idx in 0..n_frames {
        let start = frame_idx * hop_length;
        let end = start + n_fft;
        if end > padded.len() {
            break;
        }

        let mut frame: Vec<Complex32> = padded[start..end]
            .iter()
            .zip(&window)
            .map(|(&sample, &win)| Complex32::new(sample * win, 0.0))
            .collect();
        fft.process(&mut frame);

        for (bin, value) in frame[..n_bins].iter().enumerate() {
            mag[[bin, frame_idx]] = value.norm();
        }
    }

    Ok(mag)
}

/// Convert magnitudes to dB relative to the largest one.
///
/// Values are floored at [`AMPLITUDE_FLOOR`] before the logarithm, and the
/// result is clipped to `TOP_DB` below its maximum.
pub fn amplitude_to_db(mag: &Array2<f32>) -> Array2<f32> {
    let reference = mag.iter().cloned().fold(0.0f32, f32::max).max(AMPLITUDE_FLOOR);
    let reference_db = 20.0 * reference.log10();

    let db = mag.mapv(|m| 20.0 * m.max(AMPLITUDE_FLOOR).log10() - reference_db);
    let peak = db.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    db.mapv(|v| v.max(peak - TOP_DB))
}

/// Spectrogram of `y` restricted to `fmin <= f <= fmax`, in dB.
pub fn spectrogram(
    y: &[f32],
    sample_rate: u32,
    n_fft: usize,
    hop_length: usize,
    freq_range: (f32, f32),
) -> Result<Spectrogram> {
    let (fmin, fmax) = freq_range;
    if !(fmin <= fmax) {
        return Err(AudioError::InvalidParameter(format!(
            "empty frequency range {}..{}",
            fmin, fmax
        )));
    }

    let mag = stft_magnitude(y, n_fft, hop_length)?;
    let all_freqs = fft_frequencies(sample_rate, n_fft);
    let kept: Vec<usize> = all_freqs
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f >= fmin && f <= fmax)
        .map(|(i, _)| i)
        .collect();

    let band = mag.select(Axis(0), &kept);
    let times = (0..band.ncols())
        .map(|i| i as f32 * hop_length as f32 / sample_rate as f32)
        .collect();

    Ok(Spectrogram {
        db: amplitude_to_db(&band),
        freqs: kept.iter().map(|&i| all_freqs[i]).collect(),
        times,
    })
}
