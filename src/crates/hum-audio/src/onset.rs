use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::spectral::stft_magnitude;
use crate::{AudioError, Result};

/// Onset detection settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetParams {
    pub n_fft: usize,
    pub hop_length: usize,
    /// Half width of the moving threshold window, in seconds
    pub threshold_window_secs: f32,
    /// Standard deviations above the local mean
    pub k: f32,
    /// Fixed offset over the normalized novelty curve
    pub delta: f32,
    /// Shortest time between two onsets
    pub min_gap_secs: f32,
}

impl Default for OnsetParams {
    fn default() -> Self {
        OnsetParams {
            n_fft: 2048,
            hop_length: 512,
            threshold_window_secs: 0.25,
            k: 1.0,
            delta: 0.07,
            min_gap_secs: 0.05,
        }
    }
}

/// Spectral flux normalized to a maximum of 1 (positive differences only)
fn novelty(mag: &Array2<f32>) -> Vec<f32> {
    let mut flux = vec![0.0; mag.ncols()];

    for t in 1..mag.ncols() {
        let mut frame_flux = 0.0;
        for f in 0..mag.nrows() {
            let diff = mag[[f, t]] - mag[[f, t - 1]];
            if diff > 0.0 {
                frame_flux += diff;
            }
        }
        flux[t] = frame_flux;
    }

    let max = flux.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        flux.iter_mut().for_each(|v| *v /= max);
    }
    flux
}

/// Rolling mean + k * std + delta over `window` frames on each side
fn adaptive_threshold(signal: &[f32], window: usize, k: f32, delta: f32) -> Vec<f32> {
    (0..signal.len())
        .map(|i| {
            let start = i.saturating_sub(window);
            let end = signal.len().min(i + window + 1);
            let slice = &signal[start..end];

            let mean = slice.iter().sum::<f32>() / slice.len() as f32;
            let variance =
                slice.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / slice.len() as f32;
            mean + k * variance.sqrt() + delta
        })
        .collect()
}

/// Local maxima above the threshold, at least `min_distance` frames apart
fn pick_peaks(signal: &[f32], thresholds: &[f32], min_distance: usize) -> Vec<usize> {
    let mut peaks: Vec<usize> = Vec::new();

    for i in 1..signal.len().saturating_sub(1) {
        if let Some(&last) = peaks.last() {
            if i < last + min_distance {
                continue;
            }
        }
        if signal[i] >= signal[i - 1] && signal[i] > signal[i + 1] && signal[i] > thresholds[i] {
            peaks.push(i);
        }
    }

    peaks
}

/// Onset times in seconds.
pub fn detect_onsets(y: &[f32], sample_rate: u32, params: &OnsetParams) -> Result<Vec<f64>> {
    if sample_rate == 0 {
        return Err(AudioError::InvalidParameter(
            "sample rate must be positive".to_string(),
        ));
    }
    if y.is_empty() {
        return Ok(Vec::new());
    }

    let mag = stft_magnitude(y, params.n_fft, params.hop_length)?;
    let envelope = novelty(&mag);

    let frames_per_sec = sample_rate as f32 / params.hop_length as f32;
    let window = (params.threshold_window_secs * frames_per_sec) as usize;
    let min_distance = (params.min_gap_secs * frames_per_sec).ceil() as usize;

    let thresholds = adaptive_threshold(&envelope, window, params.k, params.delta);
    let onsets: Vec<f64> = pick_peaks(&envelope, &thresholds, min_distance)
        .into_iter()
        .map(|frame| (frame * params.hop_length) as f64 / sample_rate as f64)
        .collect();

    log::debug!("{} onsets found", onsets.len());
    Ok(onsets)
}
