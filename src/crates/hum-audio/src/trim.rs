use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::Waveform;

/// Power floor used before taking logarithms
const POWER_FLOOR: f64 = 1e-10;

/// Silence detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimParams {
    /// Frames this many dB below the loudest frame count as silence
    pub top_db: f64,
    pub frame_length: usize,
    pub hop_length: usize,
}

impl Default for TrimParams {
    fn default() -> Self {
        TrimParams {
            top_db: 50.0,
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

/// Mean power of centered frames, zero padded at both ends.
fn frame_powers(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let n_frames = 1 + samples.len() / hop_length;
    let half = (frame_length / 2) as isize;

    (0..n_frames)
        .map(|i| {
            let center = (i * hop_length) as isize;
            let start = (center - half).max(0) as usize;
            let end = ((center + half) as usize).min(samples.len());
            let energy: f64 = samples[start.min(end)..end]
                .iter()
                .map(|&s| (s as f64) * (s as f64))
                .sum();
            energy / frame_length as f64
        })
        .collect()
}

/// Sample range left after dropping leading and trailing silence.
///
/// A frame is silent when its power is more than `top_db` below the loudest
/// frame. Digital silence throughout is kept whole.
pub fn trim_silence(samples: &[f32], params: &TrimParams) -> Range<usize> {
    if samples.is_empty() || params.hop_length == 0 || params.frame_length == 0 {
        return 0..samples.len();
    }

    let powers = frame_powers(samples, params.frame_length, params.hop_length);
    let reference = powers.iter().cloned().fold(0.0f64, f64::max).max(POWER_FLOOR);
    let reference_db = 10.0 * reference.log10();

    let loud = |p: &f64| 10.0 * p.max(POWER_FLOOR).log10() - reference_db > -params.top_db;
    let first = powers.iter().position(loud);
    let last = powers.iter().rposition(loud);

    match (first, last) {
        (Some(first), Some(last)) => {
            let start = (first * params.hop_length).min(samples.len());
            let end = ((last + 1) * params.hop_length).min(samples.len());
            start..end
        }
        _ => 0..0,
    }
}

/// Drop leading and trailing silence, then keep at most `max_secs` seconds.
pub fn trim(waveform: &Waveform, max_secs: f64, params: &TrimParams) -> Waveform {
    let range = trim_silence(&waveform.samples, params);
    let trimmed = &waveform.samples[range];

    let max_samples = (max_secs.max(0.0) * waveform.sample_rate as f64).ceil() as usize;
    let kept = &trimmed[..trimmed.len().min(max_samples)];
    log::debug!(
        "trimmed {} samples to {}",
        waveform.samples.len(),
        kept.len()
    );
    Waveform::new(kept.to_vec(), waveform.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_signals::{silence, sine};
    use proptest::prelude::*;

    const SR: u32 = 16000;

    fn padded_tone() -> Vec<f32> {
        let mut samples = silence(8192);
        samples.extend(sine(440.0, 0.5, SR, 16000));
        samples.extend(silence(8192));
        samples
    }

    #[test]
    fn test_silent_padding_removed() {
        let samples = padded_tone();
        let range = trim_silence(&samples, &TrimParams::default());

        // Frame resolution: within one frame of the true edges
        assert!(range.start <= 8192 && 8192 - range.start <= 2048);
        assert!(range.end >= 8192 + 16000 && range.end - (8192 + 16000) <= 2048);
    }

    #[test]
    fn test_trim_cuts_to_duration() {
        let wave = Waveform::new(padded_tone(), SR);
        let trimmed = trim(&wave, 0.5, &TrimParams::default());
        assert_eq!(trimmed.len(), 8000);
        assert_eq!(trimmed.sample_rate, SR);
    }

    #[test]
    fn test_short_take_is_not_extended() {
        let wave = Waveform::new(sine(440.0, 0.5, SR, 4000), SR);
        let trimmed = trim(&wave, 10.0, &TrimParams::default());
        assert!(trimmed.len() <= 4000);
        assert!(!trimmed.is_empty());
    }

    #[test]
    fn test_digital_silence_kept_whole() {
        let samples = silence(5000);
        assert_eq!(trim_silence(&samples, &TrimParams::default()), 0..5000);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(trim_silence(&[], &TrimParams::default()), 0..0);
        let trimmed = trim(&Waveform::new(vec![], SR), 1.0, &TrimParams::default());
        assert!(trimmed.is_empty());
    }

    proptest! {
        #[test]
        fn trimmed_range_stays_in_bounds(
            samples in prop::collection::vec(-1.0f32..1.0, 0..6000),
            frame_length in 1usize..4096,
            hop_length in 1usize..1024,
        ) {
            let params = TrimParams { top_db: 50.0, frame_length, hop_length };
            let range = trim_silence(&samples, &params);
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end <= samples.len());
        }

        #[test]
        fn trim_never_exceeds_max_duration(
            samples in prop::collection::vec(-1.0f32..1.0, 0..6000),
            max_secs in 0.0f64..1.0,
        ) {
            let wave = Waveform::new(samples, SR);
            let trimmed = trim(&wave, max_secs, &TrimParams::default());
            prop_assert!(trimmed.len() <= (max_secs * SR as f64).ceil() as usize);
            prop_assert!(trimmed.len() <= wave.len());
        }
    }
}
