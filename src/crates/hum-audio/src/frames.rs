use ndarray::Array2;

use crate::{AudioError, Result};

/// Samples in a window of `frame_secs` seconds, rounded down.
pub fn frame_len(sample_rate: u32, frame_secs: f64) -> Result<usize> {
    if !frame_secs.is_finite() || frame_secs <= 0.0 {
        return Err(AudioError::InvalidParameter(format!(
            "window length must be positive, got {}s",
            frame_secs
        )));
    }
    let len = (sample_rate as f64 * frame_secs).floor() as usize;
    if len == 0 {
        return Err(AudioError::InvalidParameter(format!(
            "a {}s window holds no samples at {} Hz",
            frame_secs, sample_rate
        )));
    }
    Ok(len)
}

/// Split `samples` into non-overlapping windows of `len` samples, one per row.
///
/// A trailing partial window is dropped.
pub fn frames(samples: &[f32], len: usize) -> Result<Array2<f32>> {
    if len == 0 {
        return Err(AudioError::InvalidParameter(
            "window length is zero".to_string(),
        ));
    }
    let n_frames = samples.len() / len;
    let data = samples[..n_frames * len].to_vec();
    Array2::from_shape_vec((n_frames, len), data)
        .map_err(|e| AudioError::InvalidParameter(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_frame_len() {
        assert_eq!(frame_len(22050, 0.1).unwrap(), 2205);
        assert_eq!(frame_len(16000, 0.125).unwrap(), 2000);
        assert!(frame_len(16000, 0.0).is_err());
        assert!(frame_len(10, 0.01).is_err());
    }

    #[test]
    fn test_frames_drop_partial_window() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let framed = frames(&samples, 3).unwrap();
        assert_eq!(framed.shape(), &[3, 3]);
        assert_eq!(framed[[1, 0]], 3.0);
        assert_eq!(framed[[2, 2]], 8.0);
    }

    #[test]
    fn test_too_short_for_one_window() {
        let framed = frames(&[0.0; 5], 8).unwrap();
        assert_eq!(framed.shape(), &[0, 8]);
    }

    proptest! {
        #[test]
        fn rows_are_consecutive_windows(
            samples in prop::collection::vec(-1.0f32..1.0, 0..3000),
            len in 1usize..400,
        ) {
            let framed = frames(&samples, len).unwrap();
            prop_assert_eq!(framed.shape(), &[samples.len() / len, len]);
            for (i, row) in framed.rows().into_iter().enumerate() {
                prop_assert_eq!(row.to_vec(), samples[i * len..(i + 1) * len].to_vec());
            }
        }
    }
}
