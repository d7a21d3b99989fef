use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

use crate::{AudioError, Result, Waveform};

/// Write a waveform as a mono 16-bit PCM WAV file.
pub fn write_wav(path: &Path, waveform: &Waveform) -> Result<()> {
    if waveform.sample_rate == 0 {
        return Err(AudioError::InvalidParameter(
            "sample rate must be positive".to_string(),
        ));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in &waveform.samples {
        // Clamp to prevent clipping
        writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn test_write_clamps_and_keeps_spec() {
        let dir = std::env::temp_dir().join(format!("hum-audio-wav-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("clip.wav");

        write_wav(&path, &Waveform::new(vec![0.0, 0.5, 2.0, -2.0], 22050)).unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, 32767, -32767]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let path = std::env::temp_dir().join("hum-audio-never-written.wav");
        assert!(matches!(
            write_wav(&path, &Waveform::new(vec![0.0], 0)),
            Err(AudioError::InvalidParameter(_))
        ));
    }
}
