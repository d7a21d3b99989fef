//! Audio folder processing: trim, frame, spectrogram and onsets per take

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use hum_audio::{SignalProcessor, Spectrogram};

use crate::batch::{list_files, run_batch, BatchOutcome};
use crate::config::AudioConfig;
use crate::export::write_spectrogram_csv;
use crate::metadata::FileInfo;

/// Per-take figures written to the audio feature table
#[derive(Debug, Clone)]
pub struct AudioFeatures {
    pub info: FileInfo,
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub trimmed_secs: f64,
    pub windows: usize,
    pub window_len: usize,
    pub freq_bins: usize,
    pub onset_count: usize,
    pub onsets: Vec<f64>,
}

/// Process one take, writing its spectrogram and trimmed audio under `out_dir`.
pub fn process_take<P: SignalProcessor>(
    path: &Path,
    processor: &P,
    config: &AudioConfig,
    out_dir: &Path,
) -> Result<AudioFeatures> {
    let info = FileInfo::from_path(path);
    let waveform = processor
        .decode_file(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    if waveform.is_empty() {
        anyhow::bail!("{} holds no samples", path.display());
    }

    let trimmed = processor.trim(&waveform, config.max_secs);
    let windows = processor.frames(&trimmed, config.frame_secs)?;
    let spectrogram: Spectrogram = processor.spectrogram(
        &trimmed,
        config.frame_secs,
        (config.freq_range[0], config.freq_range[1]),
    )?;
    let onsets = processor.onsets(&trimmed)?;

    let spec_path = out_dir.join("spectrograms").join(format!("{}.csv", info.key));
    write_spectrogram_csv(&spec_path, &spectrogram)?;

    if config.write_trimmed {
        let wav_path = out_dir.join("trimmed").join(format!("{}.wav", info.key));
        processor
            .write_wav(&wav_path, &trimmed)
            .with_context(|| format!("Failed to write {}", wav_path.display()))?;
    }

    Ok(AudioFeatures {
        info,
        sample_rate: waveform.sample_rate,
        duration_secs: waveform.duration_secs(),
        trimmed_secs: trimmed.duration_secs(),
        windows: windows.nrows(),
        window_len: windows.ncols(),
        freq_bins: spectrogram.freqs.len(),
        onset_count: onsets.len(),
        onsets,
    })
}

pub fn audio_folder<P: SignalProcessor + Sync>(
    dir: &Path,
    processor: &P,
    config: &AudioConfig,
    out_dir: &Path,
) -> Result<BatchOutcome<AudioFeatures>> {
    let files = list_files(dir, &config.extensions)?;
    log::info!("Processing {} audio files in {}", files.len(), dir.display());

    for sub in ["spectrograms", "trimmed"] {
        fs::create_dir_all(out_dir.join(sub))
            .with_context(|| format!("Failed to create {}", out_dir.join(sub).display()))?;
    }

    Ok(run_batch(&files, |path| {
        process_take(path, processor, config, out_dir)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hum_audio::{write_wav, HumProcessor, Waveform};
    use std::f32::consts::PI;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tarareo-audio-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Half a second of silence, one second of tone, half a second of silence
    fn padded_tone(sample_rate: u32) -> Waveform {
        let pad = vec![0.0f32; sample_rate as usize / 2];
        let tone = (0..sample_rate).map(|i| 0.4 * (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin());
        let samples = pad.iter().copied().chain(tone).chain(pad.iter().copied()).collect();
        Waveform::new(samples, sample_rate)
    }

    #[test]
    fn test_audio_folder_outputs() {
        let input = scratch_dir("in");
        let output = scratch_dir("out");
        write_wav(&input.join("F01_M01_S1_R1_hum.wav"), &padded_tone(16000)).unwrap();
        fs::write(input.join("F01_M01_S1_R2.wav"), b"RIFF but not really").unwrap();

        let config = AudioConfig {
            max_secs: 0.5,
            ..AudioConfig::default()
        };
        let outcome = audio_folder(&input, &HumProcessor::default(), &config, &output).unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.processed(), 1);

        let (_, features) = &outcome.results[0];
        assert_eq!(features.info.meta_id, "hum");
        assert_eq!(features.sample_rate, 16000);
        assert_eq!(features.duration_secs, 2.0);
        assert_eq!(features.trimmed_secs, 0.5);
        // 0.125 s windows of 2000 samples
        assert_eq!((features.windows, features.window_len), (4, 2000));
        assert!(features.freq_bins > 0);

        assert!(output.join("spectrograms/F01_M01_S1_R1_hum.csv").is_file());
        assert!(output.join("trimmed/F01_M01_S1_R1_hum.wav").is_file());

        fs::remove_dir_all(&input).ok();
        fs::remove_dir_all(&output).ok();
    }
}
