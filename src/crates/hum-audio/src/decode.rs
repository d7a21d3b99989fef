use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{AudioError, Result, Waveform};

/// Decode an audio file into a mono waveform at its native sample rate.
pub fn decode_file(path: &Path) -> Result<Waveform> {
    let data = std::fs::read(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    decode_bytes(data, extension)
}

/// Decode an in-memory audio file. `extension` helps the format probe.
pub fn decode_bytes(data: Vec<u8>, extension: Option<&str>) -> Result<Waveform> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::DecodeError(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeError("No valid audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeError(format!("Failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        match format.next_packet() {
            Ok(packet) if packet.track_id() == track_id => {
                let decoded = decoder.decode(&packet).map_err(|e| {
                    AudioError::DecodeError(format!("Failed to decode packet: {}", e))
                })?;
                sample_rate.get_or_insert(decoded.spec().rate);
                downmix_into(&decoded, &mut samples);
            }
            Ok(_) => continue,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                return Err(AudioError::DecodeError(format!("Format error: {}", e)));
            }
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| AudioError::DecodeError("Unknown sample rate".to_string()))?;
    log::debug!(
        "decoded {} samples at {} Hz",
        samples.len(),
        sample_rate
    );
    Ok(Waveform::new(samples, sample_rate))
}

/// Average every channel of a decoded packet into `output`.
fn downmix_into(decoded: &AudioBufferRef, output: &mut Vec<f32>) {
    let mut buffer = AudioBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
    decoded.convert(&mut buffer);

    let planes = buffer.planes();
    let channels = planes.planes();
    if channels.is_empty() {
        return;
    }
    let scale = 1.0 / channels.len() as f32;
    output.extend((0..buffer.frames()).map(|i| {
        channels.iter().map(|plane| plane[i]).sum::<f32>() * scale
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::write_wav;

    #[test]
    fn test_decode_written_wav() {
        let dir = std::env::temp_dir().join(format!("hum-audio-decode-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ramp.wav");

        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 / 1000.0) - 0.5).collect();
        write_wav(&path, &Waveform::new(samples.clone(), 8000)).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in decoded.samples.iter().zip(&samples) {
            assert!((a - b).abs() < 1e-3);
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_bytes(vec![1, 2, 3, 4, 5], Some("wav")).unwrap_err();
        assert!(matches!(err, AudioError::DecodeError(_)));
    }
}
