//! MIDI folder processing: analysis rows and encoded sequences

use anyhow::{Context, Result};
use std::path::Path;

use midi_features::{
    analyze, lstrip, resolve_tempo, tempo_changes, trim, Analysis, MidiFile, Sequence,
    SequenceEncoder,
};

use crate::batch::{file_name, list_files, run_batch, BatchOutcome};
use crate::config::MidiConfig;
use crate::metadata::FileInfo;

/// One analyzed file with its name fields
#[derive(Debug, Clone)]
pub struct MidiRow {
    pub info: FileInfo,
    pub analysis: Analysis,
}

fn load(path: &Path) -> Result<MidiFile> {
    let midi = MidiFile::from_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let changes = tempo_changes(&midi);
    if changes.len() > 1 && changes.iter().any(|&t| t != changes[0]) {
        log::warn!(
            "{}: {} tempo changes, only the first ({}) is used",
            file_name(path),
            changes.len(),
            changes[0]
        );
    }
    Ok(midi)
}

pub fn analyze_file(path: &Path) -> Result<MidiRow> {
    let midi = load(path)?;
    let analysis = analyze(&midi).with_context(|| format!("Failed to analyze {}", path.display()))?;
    Ok(MidiRow {
        info: FileInfo::from_path(path),
        analysis,
    })
}

/// Encode one file, after the optional leading-silence strip and trim.
pub fn sequence_file(path: &Path, encoder: &SequenceEncoder, config: &MidiConfig) -> Result<Sequence> {
    let mut midi = load(path)?;
    if config.lstrip {
        midi = lstrip(&midi);
    }
    if let Some(secs) = config.trim_secs {
        midi = trim(&midi, resolve_tempo(&midi), secs)
            .with_context(|| format!("Failed to trim {}", path.display()))?;
    }

    let sequence = encoder
        .encode(&midi)
        .with_context(|| format!("Failed to encode {}", path.display()))?;

    let report = sequence.report();
    if !report.unterminated.is_empty() {
        log::warn!(
            "{}: notes never released: {:?}",
            file_name(path),
            report.unterminated
        );
    }
    if report.orphan_releases > 0 || report.retriggered > 0 {
        log::warn!(
            "{}: {} orphan releases, {} retriggered notes",
            file_name(path),
            report.orphan_releases,
            report.retriggered
        );
    }
    Ok(sequence)
}

pub fn report_folder(dir: &Path, config: &MidiConfig) -> Result<BatchOutcome<MidiRow>> {
    let files = list_files(dir, &config.extensions)?;
    log::info!("Analyzing {} MIDI files in {}", files.len(), dir.display());
    Ok(run_batch(&files, analyze_file))
}

pub fn sequences_folder(dir: &Path, config: &MidiConfig) -> Result<BatchOutcome<Sequence>> {
    let encoder = SequenceEncoder::new(config.time_base())?;
    let files = list_files(dir, &config.extensions)?;
    log::info!("Encoding {} MIDI files in {}", files.len(), dir.display());
    Ok(run_batch(&files, |path| sequence_file(path, &encoder, config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeBaseKind;
    use midi_features::{Event, Message, Symbol};
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tarareo-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn melody(lead_in: u32) -> MidiFile {
        MidiFile::new(
            480,
            vec![vec![
                Message::new(0, Event::Tempo(500_000)),
                Message::new(lead_in, Event::note_on(60, 100)),
                Message::new(480, Event::note_off(60)),
                Message::new(0, Event::note_on(67, 100)),
                Message::new(960, Event::note_on(67, 0)),
                Message::new(0, Event::EndOfTrack),
            ]],
        )
        .unwrap()
    }

    fn write_folder(name: &str) -> PathBuf {
        let dir = scratch_dir(name);
        fs::write(dir.join("F01_M01_S1_R1.mid"), melody(0).to_bytes().unwrap()).unwrap();
        fs::write(dir.join("M02_M01_S1_R2_x.mid"), melody(960).to_bytes().unwrap()).unwrap();
        fs::write(dir.join("broken.mid"), b"not a midi file").unwrap();
        fs::write(dir.join("readme.txt"), b"ignored").unwrap();
        dir
    }

    #[test]
    fn test_report_folder_keeps_going_after_failure() {
        let dir = write_folder("report");
        let outcome = report_folder(&dir, &MidiConfig::default()).unwrap();

        assert_eq!(outcome.processed(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].file, "broken.mid");

        let (_, row) = &outcome.results[0];
        assert_eq!(row.info.key, "F01_M01_S1_R1");
        assert_eq!(row.analysis.lowest.as_ref().unwrap().name, "C4");
        assert_eq!(row.analysis.highest.as_ref().unwrap().name, "G4");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_sequences_strip_leading_silence() {
        let dir = write_folder("sequences");
        let config = MidiConfig {
            time_base: TimeBaseKind::Grid,
            windows: 64,
            total_secs: 16.0,
            ..MidiConfig::default()
        };
        let outcome = sequences_folder(&dir, &config).unwrap();
        assert_eq!(outcome.processed(), 2);

        // 0.25 s cells: the lead-in is gone, so both files encode the same
        let expected = vec![Symbol::Onset, Symbol::Sustain, Symbol::Onset, Symbol::Sustain, Symbol::Sustain, Symbol::Sustain];
        for (_, sequence) in &outcome.results {
            assert_eq!(sequence.symbols(), expected.as_slice());
        }

        let kept = MidiConfig {
            lstrip: false,
            ..config
        };
        let outcome = sequences_folder(&dir, &kept).unwrap();
        let (_, delayed) = &outcome.results[1];
        assert_eq!(&delayed.symbols()[..2], &[Symbol::Rest, Symbol::Rest]);

        fs::remove_dir_all(&dir).ok();
    }
}
