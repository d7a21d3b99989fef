//! CSV and JSON output of batch results

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hum_audio::Spectrogram;
use midi_features::{note_to_name, EncodeReport, Sequence, TimeBase};

use crate::audio_batch::AudioFeatures;
use crate::batch::{file_name, FileFailure};
use crate::metadata::FileInfo;
use crate::midi_batch::MidiRow;

const INFO_COLUMNS: [&str; 7] = [
    "key",
    "gender",
    "person_id",
    "music_id",
    "segment_id",
    "repetition_id",
    "meta_id",
];

fn info_fields(info: &FileInfo) -> Vec<String> {
    vec![
        info.key.clone(),
        info.gender.clone(),
        info.person_id.clone(),
        info.music_id.clone(),
        info.segment_id.clone(),
        info.repetition_id.clone(),
        info.meta_id.clone(),
    ]
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))
}

/// One row per file: name fields, tempo, shortest figure and pitch range.
pub fn write_analysis_csv(path: &Path, rows: &[MidiRow]) -> Result<()> {
    let mut wtr = writer(path)?;

    let mut header: Vec<&str> = INFO_COLUMNS.to_vec();
    header.extend([
        "tempo",
        "min_time",
        "min_figure",
        "min_note",
        "max_note",
        "min_freq",
        "max_freq",
        "min_name",
        "max_name",
    ]);
    wtr.write_record(&header)?;

    for row in rows {
        let a = &row.analysis;
        let mut record = info_fields(&row.info);
        record.extend([
            a.tempo.to_string(),
            opt(a.min_gap_secs),
            opt(a.min_figure.map(|f| f.label())),
            opt(a.lowest.as_ref().map(|b| b.note)),
            opt(a.highest.as_ref().map(|b| b.note)),
            opt(a.lowest.as_ref().map(|b| b.frequency)),
            opt(a.highest.as_ref().map(|b| b.frequency)),
            opt(a.lowest.as_ref().map(|b| b.name.clone())),
            opt(a.highest.as_ref().map(|b| b.name.clone())),
        ]);
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// One row per file with the occurrence count of each of the 128 notes.
pub fn write_histogram_csv(path: &Path, rows: &[MidiRow]) -> Result<()> {
    let mut wtr = writer(path)?;

    let mut header = vec!["key".to_string()];
    header.extend((0..128).map(|n| format!("{} ({})", n, note_to_name(n))));
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.info.key.clone()];
        record.extend(row.analysis.histogram.counts().iter().map(|c| c.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct SequenceEntry<'a> {
    codes: Vec<u8>,
    pattern: String,
    report: &'a EncodeReport,
}

#[derive(Debug, Serialize)]
struct SequencesDocument<'a> {
    time_base: TimeBase,
    sequences: BTreeMap<String, SequenceEntry<'a>>,
}

/// All sequences keyed by file name.
pub fn write_sequences_json(
    path: &Path,
    time_base: TimeBase,
    results: &[(PathBuf, Sequence)],
) -> Result<()> {
    let sequences = results
        .iter()
        .map(|(file, seq)| {
            let entry = SequenceEntry {
                codes: seq.codes(),
                pattern: seq.to_pattern(),
                report: seq.report(),
            };
            (file_name(file), entry)
        })
        .collect();

    let doc = SequencesDocument {
        time_base,
        sequences,
    };
    fs::write(path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_audio_csv(path: &Path, rows: &[AudioFeatures]) -> Result<()> {
    let mut wtr = writer(path)?;

    let mut header: Vec<&str> = INFO_COLUMNS.to_vec();
    header.extend([
        "sample_rate",
        "duration_secs",
        "trimmed_secs",
        "windows",
        "window_len",
        "freq_bins",
        "onset_count",
    ]);
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = info_fields(&row.info);
        record.extend([
            row.sample_rate.to_string(),
            row.duration_secs.to_string(),
            row.trimmed_secs.to_string(),
            row.windows.to_string(),
            row.window_len.to_string(),
            row.freq_bins.to_string(),
            row.onset_count.to_string(),
        ]);
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Long format: one row per onset
pub fn write_onsets_csv(path: &Path, rows: &[AudioFeatures]) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["key", "onset", "time_secs"])?;
    for row in rows {
        for (i, time) in row.onsets.iter().enumerate() {
            wtr.write_record([row.info.key.clone(), i.to_string(), time.to_string()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Frequencies down, frame times across, values in dB.
pub fn write_spectrogram_csv(path: &Path, spectrogram: &Spectrogram) -> Result<()> {
    let mut wtr = writer(path)?;

    let mut header = vec!["freq_hz".to_string()];
    header.extend(spectrogram.times.iter().map(|t| format!("{:.4}", t)));
    wtr.write_record(&header)?;

    for (freq, row) in spectrogram.freqs.iter().zip(spectrogram.db.rows()) {
        let mut record = vec![freq.to_string()];
        record.extend(row.iter().map(|v| format!("{:.2}", v)));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Record of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub command: String,
    pub generated_at: DateTime<Utc>,
    pub input_dir: String,
    pub processed: usize,
    pub failed: Vec<FileFailure>,
    pub outputs: Vec<String>,
}

impl Summary {
    pub fn new(command: &str, input_dir: &Path, processed: usize, failed: Vec<FileFailure>) -> Self {
        Summary {
            command: command.to_string(),
            generated_at: Utc::now(),
            input_dir: input_dir.display().to_string(),
            processed,
            failed,
            outputs: Vec::new(),
        }
    }

    pub fn output(mut self, path: &Path) -> Self {
        self.outputs.push(path.display().to_string());
        self
    }
}

pub fn write_summary_json(path: &Path, summary: &Summary) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(summary)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
