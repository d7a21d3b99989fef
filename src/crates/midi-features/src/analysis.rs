use serde::Serialize;

use crate::clock::ticks_to_seconds;
use crate::error::{FeatureError, Result};
use crate::midi::{Event, MidiFile};
use crate::note::{note_to_frequency, note_to_name};
use crate::tempo::{resolve_tempo, DEFAULT_TEMPO};

/// Relative tolerance when matching a beat quantum against a figure.
const QUANTUM_TOLERANCE: f64 = 1e-9;

/// Standard rhythmic figures, from the whole note down to the sixty-fourth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Figure {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl Figure {
    pub const ALL: [Figure; 7] = [
        Figure::Whole,
        Figure::Half,
        Figure::Quarter,
        Figure::Eighth,
        Figure::Sixteenth,
        Figure::ThirtySecond,
        Figure::SixtyFourth,
    ];

    /// Length of the figure in beats (quarter notes)
    pub fn beats(self) -> f64 {
        match self {
            Figure::Whole => 4.0,
            Figure::Half => 2.0,
            Figure::Quarter => 1.0,
            Figure::Eighth => 0.5,
            Figure::Sixteenth => 0.25,
            Figure::ThirtySecond => 0.125,
            Figure::SixtyFourth => 0.0625,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Figure::Whole => "whole",
            Figure::Half => "half",
            Figure::Quarter => "quarter",
            Figure::Eighth => "eighth",
            Figure::Sixteenth => "sixteenth",
            Figure::ThirtySecond => "thirty-second",
            Figure::SixtyFourth => "sixty-fourth",
        }
    }

    /// Spanish label used in the exported tables
    pub fn label(self) -> &'static str {
        match self {
            Figure::Whole => "redonda",
            Figure::Half => "blanca",
            Figure::Quarter => "negra",
            Figure::Eighth => "corchea",
            Figure::Sixteenth => "semicorchea",
            Figure::ThirtySecond => "fusa",
            Figure::SixtyFourth => "semifusa",
        }
    }

    /// The figure lasting exactly `quantum` beats, if any.
    pub fn from_quantum(quantum: f64) -> Option<Figure> {
        Figure::ALL
            .into_iter()
            .find(|f| (quantum - f.beats()).abs() <= QUANTUM_TOLERANCE * f.beats())
    }
}

/// Occurrences of each note number among sounding note-ons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteHistogram([u32; 128]);

impl NoteHistogram {
    pub fn new() -> Self {
        NoteHistogram([0; 128])
    }

    fn add(&mut self, key: u8) {
        self.0[(key & 0x7F) as usize] += 1;
    }

    pub fn count(&self, key: u8) -> u32 {
        self.0[(key & 0x7F) as usize]
    }

    pub fn counts(&self) -> &[u32; 128] {
        &self.0
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl Default for NoteHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowest or highest note of a file with its derived values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteBound {
    pub note: u8,
    pub frequency: f64,
    pub name: String,
}

impl NoteBound {
    fn new(note: u8) -> Self {
        NoteBound {
            note,
            frequency: note_to_frequency(note as i32),
            name: note_to_name(note as i32),
        }
    }
}

/// Pitch range and rhythmic granularity of one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Last tempo seen in the file, or the default
    pub tempo: u32,
    /// Shortest positive release delta, in seconds at the governing tempo
    pub min_gap_secs: Option<f64>,
    /// The same gap in beats
    pub min_gap_beats: Option<f64>,
    /// Figure matching the shortest gap; `None` when nothing matches
    pub min_figure: Option<Figure>,
    pub lowest: Option<NoteBound>,
    pub highest: Option<NoteBound>,
    #[serde(skip)]
    pub histogram: NoteHistogram,
}

/// Analyze every track of `midi` in a single pass.
///
/// The gap is measured on releases with velocity 0 (explicit or through the
/// note-on idiom). Its beat count does not depend on the tempo, so the
/// figure stays right when the reported (last) tempo differs from the
/// governing one. Files without notes are not an error: their bounds, gap
/// and figure are all `None`.
pub fn analyze(midi: &MidiFile) -> Result<Analysis> {
    let ticks_per_beat = midi.ticks_per_beat();
    if ticks_per_beat == 0 {
        return Err(FeatureError::malformed_timing("ticks_per_beat is zero"));
    }
    let resolved = resolve_tempo(midi);

    let mut histogram = NoteHistogram::new();
    let mut lowest: Option<u8> = None;
    let mut highest: Option<u8> = None;
    let mut min_gap_ticks: Option<u32> = None;
    let mut latest_tempo: Option<u32> = None;

    for message in midi.messages() {
        match message.event {
            Event::Tempo(tempo) => latest_tempo = Some(tempo),
            Event::NoteOn { key, .. } => {
                histogram.add(key);
                lowest = Some(lowest.map_or(key, |k| k.min(key)));
                highest = Some(highest.map_or(key, |k| k.max(key)));
            }
            Event::NoteOff { velocity: 0, .. } if message.delta > 0 => {
                min_gap_ticks = Some(min_gap_ticks.map_or(message.delta, |g| g.min(message.delta)));
            }
            _ => {}
        }
    }

    let tempo = latest_tempo.unwrap_or(DEFAULT_TEMPO);
    if tempo == 0 {
        return Err(FeatureError::malformed_timing("tempo is zero"));
    }
    let min_gap_secs = min_gap_ticks.map(|ticks| ticks_to_seconds(ticks as u64, resolved, ticks_per_beat));
    let min_gap_beats = min_gap_ticks.map(|ticks| ticks as f64 / ticks_per_beat as f64);

    Ok(Analysis {
        tempo,
        min_gap_secs,
        min_gap_beats,
        min_figure: min_gap_beats.and_then(Figure::from_quantum),
        lowest: lowest.map(NoteBound::new),
        highest: highest.map(NoteBound::new),
        histogram,
    })
}
