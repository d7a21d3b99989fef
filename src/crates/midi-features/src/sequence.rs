//! Onset/sustain/rest encoding of a MIDI file on a uniform time grid.
//!
//! A single walk over the file's note events drives both time bases:
//!
//! - [`TimeBase::Absolute`] walks the tracks one after another, each on its
//!   own clock, and measures every note from its own onset. Each release
//!   closes the note with exactly one [`Symbol::Rest`] for the cell in
//!   which it stops, even when the note filled most of that cell.
//! - [`TimeBase::Grid`] merges the tracks into one timeline, splits `T`
//!   seconds into `N` cells and measures the time elapsed since the previous
//!   note event: silence before an onset becomes rests, time before a
//!   release becomes sustains.
//!
//! In both, the onset symbol stands for the first cell of the note, so a
//! release contributes one sustain per *further* whole cell. The output
//! length depends on the data and is generally not `N`.

use serde::{Deserialize, Serialize};
use std::iter;

use crate::clock::TickClock;
use crate::error::{FeatureError, Result};
use crate::midi::{Event, MidiFile};

/// Absorbs representation error when a duration is an exact multiple of a cell.
const CELL_TOLERANCE: f64 = 1e-9;

/// Shortest accepted cell, in seconds
pub const MIN_CELL_SECS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Onset,
    Sustain,
    Rest,
}

impl Symbol {
    pub fn as_char(self) -> char {
        match self {
            Symbol::Onset => 'o',
            Symbol::Sustain => '=',
            Symbol::Rest => '.',
        }
    }
}

/// How the continuous MIDI timeline is cut into cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeBase {
    /// Fixed cell length, notes measured from their own onset
    Absolute { cell_secs: f64 },
    /// `windows` cells spanning `total_secs`, events measured from the previous note event
    Grid { windows: usize, total_secs: f64 },
}

impl TimeBase {
    pub fn absolute(cell_secs: f64) -> Self {
        TimeBase::Absolute { cell_secs }
    }

    pub fn grid(windows: usize, total_secs: f64) -> Self {
        TimeBase::Grid {
            windows,
            total_secs,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            TimeBase::Absolute { cell_secs } => {
                if !cell_secs.is_finite() || cell_secs < MIN_CELL_SECS {
                    return Err(FeatureError::invalid_grid(format!(
                        "cell length must be at least {}s, got {}",
                        MIN_CELL_SECS, cell_secs
                    )));
                }
            }
            TimeBase::Grid {
                windows,
                total_secs,
            } => {
                if windows == 0 {
                    return Err(FeatureError::invalid_grid("window count is zero"));
                }
                if !total_secs.is_finite() || total_secs <= 0.0 {
                    return Err(FeatureError::invalid_grid(format!(
                        "total duration must be positive, got {}",
                        total_secs
                    )));
                }
                if total_secs / (windows as f64) < MIN_CELL_SECS {
                    return Err(FeatureError::invalid_grid(format!(
                        "{} cells over {}s are shorter than {}s",
                        windows, total_secs, MIN_CELL_SECS
                    )));
                }
            }
        }
        Ok(())
    }

    /// The `N + 1` uniformly spaced cell boundaries of a grid, in seconds.
    pub fn grid_boundaries(&self) -> Option<Vec<f64>> {
        match *self {
            TimeBase::Grid {
                windows,
                total_secs,
            } => Some(
                (0..=windows)
                    .map(|i| total_secs * i as f64 / windows as f64)
                    .collect(),
            ),
            TimeBase::Absolute { .. } => None,
        }
    }

    /// Length of one cell in seconds
    pub fn cell_secs(&self) -> f64 {
        match *self {
            TimeBase::Absolute { cell_secs } => cell_secs,
            TimeBase::Grid { windows, total_secs } => total_secs / windows as f64,
        }
    }

    /// Numeric code of a symbol.
    ///
    /// Absolute: onset 0, sustain 1, rest 2. Grid: rest 0, onset 1, sustain 2.
    pub fn code(&self, symbol: Symbol) -> u8 {
        match (self, symbol) {
            (TimeBase::Absolute { .. }, Symbol::Onset) => 0,
            (TimeBase::Absolute { .. }, Symbol::Sustain) => 1,
            (TimeBase::Absolute { .. }, Symbol::Rest) => 2,
            (TimeBase::Grid { .. }, Symbol::Rest) => 0,
            (TimeBase::Grid { .. }, Symbol::Onset) => 1,
            (TimeBase::Grid { .. }, Symbol::Sustain) => 2,
        }
    }
}

/// Anomalies met while encoding. None of them stops the encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncodeReport {
    /// Notes still sounding when the stream ended, by note number
    pub unterminated: Vec<u8>,
    /// Releases for notes that were not sounding
    pub orphan_releases: usize,
    /// Note-ons for notes that were already sounding
    pub retriggered: usize,
}

impl EncodeReport {
    pub fn is_clean(&self) -> bool {
        self.unterminated.is_empty() && self.orphan_releases == 0 && self.retriggered == 0
    }
}

/// Encoded symbols of one file
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    symbols: Vec<Symbol>,
    time_base: TimeBase,
    report: EncodeReport,
}

impl Sequence {
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    pub fn report(&self) -> &EncodeReport {
        &self.report
    }

    /// Numeric codes for the time base this sequence was encoded with
    pub fn codes(&self) -> Vec<u8> {
        self.symbols.iter().map(|&s| self.time_base.code(s)).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn to_pattern(&self) -> String {
        self.symbols.iter().map(|s| s.as_char()).collect()
    }
}

/// Sounding notes indexed by note number, with a validity bitmap.
struct ActiveNotes {
    starts: [f64; 128],
    live: u128,
}

impl ActiveNotes {
    fn new() -> Self {
        ActiveNotes {
            starts: [0.0; 128],
            live: 0,
        }
    }

    /// Marks `key` as sounding from `time`. Returns true if it already was.
    fn start(&mut self, key: u8, time: f64) -> bool {
        let idx = (key & 0x7F) as usize;
        let was_live = self.live & (1u128 << idx) != 0;
        self.starts[idx] = time;
        self.live |= 1u128 << idx;
        was_live
    }

    fn finish(&mut self, key: u8) -> Option<f64> {
        let idx = (key & 0x7F) as usize;
        if self.live & (1u128 << idx) == 0 {
            return None;
        }
        self.live &= !(1u128 << idx);
        Some(self.starts[idx])
    }

    fn remaining(&self) -> Vec<u8> {
        (0..128u8)
            .filter(|&key| self.live & (1u128 << key) != 0)
            .collect()
    }
}

/// Whole cells of length `cell` contained in `span`.
fn whole_cells(span: f64, cell: f64) -> usize {
    if span <= 0.0 {
        return 0;
    }
    (span / cell + CELL_TOLERANCE).floor() as usize
}

pub struct SequenceEncoder {
    time_base: TimeBase,
}

impl SequenceEncoder {
    pub fn new(time_base: TimeBase) -> Result<Self> {
        time_base.validate()?;
        Ok(SequenceEncoder { time_base })
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Encode a file at its governing tempo.
    pub fn encode(&self, midi: &MidiFile) -> Result<Sequence> {
        let clock = TickClock::for_file(midi)?;
        Ok(self.encode_with_clock(midi, &clock))
    }

    pub fn encode_with_clock(&self, midi: &MidiFile, clock: &TickClock) -> Sequence {
        let cell = self.time_base.cell_secs() * 1_000_000.0;
        let is_grid = matches!(self.time_base, TimeBase::Grid { .. });

        let mut active = ActiveNotes::new();
        let mut report = EncodeReport::default();
        let mut symbols = Vec::new();
        let mut last_note_time = 0.0;

        for (time, event) in self.timeline(midi, clock) {
            match event {
                Event::NoteOn { key, .. } => {
                    if active.start(key, time) {
                        report.retriggered += 1;
                    }
                    if is_grid {
                        let rests = whole_cells(time - last_note_time, cell);
                        symbols.extend(iter::repeat(Symbol::Rest).take(rests));
                    }
                    symbols.push(Symbol::Onset);
                    last_note_time = time;
                }
                Event::NoteOff { key, .. } => {
                    let previous = last_note_time;
                    last_note_time = time;

                    let Some(start) = active.finish(key) else {
                        report.orphan_releases += 1;
                        continue;
                    };
                    let held = if is_grid { time - previous } else { time - start };
                    let sustains = whole_cells(held, cell).saturating_sub(1);
                    symbols.extend(iter::repeat(Symbol::Sustain).take(sustains));
                    if !is_grid {
                        symbols.push(Symbol::Rest);
                    }
                }
                _ => {}
            }
        }

        report.unterminated = active.remaining();
        log::debug!(
            "encoded {} symbols, {} unterminated, {} orphan releases, {} retriggers",
            symbols.len(),
            report.unterminated.len(),
            report.orphan_releases,
            report.retriggered
        );

        Sequence {
            symbols,
            time_base: self.time_base,
            report,
        }
    }

    /// Events with their time in microseconds, in walking order.
    fn timeline(&self, midi: &MidiFile, clock: &TickClock) -> Vec<(f64, Event)> {
        match self.time_base {
            TimeBase::Absolute { .. } => midi
                .tracks()
                .iter()
                .flat_map(|track| {
                    let mut tick = 0u64;
                    track.iter().map(move |message| {
                        tick += message.delta as u64;
                        (clock.ticks_to_microseconds(tick), message.event)
                    })
                })
                .collect(),
            TimeBase::Grid { .. } => midi
                .merged()
                .into_iter()
                .map(|e| (clock.ticks_to_microseconds(e.tick), e.event))
                .collect(),
        }
    }
}

/// Encode `midi` with a fresh encoder for `time_base`.
pub fn encode(midi: &MidiFile, time_base: TimeBase) -> Result<Sequence> {
    SequenceEncoder::new(time_base)?.encode(midi)
}
