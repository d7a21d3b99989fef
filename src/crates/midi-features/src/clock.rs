use crate::error::{FeatureError, Result};
use crate::midi::MidiFile;
use crate::tempo::resolve_tempo;

/// Microseconds spanned by `ticks` at the given tempo and resolution.
///
/// `ticks_per_beat` must be non-zero; [`TickClock`] checks this for you.
pub fn ticks_to_microseconds(ticks: u64, tempo: u32, ticks_per_beat: u16) -> f64 {
    ticks as f64 * tempo as f64 / ticks_per_beat as f64
}

pub fn ticks_to_seconds(ticks: u64, tempo: u32, ticks_per_beat: u16) -> f64 {
    ticks_to_microseconds(ticks, tempo, ticks_per_beat) / 1_000_000.0
}

/// Converts between MIDI ticks and wall-clock time for a single tempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    ticks_per_beat: u16,
    tempo: u32,
}

impl TickClock {
    pub fn new(ticks_per_beat: u16, tempo: u32) -> Result<Self> {
        if ticks_per_beat == 0 {
            return Err(FeatureError::malformed_timing("ticks_per_beat is zero"));
        }
        if tempo == 0 {
            return Err(FeatureError::malformed_timing("tempo is zero"));
        }
        Ok(TickClock {
            ticks_per_beat,
            tempo,
        })
    }

    /// Clock for a file at its governing tempo
    pub fn for_file(midi: &MidiFile) -> Result<Self> {
        Self::new(midi.ticks_per_beat(), resolve_tempo(midi))
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn ticks_to_microseconds(&self, ticks: u64) -> f64 {
        ticks_to_microseconds(ticks, self.tempo, self.ticks_per_beat)
    }

    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks_to_seconds(ticks, self.tempo, self.ticks_per_beat)
    }

    /// Duration of one beat (quarter note) in seconds
    pub fn seconds_per_beat(&self) -> f64 {
        self.tempo as f64 / 1_000_000.0
    }

    /// Ticks elapsed in `seconds`, rounded down
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        let ticks_per_second = self.ticks_per_beat as f64 * 1_000_000.0 / self.tempo as f64;
        (seconds * ticks_per_second).max(0.0).floor() as u64
    }
}
