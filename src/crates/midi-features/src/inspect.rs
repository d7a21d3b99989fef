use serde::Serialize;

use crate::clock::ticks_to_seconds;
use crate::midi::{Event, MidiFile};
use crate::tempo::DEFAULT_TEMPO;

/// True if some track releases notes with a velocity-0 note-on right after
/// the note-on it ends, instead of a note-off message.
pub fn uses_note_on_release(midi: &MidiFile) -> bool {
    midi.tracks().iter().any(|track| {
        track.windows(2).any(|pair| {
            matches!(pair[0].event, Event::NoteOn { .. })
                && matches!(
                    pair[1].event,
                    Event::NoteOff {
                        from_note_on: true,
                        ..
                    }
                )
        })
    })
}

/// The first sounding note of a file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FirstNote {
    pub key: u8,
    pub velocity: u8,
    pub channel: u8,
    /// Absolute tick of the note-on
    pub tick: u64,
    pub seconds: f64,
    /// Tempo in force when the note starts
    pub tempo: u32,
}

/// First sounding note in time order across all tracks.
pub fn first_note(midi: &MidiFile) -> Option<FirstNote> {
    let mut tempo = DEFAULT_TEMPO;
    for timed in midi.merged() {
        match timed.event {
            Event::Tempo(t) => tempo = t,
            Event::NoteOn {
                channel,
                key,
                velocity,
            } => {
                return Some(FirstNote {
                    key,
                    velocity,
                    channel,
                    tick: timed.tick,
                    seconds: ticks_to_seconds(timed.tick, tempo, midi.ticks_per_beat()),
                    tempo,
                });
            }
            _ => {}
        }
    }
    None
}
