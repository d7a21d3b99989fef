//! MIDI melody features
//!
//! This crate turns MIDI files into the features used to compare them with
//! hummed imitations: a discrete onset/sustain/rest sequence on a uniform
//! time grid, the pitch range and rhythmic granularity of the melody, and
//! trimmed copies of the file.
//!
//! # Examples
//!
//! ```
//! use midi_features::{encode, Event, Message, MidiFile, Symbol, TimeBase};
//!
//! let midi = MidiFile::new(
//!     480,
//!     vec![vec![
//!         Message::new(0, Event::note_on(60, 100)),
//!         Message::new(720, Event::note_off(60)),
//!     ]],
//! )
//! .unwrap();
//!
//! let seq = encode(&midi, TimeBase::absolute(0.25)).unwrap();
//! assert_eq!(
//!     seq.symbols(),
//!     &[Symbol::Onset, Symbol::Sustain, Symbol::Sustain, Symbol::Rest]
//! );
//! ```
//!
//! # Main Functions
//!
//! - [`encode`]: MIDI file to symbol sequence
//! - [`analyze`]: pitch range, note histogram and shortest figure
//! - [`lstrip`] / [`trim`]: leading-silence removal and duration cut
//! - [`resolve_tempo`]: governing tempo of a file

pub mod analysis;
pub mod clock;
pub mod edit;
pub mod error;
pub mod inspect;
pub mod midi;
pub mod note;
pub mod sequence;
pub mod tempo;


pub use analysis::{analyze, Analysis, Figure, NoteBound, NoteHistogram};
pub use clock::{ticks_to_microseconds, ticks_to_seconds, TickClock};
pub use edit::{lstrip, trim};
pub use error::{FeatureError, Result};
pub use inspect::{first_note, uses_note_on_release, FirstNote};
pub use midi::{Event, Message, MidiFile, TimedEvent, Track};
pub use note::{note_to_frequency, note_to_name};
pub use sequence::{
    encode, EncodeReport, Sequence, SequenceEncoder, Symbol, TimeBase, MIN_CELL_SECS,
};
pub use tempo::{resolve_tempo, tempo_changes, tempo_to_bpm, DEFAULT_TEMPO};
