//! Batch feature extraction for MIDI melodies and hummed recordings
//!
//! The per-file work lives in the workspace crates: `midi_features` for
//! the MIDI side and `hum_audio` for the signal side. This crate walks
//! folders, attaches the metadata carried by file names, and writes the
//! resulting tables.

pub mod audio_batch;
pub mod batch;
pub mod config;
pub mod export;
pub mod metadata;
pub mod midi_batch;

pub use batch::{BatchOutcome, FileFailure};
pub use config::{load_config, save_config, validate_config, Config};
pub use metadata::FileInfo;
