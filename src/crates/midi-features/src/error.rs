use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors raised while loading, converting or editing a MIDI file.
///
/// Every variant is fatal for the file being processed. Non-fatal
/// conditions (unterminated notes, unmapped rhythmic figures, missing
/// tempo) are reported through return values instead.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse MIDI data: {0}")]
    Parse(String),

    #[error("Failed to write MIDI data: {0}")]
    Write(String),

    #[error("Unsupported timing: {0}")]
    UnsupportedTiming(String),

    #[error("Malformed timing: {0}")]
    MalformedTiming(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Track {track} is empty")]
    EmptyTrack { track: usize },

    #[error("Track {track} has no messages within {max_ticks} ticks")]
    NothingCopied { track: usize, max_ticks: u64 },
}

impl FeatureError {
    pub fn malformed_timing(message: impl Into<String>) -> Self {
        FeatureError::MalformedTiming(message.into())
    }

    pub fn invalid_grid(message: impl Into<String>) -> Self {
        FeatureError::InvalidGrid(message.into())
    }
}
