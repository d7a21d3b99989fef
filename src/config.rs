//! Configuration for the batch commands

use hum_audio::{OnsetParams, TrimParams};
use midi_features::TimeBase;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub midi: MidiConfig,
    pub audio: AudioConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            midi: MidiConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBaseKind {
    Absolute,
    Grid,
}

/// MIDI encoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub time_base: TimeBaseKind,
    /// Cell length for the absolute time base, in seconds
    pub cell_secs: f64,
    /// Grid cells for the grid time base
    pub windows: usize,
    /// Seconds spanned by the grid
    pub total_secs: f64,
    /// Drop the silence before the first note before encoding
    pub lstrip: bool,
    /// Cut files to this many seconds before encoding
    pub trim_secs: Option<f64>,
    pub extensions: Vec<String>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            time_base: TimeBaseKind::Grid,
            cell_secs: 0.125,
            windows: 128,
            total_secs: 16.0,
            lstrip: true,
            trim_secs: None,
            extensions: vec!["mid".to_string(), "midi".to_string()],
        }
    }
}

impl MidiConfig {
    pub fn time_base(&self) -> TimeBase {
        match self.time_base {
            TimeBaseKind::Absolute => TimeBase::absolute(self.cell_secs),
            TimeBaseKind::Grid => TimeBase::grid(self.windows, self.total_secs),
        }
    }
}

/// Audio processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Duration kept after silence trimming, in seconds
    pub max_secs: f64,
    /// Window length for framing and the spectrogram, in seconds
    pub frame_secs: f64,
    /// Frequency band kept in the spectrogram [min, max] in Hz
    pub freq_range: [f32; 2],
    /// Write trimmed takes as WAV files
    pub write_trimmed: bool,
    pub trim: TrimParams,
    pub onset: OnsetParams,
    pub extensions: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_secs: 16.0,
            frame_secs: 0.125,
            freq_range: [80.0, 1000.0],
            write_trimmed: true,
            trim: TrimParams::default(),
            onset: OnsetParams::default(),
            extensions: ["wav", "mp3", "ogg", "flac"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    config
        .midi
        .time_base()
        .validate()
        .map_err(|e| anyhow::anyhow!("midi: {}", e))?;

    if let Some(secs) = config.midi.trim_secs {
        if !secs.is_finite() || secs < 0.0 {
            anyhow::bail!("midi.trim_secs must be a non-negative number, got {}", secs);
        }
    }
    if config.midi.extensions.is_empty() {
        anyhow::bail!("midi.extensions is empty");
    }

    let audio = &config.audio;
    if !(audio.max_secs > 0.0) {
        anyhow::bail!("audio.max_secs must be positive");
    }
    if !(audio.frame_secs > 0.0) {
        anyhow::bail!("audio.frame_secs must be positive");
    }
    if !(audio.freq_range[0] >= 0.0 && audio.freq_range[0] <= audio.freq_range[1]) {
        anyhow::bail!("audio.freq_range min must be <= max");
    }
    if !(audio.trim.top_db > 0.0) || audio.trim.frame_length == 0 || audio.trim.hop_length == 0 {
        anyhow::bail!("audio.trim needs a positive top_db, frame_length and hop_length");
    }
    if audio.onset.n_fft == 0 || audio.onset.hop_length == 0 {
        anyhow::bail!("audio.onset n_fft and hop_length must be positive");
    }
    if audio.extensions.is_empty() {
        anyhow::bail!("audio.extensions is empty");
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
