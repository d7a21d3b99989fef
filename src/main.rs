use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use hum_audio::HumProcessor;
use tarareo::audio_batch::audio_folder;
use tarareo::config::{load_config, validate_config, Config, TimeBaseKind};
use tarareo::export::{
    write_analysis_csv, write_audio_csv, write_histogram_csv, write_onsets_csv,
    write_sequences_json, write_summary_json, Summary,
};
use tarareo::midi_batch::{report_folder, sequences_folder};

#[derive(Parser)]
#[command(name = "tarareo")]
#[command(about = "Feature tables for MIDI melodies and their hummed imitations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file (default: built-in settings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress informational messages (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TimeBaseArg {
    Absolute,
    Grid,
}

#[derive(Subcommand)]
enum Commands {
    /// Pitch range, shortest figure and note histogram of every MIDI file
    MidiReport {
        dir: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Onset/sustain/rest sequences of every MIDI file
    Sequences {
        dir: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        #[arg(short, long, value_enum)]
        time_base: Option<TimeBaseArg>,

        /// Cell length in seconds (absolute time base)
        #[arg(long)]
        cell: Option<f64>,

        /// Number of grid cells (grid time base)
        #[arg(short = 'n', long)]
        windows: Option<usize>,

        /// Seconds spanned by the grid (grid time base)
        #[arg(long)]
        total: Option<f64>,

        /// Cut every file to this many seconds before encoding
        #[arg(long)]
        trim: Option<f64>,

        /// Keep the silence before the first note
        #[arg(long)]
        no_lstrip: bool,
    },
    /// Trimmed takes, spectrograms and onsets of every recording
    Audio {
        dir: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Seconds kept after silence trimming
        #[arg(long)]
        max_secs: Option<f64>,
    },
    /// Print the effective configuration as JSON
    ShowConfig,
    /// Check a configuration file
    ValidateConfig { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::MidiReport { dir, output } => {
            create_output_dir(&output)?;
            let outcome = report_folder(&dir, &config.midi)?;
            let rows: Vec<_> = outcome.results.into_iter().map(|(_, row)| row).collect();

            let analysis_path = output.join("midi_analysis.csv");
            let notes_path = output.join("midi_notes.csv");
            write_analysis_csv(&analysis_path, &rows)?;
            write_histogram_csv(&notes_path, &rows)?;

            let summary = Summary::new("midi-report", &dir, rows.len(), outcome.failures)
                .output(&analysis_path)
                .output(&notes_path);
            finish(&output, &summary)?;
        }
        Commands::Sequences {
            dir,
            output,
            time_base,
            cell,
            windows,
            total,
            trim,
            no_lstrip,
        } => {
            let midi = &mut config.midi;
            if let Some(kind) = time_base {
                midi.time_base = match kind {
                    TimeBaseArg::Absolute => TimeBaseKind::Absolute,
                    TimeBaseArg::Grid => TimeBaseKind::Grid,
                };
            }
            if let Some(cell) = cell {
                midi.cell_secs = cell;
            }
            if let Some(windows) = windows {
                midi.windows = windows;
            }
            if let Some(total) = total {
                midi.total_secs = total;
            }
            if trim.is_some() {
                midi.trim_secs = trim;
            }
            if no_lstrip {
                midi.lstrip = false;
            }
            validate_config(&config)?;

            create_output_dir(&output)?;
            let outcome = sequences_folder(&dir, &config.midi)?;

            let sequences_path = output.join("sequences.json");
            write_sequences_json(&sequences_path, config.midi.time_base(), &outcome.results)?;

            let summary = Summary::new("sequences", &dir, outcome.processed(), outcome.failures)
                .output(&sequences_path);
            finish(&output, &summary)?;
        }
        Commands::Audio {
            dir,
            output,
            max_secs,
        } => {
            if let Some(secs) = max_secs {
                config.audio.max_secs = secs;
            }
            validate_config(&config)?;

            create_output_dir(&output)?;
            let processor = HumProcessor::new(config.audio.trim, config.audio.onset);
            let outcome = audio_folder(&dir, &processor, &config.audio, &output)?;
            let rows: Vec<_> = outcome.results.into_iter().map(|(_, row)| row).collect();

            let features_path = output.join("audio_features.csv");
            let onsets_path = output.join("onsets.csv");
            write_audio_csv(&features_path, &rows)?;
            write_onsets_csv(&onsets_path, &rows)?;

            let summary = Summary::new("audio", &dir, rows.len(), outcome.failures)
                .output(&features_path)
                .output(&onsets_path)
                .output(&output.join("spectrograms"));
            finish(&output, &summary)?;
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::ValidateConfig { file } => {
            load_config(&file).with_context(|| format!("Invalid config {}", file.display()))?;
            println!("{} is valid", file.display());
        }
    }

    Ok(())
}

fn create_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

fn finish(output: &Path, summary: &Summary) -> Result<()> {
    let summary_path = output.join("summary.json");
    write_summary_json(&summary_path, summary)?;

    if summary.failed.is_empty() {
        log::info!("{} files processed", summary.processed);
    } else {
        log::warn!(
            "{} files processed, {} failed (see {})",
            summary.processed,
            summary.failed.len(),
            summary_path.display()
        );
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
