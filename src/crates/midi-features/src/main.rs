use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use midi_features::{
    analyze, first_note, lstrip, resolve_tempo, tempo_changes, tempo_to_bpm, trim,
    uses_note_on_release, MidiFile, SequenceEncoder, TimeBase,
};

#[derive(Parser)]
#[command(name = "midi-features")]
#[command(about = "Inspect, encode and trim a single MIDI file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress informational messages (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Absolute,
    Grid,
}

#[derive(Subcommand)]
enum Commands {
    /// Pitch range, shortest figure and note histogram
    Analyze {
        file: PathBuf,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Encode the file as an onset/sustain/rest sequence
    Encode {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value = "grid")]
        time_base: Kind,

        /// Cell length in seconds (absolute time base)
        #[arg(long, default_value = "0.125")]
        cell: f64,

        /// Number of grid cells (grid time base)
        #[arg(short = 'n', long, default_value = "128")]
        windows: usize,

        /// Seconds spanned by the grid (grid time base)
        #[arg(long, default_value = "16.0")]
        total: f64,

        /// Remove the silence before the first note first
        #[arg(long)]
        lstrip: bool,

        /// Print numeric codes instead of the symbol pattern
        #[arg(long)]
        codes: bool,
    },
    /// Tempo, first note and release style
    Inspect { file: PathBuf },
    /// Write a copy cut to a number of seconds
    Trim {
        file: PathBuf,

        /// Maximum duration in seconds
        #[arg(short, long)]
        seconds: f64,

        /// Tempo in microseconds per beat (default: the file's own)
        #[arg(long)]
        tempo: Option<u32>,

        /// Output file path (default: `<midi-name>_trim.mid`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analyze { file, json } => {
            let midi = load(&file)?;
            let analysis = analyze(&midi)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
                return Ok(());
            }

            println!("Tempo: {} ({:.1} BPM)", analysis.tempo, tempo_to_bpm(analysis.tempo));
            match analysis.min_gap_secs {
                Some(gap) => println!(
                    "Shortest gap: {:.4}s ({})",
                    gap,
                    analysis.min_figure.map_or("no figure", |f| f.name())
                ),
                None => println!("Shortest gap: none"),
            }
            if let (Some(low), Some(high)) = (&analysis.lowest, &analysis.highest) {
                println!(
                    "Range: {} ({:.2} Hz) to {} ({:.2} Hz)",
                    low.name, low.frequency, high.name, high.frequency
                );
            } else {
                println!("Range: no notes");
            }
            for (key, count) in analysis.histogram.counts().iter().enumerate() {
                if *count > 0 {
                    println!("  {:>3} {:<4} {}", key, midi_features::note_to_name(key as i32), count);
                }
            }
        }
        Commands::Encode {
            file,
            time_base,
            cell,
            windows,
            total,
            lstrip: strip,
            codes,
        } => {
            let time_base = match time_base {
                Kind::Absolute => TimeBase::absolute(cell),
                Kind::Grid => TimeBase::grid(windows, total),
            };
            let encoder = SequenceEncoder::new(time_base)?;

            let mut midi = load(&file)?;
            if strip {
                midi = lstrip(&midi);
            }
            let sequence = encoder.encode(&midi)?;

            if !sequence.report().is_clean() {
                log::warn!(
                    "{}: {:?}",
                    file.display(),
                    sequence.report()
                );
            }
            if codes {
                let line: Vec<String> = sequence.codes().iter().map(|c| c.to_string()).collect();
                println!("{}", line.join(" "));
            } else {
                println!("{}", sequence.to_pattern());
            }
        }
        Commands::Inspect { file } => {
            let midi = load(&file)?;
            let changes = tempo_changes(&midi);
            println!("Ticks per beat: {}", midi.ticks_per_beat());
            println!("Tracks: {}", midi.tracks().len());
            println!("Notes: {}", midi.note_count());
            println!("Tempo: {}", resolve_tempo(&midi));
            if changes.len() > 1 {
                println!("Tempo changes: {:?} (only the first is used)", changes);
            }
            println!("Note-on releases: {}", uses_note_on_release(&midi));
            match first_note(&midi) {
                Some(note) => println!(
                    "First note: {} velocity {} at tick {} ({:.3}s)",
                    note.key, note.velocity, note.tick, note.seconds
                ),
                None => println!("First note: none"),
            }
        }
        Commands::Trim {
            file,
            seconds,
            tempo,
            output,
        } => {
            let midi = load(&file)?;
            let tempo = tempo.unwrap_or_else(|| resolve_tempo(&midi));
            let trimmed = trim(&midi, tempo, seconds)
                .with_context(|| format!("Failed to trim {}", file.display()))?;

            let output_path = output.unwrap_or_else(|| {
                let stem = file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("output");
                PathBuf::from(format!("{}_trim.mid", stem))
            });
            fs::write(&output_path, trimmed.to_bytes()?)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            log::info!("Output saved to {}", output_path.display());
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<MidiFile> {
    log::debug!("Processing MIDI file: {}", path.display());
    MidiFile::from_file(path).with_context(|| format!("Failed to load {}", path.display()))
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
