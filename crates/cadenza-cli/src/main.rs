//! cadenza: command-line front end for the composition engine

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadenza", about = "Procedural chords, melodies, basslines and quantization")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every generator. Unset values come from the config file.
#[derive(Args, Debug, Clone, Default)]
struct GenerateArgs {
    /// Tonic, e.g. C, F# or Bb
    #[arg(long)]
    key: Option<String>,

    /// Scale name, e.g. major, dorian, minor-pentatonic
    #[arg(long)]
    scale: Option<String>,

    /// Genre used to bias chord choice and melody style
    #[arg(long)]
    genre: Option<String>,

    /// Start from a style preset's seed progression instead of generating one
    #[arg(long)]
    style: Option<String>,

    /// Number of chords to generate
    #[arg(long)]
    chords: Option<usize>,

    #[arg(long)]
    bars: Option<u32>,

    /// Tempo in BPM
    #[arg(long)]
    tempo: Option<f64>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Timing and velocity jitter (0-1) applied to the result
    #[arg(long)]
    humanize: Option<f32>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a chord progression
    Progression {
        #[command(flatten)]
        gen_args: GenerateArgs,
    },

    /// Generate a melody over a progression
    Melody {
        #[command(flatten)]
        gen_args: GenerateArgs,

        /// Ascending, descending, arch, valley, zigzag, stepwise, leap-friendly, random
        #[arg(long)]
        contour: Option<String>,

        #[arg(long)]
        rhythm: Option<String>,
    },

    /// Generate a bassline over a progression
    Bass {
        #[command(flatten)]
        gen_args: GenerateArgs,

        /// root-only, root-fifth, root-octave, chord-tones
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        rhythm: Option<String>,
    },

    /// Generate an arpeggio over a progression
    Arp {
        #[command(flatten)]
        gen_args: GenerateArgs,

        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        rhythm: Option<String>,

        /// Octaves the arpeggio spans (1-4)
        #[arg(long)]
        octaves: Option<u8>,

        /// Fraction of each step the note holds (0.1-1.0)
        #[arg(long)]
        gate: Option<f64>,
    },

    /// Quantize JSON notes (timed in beats) read from a file or stdin
    Quantize {
        /// Input file, `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Named preset: tight-16th, soft-8th, swing-16th, triplet, humanize, drum-tight
        #[arg(long)]
        preset: Option<String>,

        /// Grid, e.g. 1/16, 1/8T, 1/4.
        #[arg(long)]
        grid: Option<String>,

        /// start, end, start-and-end, length, start-and-length
        #[arg(long)]
        mode: Option<String>,

        /// Percent (0-100)
        #[arg(long)]
        strength: Option<f32>,

        /// Percent (25-75, 50 is straight)
        #[arg(long)]
        swing: Option<f32>,

        /// Built-in groove template name
        #[arg(long)]
        groove: Option<String>,

        /// Input is timed in seconds at this tempo
        #[arg(long)]
        seconds_at: Option<f64>,
    },

    /// Detect the key of a set of MIDI pitches
    DetectKey {
        #[arg(required = true)]
        pitches: Vec<u8>,
    },

    /// List the built-in groove templates
    Grooves,

    /// List style presets
    Styles {
        #[arg(long)]
        genre: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("cadenza=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Command::Progression { gen_args } => commands::progression(&config, &gen_args)?,
        Command::Melody { gen_args, contour, rhythm } => {
            commands::melody(&config, &gen_args, contour.as_deref(), rhythm.as_deref())?
        }
        Command::Bass { gen_args, pattern, rhythm } => {
            commands::bass(&config, &gen_args, pattern.as_deref(), rhythm.as_deref())?
        }
        Command::Arp { gen_args, pattern, rhythm, octaves, gate } => commands::arp(
            &config,
            &gen_args,
            commands::ArpOptions { pattern, rhythm, octaves, gate },
        )?,
        Command::Quantize { input, preset, grid, mode, strength, swing, groove, seconds_at } => commands::quantize(
            &config,
            &input,
            commands::QuantizeOptions { preset, grid, mode, strength, swing, groove, seconds_at },
        )?,
        Command::DetectKey { pitches } => commands::detect_key(&pitches)?,
        Command::Grooves => commands::grooves()?,
        Command::Styles { genre } => commands::styles(&config, genre.as_deref())?,
    };

    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generator_flags() {
        let cli = Cli::try_parse_from([
            "cadenza", "melody", "--key", "A", "--scale", "minor", "--bars", "8", "--seed", "3", "--contour", "arch",
        ])
        .unwrap();
        match cli.command {
            Command::Melody { gen_args, contour, .. } => {
                assert_eq!(gen_args.key.as_deref(), Some("A"));
                assert_eq!(gen_args.bars, Some(8));
                assert_eq!(gen_args.seed, Some(3));
                assert_eq!(contour.as_deref(), Some("arch"));
            }
            _ => panic!("expected melody"),
        }
    }

    #[test]
    fn test_parse_quantize_defaults_to_stdin() {
        let cli = Cli::try_parse_from(["cadenza", "quantize", "--grid", "1/8T"]).unwrap();
        match cli.command {
            Command::Quantize { input, grid, .. } => {
                assert_eq!(input, PathBuf::from("-"));
                assert_eq!(grid.as_deref(), Some("1/8T"));
            }
            _ => panic!("expected quantize"),
        }
    }

    #[test]
    fn test_detect_key_requires_pitches() {
        assert!(Cli::try_parse_from(["cadenza", "detect-key"]).is_err());
        assert!(Cli::try_parse_from(["cadenza", "detect-key", "60", "64", "67"]).is_ok());
    }
}
