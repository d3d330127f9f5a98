//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Probe media files and run ffmpeg conversions.
#[derive(Parser)]
#[command(name = "mediaflow")]
#[command(version)]
pub struct Cli {
    /// Configuration file. Defaults apply when the file does not exist.
    #[arg(long, env = "MEDIAFLOW_CONFIG", default_value = "mediaflow.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Describe a media file with ffprobe
    Probe {
        input: String,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Re-encode or remux every stream of a file
    Convert {
        input: String,
        output: PathBuf,

        /// Video codec, e.g. libx264 or copy
        #[arg(long)]
        video_codec: Option<String>,

        /// Audio codec, e.g. aac or copy
        #[arg(long)]
        audio_codec: Option<String>,

        /// Replace the output if it exists
        #[arg(long, short = 'y')]
        overwrite: bool,

        /// Print the compiled arguments without running ffmpeg
        #[arg(long)]
        dry_run: bool,
    },

    /// Run ffmpeg with raw arguments under supervision
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        arguments: Vec<String>,
    },
}
