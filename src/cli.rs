//! Command-line surface for `plotmerge`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "plotmerge", version, about = "Pen-plotter G-code post-processor", long_about = None)]
pub struct Cli {
    /// Settings file (.json or .toml); the platform default is used when absent
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge the writing and drawing programs
    Post(PostArgs),
    /// Settings file management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Writing program
    #[arg(long)]
    pub writing: Option<PathBuf>,
    /// Drawing program
    #[arg(long)]
    pub drawing: Option<PathBuf>,
    /// Merged output
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Travel height
    #[arg(long, allow_negative_numbers = true)]
    pub pen_up: Option<f64>,
    /// Contact height
    #[arg(long, allow_negative_numbers = true)]
    pub pen_down: Option<f64>,
    /// Feed rate inserted when a job sets none
    #[arg(long)]
    pub feedrate: Option<f64>,
    /// Writing ink mode (off, marker, stroke)
    #[arg(long)]
    pub writing_mode: Option<String>,
    /// Strokes between writing re-inks
    #[arg(long)]
    pub writing_interval: Option<u32>,
    /// Drawing ink mode (off, marker, stroke)
    #[arg(long)]
    pub drawing_mode: Option<String>,
    /// Strokes between drawing re-inks
    #[arg(long)]
    pub drawing_interval: Option<u32>,
    /// Marker token
    #[arg(long)]
    pub marker: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigCmd,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Write the default settings unless the file exists
    Init,
    /// Print the resolved settings as JSON
    Show,
    /// Print the settings file location
    Path,
}
