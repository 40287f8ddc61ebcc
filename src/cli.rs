use std::num::NonZeroUsize;
use std::path::PathBuf;

use artvault::classify::FilterMode;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "artvault")]
#[command(about = "artvault CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Archive generated images for a range of days
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// First day to archive (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day to archive, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Which jobs to admit into the archives
    #[arg(long, value_enum)]
    pub mode: FilterMode,

    /// Start a fresh archive after this many images (default: one per day)
    #[arg(long)]
    pub batch_size: Option<NonZeroUsize>,

    /// Record job metadata without downloading any images
    #[arg(long)]
    pub metadata_only: bool,

    /// Directory archives are written to (overrides configuration)
    #[arg(long)]
    pub output: Option<PathBuf>,
}
