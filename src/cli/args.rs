//! CLI argument definitions using clap
//!
//! Commands:
//! - filecabinet run [--config <path>] [-s memory|file] [-v default|custom] ...
//! - filecabinet generate -t csv|xml -o <file> -a <amount> -i <start-id>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::config::StorageKind;
use crate::snapshot::SnapshotFormat;

/// FileCabinet - a record cabinet with memory and file storage
#[derive(Parser, Debug)]
#[command(name = "filecabinet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the interactive shell
    Run(RunArgs),

    /// Write randomly generated records to a CSV or XML file
    Generate(GenerateArgs),
}

/// Flags for `run`. Every flag overrides the configuration file.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Storage engine
    #[arg(short = 's', long, value_enum)]
    pub storage: Option<StorageKind>,

    /// Validation preset: default or custom
    #[arg(short = 'v', long = "validation-rules")]
    pub validation_rules: Option<String>,

    /// Data file used by file storage
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Measure and report the duration of every store call
    #[arg(long)]
    pub use_stopwatch: bool,

    /// Log every store call to the log file
    #[arg(long)]
    pub use_logger: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Output format
    #[arg(short = 't', long, value_enum)]
    pub output_type: FormatArg,

    /// Output file
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Number of records to generate
    #[arg(short = 'a', long)]
    pub records_amount: u32,

    /// Id of the first generated record
    #[arg(short = 'i', long, default_value_t = 1)]
    pub start_id: u32,
}

/// Export format as accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Csv,
    Xml,
}

impl From<FormatArg> for SnapshotFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => SnapshotFormat::Csv,
            FormatArg::Xml => SnapshotFormat::Xml,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
