//! CLI module for filecabinet
//!
//! Provides:
//! - run: open the configured store and start the interactive shell
//! - generate: write random records to a CSV or XML file

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, FormatArg, GenerateArgs, RunArgs};
pub use commands::Shell;
pub use config::{Config, StorageKind};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::Console;

use std::fs::{File, OpenOptions};
use std::io::BufWriter;

use crate::generator::RecordGenerator;
use crate::observability::{Logger, LoggingStore, ObservationScope, TimingStore};
use crate::snapshot::SnapshotFormat;
use crate::storage::{FileStore, MemoryStore, RecordStore};

/// Parse the command line and run the selected command.
pub fn run() -> CliResult<()> {
    match Cli::parse_args().command {
        Command::Run(args) => run_shell(&args),
        Command::Generate(args) => generate(&args),
    }
}

/// Open the store described by `args` and serve stdin until exit.
pub fn run_shell(args: &RunArgs) -> CliResult<()> {
    let config = Config::resolve(args)?;
    Logger::set_min_severity(config.log_severity()?);

    let validator = config.validator()?;
    let options = config.store_options()?;

    let mut store: Box<dyn RecordStore> = match config.storage {
        StorageKind::Memory => Box::new(MemoryStore::new(options)),
        StorageKind::File => Box::new(FileStore::open(&config.data_file, options)?),
    };

    let mut timings = None;
    if config.use_stopwatch {
        let timed = TimingStore::new(store);
        timings = Some(timed.timings());
        store = Box::new(timed);
    }

    if config.use_logger {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .map_err(|e| {
                CliError::io_error(format!(
                    "Failed to open log file {}: {}",
                    config.log_file.display(),
                    e
                ))
            })?;
        store = Box::new(LoggingStore::new(store, log_file));
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock());
    console.write_line(format!(
        "Using {} validation rules, {} storage.",
        config.rules_name(),
        match config.storage {
            StorageKind::Memory => "memory",
            StorageKind::File => "file",
        }
    ))?;
    console.write_line("Enter your command, or enter 'help' to get help.")?;

    let mut shell = Shell::new(store, validator, config.storage, console);
    if let Some(timings) = timings {
        shell = shell.with_timings(timings);
    }
    shell.run()?;
    Ok(())
}

/// Write `records_amount` random records starting at `start_id`.
pub fn generate(args: &GenerateArgs) -> CliResult<()> {
    let format = SnapshotFormat::from(args.output_type);
    let amount = args.records_amount.to_string();
    let scope = ObservationScope::with_fields(
        "GENERATE",
        &[("format", format.as_str()), ("amount", amount.as_str())],
    );

    let snapshot = RecordGenerator::new()
        .generate(args.start_id, args.records_amount)
        .ok_or_else(|| {
            CliError::generate_failed(format!(
                "start id {} with {} records is not a valid id range",
                args.start_id, args.records_amount
            ))
        })?;

    let file = File::create(&args.output).map_err(|e| {
        CliError::generate_failed(format!(
            "Failed to create {}: {}",
            args.output.display(),
            e
        ))
    })?;
    snapshot.export(format, BufWriter::new(file))?;

    scope.complete();
    println!(
        "{} records were written to {}.",
        args.records_amount,
        args.output.display()
    );
    Ok(())
}
