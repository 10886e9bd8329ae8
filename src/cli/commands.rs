//! Interactive shell
//!
//! The shell owns one store for its whole lifetime and dispatches one
//! command per input line. Store rejections are printed and the shell keeps
//! going; console I/O failures and fatal storage errors end it.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use super::config::StorageKind;
use super::errors::{CliError, CliResult};
use super::io::Console;
use crate::observability::{ObservationScope, OperationTimings};
use crate::record::{self, Record, RecordId};
use crate::snapshot::{Snapshot, SnapshotFormat};
use crate::storage::{RecordStore, StorageError, StorageResult};
use crate::validation::RecordValidator;

/// (command, summary, explanation)
const HELP: &[(&str, &str, &str)] = &[
    ("help", "prints the help screen", "The 'help' command prints the help screen."),
    ("exit", "exits the application", "The 'exit' command exits the application."),
    (
        "stat",
        "displays statistics on records",
        "The 'stat' command displays statistics on records.",
    ),
    ("create", "creates a record", "The 'create' command creates a record."),
    ("edit", "edits a record", "The 'edit <id>' command edits a record."),
    ("remove", "removes a record", "The 'remove <id>' command removes a record."),
    ("list", "prints all records", "The 'list' command prints all records ordered by id."),
    (
        "find",
        "finds records",
        "The 'find firstname|lastname|dateofbirth <value>' command finds records.",
    ),
    (
        "export",
        "exports records in the given format",
        "The 'export csv|xml <file>' command exports records in the given format.",
    ),
    (
        "import",
        "imports records in the given format, overwriting records with the same id",
        "The 'import csv|xml <file>' command imports records in the given format.",
    ),
    ("purge", "defragments the data file", "The 'purge' command defragments the data file."),
];

pub struct Shell<R, W> {
    store: Box<dyn RecordStore>,
    validator: RecordValidator,
    kind: StorageKind,
    console: Console<R, W>,
    timings: Option<Arc<OperationTimings>>,
    running: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(
        store: Box<dyn RecordStore>,
        validator: RecordValidator,
        kind: StorageKind,
        console: Console<R, W>,
    ) -> Self {
        Self {
            store,
            validator,
            kind,
            console,
            timings: None,
            running: true,
        }
    }

    /// Report these timings when the shell exits.
    pub fn with_timings(mut self, timings: Arc<OperationTimings>) -> Self {
        self.timings = Some(timings);
        self
    }

    /// Read and execute commands until `exit` or end of input, then close
    /// the store.
    pub fn run(mut self) -> CliResult<Console<R, W>> {
        let outcome = self.serve();
        let closed = self.store.close();
        outcome?;
        closed?;

        if let Some(timings) = &self.timings {
            self.console.write_line("Store call timings:")?;
            for t in timings.snapshot() {
                self.console.write_line(format!(
                    "\t{}\t{} call(s), {} error(s), {} us total, {} us average",
                    t.method,
                    t.calls,
                    t.errors,
                    t.total_micros,
                    t.average_micros()
                ))?;
            }
        }

        Ok(self.console)
    }

    fn serve(&mut self) -> CliResult<()> {
        while self.running {
            let Some(line) = self.console.prompt("> ")? else {
                break;
            };
            self.execute(&line)?;
        }
        Ok(())
    }

    /// Execute one command line.
    pub fn execute(&mut self, line: &str) -> CliResult<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let (command, params) = match line.split_once(' ') {
            Some((command, params)) => (command, params.trim()),
            None => (line, ""),
        };

        match command.to_ascii_lowercase().as_str() {
            "help" => self.help(params),
            "exit" => {
                self.console.write_line("Exiting an application...")?;
                self.running = false;
                Ok(())
            }
            "stat" => self.stat(),
            "create" => self.create(),
            "edit" => self.edit(params),
            "remove" => self.remove(params),
            "list" => self.list(),
            "find" => self.find(params),
            "export" => self.export(params),
            "import" => self.import(params),
            "purge" => self.purge(),
            _ => self
                .console
                .write_line(format!("There is no '{}' command.", command)),
        }
    }

    /// Unwrap a store result, printing rejections and stopping on fatal
    /// errors.
    fn checked<T>(&mut self, result: StorageResult<T>) -> CliResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_fatal() => Err(CliError::from(e)),
            Err(e) => {
                self.report(&e)?;
                Ok(None)
            }
        }
    }

    fn report(&mut self, err: &StorageError) -> CliResult<()> {
        match err.field() {
            Some(field) => self
                .console
                .write_line(format!("Record rejected, {}: {}", field, err)),
            None => self.console.write_line(err.to_string()),
        }
    }

    fn help(&mut self, topic: &str) -> CliResult<()> {
        if topic.is_empty() {
            self.console.write_line("Available commands:")?;
            for (command, summary, _) in HELP {
                self.console
                    .write_line(format!("\t{}\t- {}", command, summary))?;
            }
            return Ok(());
        }

        match HELP.iter().find(|(c, _, _)| c.eq_ignore_ascii_case(topic)) {
            Some((_, _, explanation)) => self.console.write_line(*explanation),
            None => self
                .console
                .write_line(format!("There is no explanation for '{}' command.", topic)),
        }
    }

    fn stat(&mut self) -> CliResult<()> {
        let Some(count) = self.checked_stat()? else {
            return Ok(());
        };

        match self.kind {
            StorageKind::File => {
                let result = self.store.count_of_removed();
                let Some(removed) = self.checked(result)? else {
                    return Ok(());
                };
                self.console
                    .write_line(format!("{} record(s). {} removed.", count, removed))
            }
            StorageKind::Memory => self.console.write_line(format!("{} record(s).", count)),
        }
    }

    fn checked_stat(&mut self) -> CliResult<Option<usize>> {
        let result = self.store.get_stat();
        self.checked(result)
    }

    fn create(&mut self) -> CliResult<()> {
        let Some(fields) = self.console.read_fields(&self.validator)? else {
            return Ok(());
        };

        let result = self.store.create_record(fields);
        if let Some(id) = self.checked(result)? {
            self.console.write_line(format!("Record #{} is created.", id))?;
        }
        Ok(())
    }

    fn edit(&mut self, params: &str) -> CliResult<()> {
        let Some(id) = self.parse_id(params)? else {
            return Ok(());
        };

        let result = self.store.get_records();
        let Some(records) = self.checked(result)? else {
            return Ok(());
        };
        if !records.iter().any(|r| r.id == id) {
            return self
                .console
                .write_line(format!("#{} record is not found.", id));
        }

        let Some(fields) = self.console.read_fields(&self.validator)? else {
            return Ok(());
        };

        let result = self.store.edit_record(id, fields);
        if self.checked(result)?.is_some() {
            self.console.write_line(format!("Record #{} is updated.", id))?;
        }
        Ok(())
    }

    fn remove(&mut self, params: &str) -> CliResult<()> {
        let Some(id) = self.parse_id(params)? else {
            return Ok(());
        };

        let result = self.store.remove(id);
        match self.checked(result)? {
            Some(true) => self.console.write_line(format!("Record #{} is removed.", id)),
            Some(false) => self
                .console
                .write_line(format!("Record #{} doesn't exist.", id)),
            None => Ok(()),
        }
    }

    fn parse_id(&mut self, params: &str) -> CliResult<Option<RecordId>> {
        if params.is_empty() {
            self.console.write_line("You should write the record id.")?;
            return Ok(None);
        }
        match record::parse_id(params) {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                self.console.write_line(e.to_string())?;
                Ok(None)
            }
        }
    }

    fn list(&mut self) -> CliResult<()> {
        let result = self.store.get_records();
        if let Some(records) = self.checked(result)? {
            self.print(&records)?;
        }
        Ok(())
    }

    fn print(&mut self, records: &[Record]) -> CliResult<()> {
        for record in records {
            self.console.write_line(record.to_string())?;
        }
        Ok(())
    }

    fn find(&mut self, params: &str) -> CliResult<()> {
        if params.is_empty() {
            return self.console.write_line("You should write the parameters.");
        }
        let Some((property, text)) = params.split_once(' ') else {
            return self
                .console
                .write_line("You should write the text to search for.");
        };
        let text = text.trim().replace('"', "");

        let result = match property.to_ascii_lowercase().as_str() {
            "firstname" => self.store.find_by_first_name(&text),
            "lastname" => self.store.find_by_last_name(&text),
            "dateofbirth" => match record::parse_date(&text) {
                Ok(date) => self.store.find_by_date_of_birth(date),
                Err(_) => {
                    return self.console.write_line(format!(
                        "The following date '{}' has incorrect format.",
                        text
                    ))
                }
            },
            _ => {
                return self
                    .console
                    .write_line(format!("The '{}' property does not exist.", property))
            }
        };

        if let Some(records) = self.checked(result)? {
            self.print(&records)?;
        }
        Ok(())
    }

    /// Split `csv|xml <file>` into a format and a path.
    fn format_and_file<'p>(
        &mut self,
        params: &'p str,
    ) -> CliResult<Option<(SnapshotFormat, &'p str)>> {
        if params.is_empty() {
            self.console.write_line("You should write the parameters.")?;
            return Ok(None);
        }
        let Some((format, file)) = params.split_once(' ') else {
            self.console.write_line("You should write the file name.")?;
            return Ok(None);
        };
        match format.parse::<SnapshotFormat>() {
            Ok(format) => Ok(Some((format, file.trim()))),
            Err(_) => {
                self.console
                    .write_line(format!("There is no '{}' file format.", format))?;
                Ok(None)
            }
        }
    }

    fn export(&mut self, params: &str) -> CliResult<()> {
        let Some((format, file)) = self.format_and_file(params)? else {
            return Ok(());
        };

        if Path::new(file).exists() {
            let answer = self
                .console
                .prompt(&format!("File is exist - rewrite {}? [Y/n] ", file))?;
            if !matches!(answer.as_deref(), Some("Y") | Some("y")) {
                return Ok(());
            }
        }

        let result = self.store.make_snapshot();
        let Some(snapshot) = self.checked(result)? else {
            return Ok(());
        };

        let scope = ObservationScope::with_fields("EXPORT", &[("format", format.as_str())]);
        let written = File::create(file)
            .map_err(|e| e.to_string())
            .and_then(|f| {
                snapshot
                    .export(format, BufWriter::new(f))
                    .map_err(|e| e.to_string())
            });

        match written {
            Ok(()) => {
                let records = snapshot.len().to_string();
                scope.complete_with_fields(&[("records", records.as_str())]);
                self.console
                    .write_line(format!("All records are exported to file {}.", file))
            }
            Err(reason) => {
                scope.fail(&reason);
                self.console.write_line(format!("Export failed: {}", reason))
            }
        }
    }

    fn import(&mut self, params: &str) -> CliResult<()> {
        let Some((format, file)) = self.format_and_file(params)? else {
            return Ok(());
        };

        let scope = ObservationScope::with_fields("IMPORT", &[("format", format.as_str())]);
        let report = File::open(file)
            .map_err(|e| e.to_string())
            .and_then(|f| Snapshot::import(format, BufReader::new(f)).map_err(|e| e.to_string()));

        let report = match report {
            Ok(report) => report,
            Err(reason) => {
                scope.fail(&reason);
                return self.console.write_line(format!("Import failed: {}", reason));
            }
        };

        for row_error in &report.errors {
            self.console.write_line(format!("Skipped: {}", row_error))?;
        }

        let result = self.store.restore(&report.snapshot);
        match self.checked(result)? {
            Some(count) => {
                let applied = count.to_string();
                let skipped = report.errors.len().to_string();
                scope.complete_with_fields(&[
                    ("applied", applied.as_str()),
                    ("skipped", skipped.as_str()),
                ]);
                self.console
                    .write_line(format!("{} records were imported from {}.", count, file))
            }
            None => {
                scope.fail("restore rejected");
                Ok(())
            }
        }
    }

    fn purge(&mut self) -> CliResult<()> {
        let Some(total) = self.checked_stat()? else {
            return Ok(());
        };

        let scope = ObservationScope::new("PURGE");
        let result = self.store.purge();
        match self.checked(result)? {
            Some(purged) => {
                let purged_str = purged.to_string();
                scope.complete_with_fields(&[("purged", purged_str.as_str())]);
                self.console.write_line(format!(
                    "Data file processing is completed: {} of {} records were purged.",
                    purged, total
                ))
            }
            None => {
                scope.fail("purge rejected");
                Ok(())
            }
        }
    }
}
