//! Snapshots and CSV/XML import/export for filecabinet
//!
//! A snapshot is an immutable copy of a set of records. Stores produce one
//! with `make_snapshot` and consume one with `restore`; the readers and
//! writers here only ever see snapshots, never a store.
//!
//! # Import semantics
//!
//! - Record ids are preserved; restore upserts by id
//! - A row that fails conversion is skipped and reported, the rest load
//! - A document that cannot be parsed at all is an error

mod csv_io;
mod errors;
mod xml_io;

pub use errors::{ImportRowError, SnapshotError, SnapshotResult};

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use crate::record::Record;

/// CSV header row, in column order.
pub const CSV_HEADER: [&str; 7] = [
    "Id",
    "First Name",
    "Last Name",
    "Date of Birth",
    "Weight",
    "Account",
    "Letter",
];

/// Immutable set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<Record>,
}

impl Snapshot {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the records in the given format.
    pub fn export<W: Write>(&self, format: SnapshotFormat, writer: W) -> SnapshotResult<()> {
        match format {
            SnapshotFormat::Csv => csv_io::write_records(&self.records, writer),
            SnapshotFormat::Xml => xml_io::write_records(&self.records, writer),
        }
    }

    /// Read records in the given format.
    pub fn import<R: Read>(format: SnapshotFormat, reader: R) -> SnapshotResult<ImportReport> {
        match format {
            SnapshotFormat::Csv => csv_io::read_records(reader),
            SnapshotFormat::Xml => xml_io::read_records(reader),
        }
    }
}

/// Outcome of reading an import document.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Rows that converted cleanly
    pub snapshot: Snapshot,
    /// Rows that were skipped
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Supported import/export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Csv,
    Xml,
}

impl SnapshotFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotFormat::Csv => "csv",
            SnapshotFormat::Xml => "xml",
        }
    }
}

impl FromStr for SnapshotFormat {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SnapshotFormat::Csv),
            "xml" => Ok(SnapshotFormat::Xml),
            _ => Err(SnapshotError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
