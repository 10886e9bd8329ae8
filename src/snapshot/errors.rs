//! Snapshot import/export errors

use std::io;

use thiserror::Error;

use crate::record::ConversionError;

/// Result type for snapshot reading and writing
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// A document that cannot be read or written as a whole.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("unexpected CSV header: {0}")]
    UnexpectedHeader(String),

    #[error("unknown snapshot format: {0}")]
    UnknownFormat(String),
}

/// One row or element skipped during import. The rest of the document
/// is still processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportRowError {
    #[error("row {row}: record '{raw_id}': field '{field}': {source}")]
    InvalidField {
        row: usize,
        raw_id: String,
        field: &'static str,
        #[source]
        source: ConversionError,
    },

    #[error("row {row}: record '{raw_id}': missing field '{field}'")]
    MissingField {
        row: usize,
        raw_id: String,
        field: &'static str,
    },

    #[error("row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl ImportRowError {
    /// Row (CSV line number) or element position (XML, 1-based).
    pub fn row(&self) -> usize {
        match self {
            ImportRowError::InvalidField { row, .. }
            | ImportRowError::MissingField { row, .. }
            | ImportRowError::ColumnCount { row, .. } => *row,
        }
    }

    /// The failing field, if the error concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ImportRowError::InvalidField { field, .. }
            | ImportRowError::MissingField { field, .. } => Some(field),
            ImportRowError::ColumnCount { .. } => None,
        }
    }
}
