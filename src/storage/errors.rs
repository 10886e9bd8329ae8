//! Storage error types
//!
//! Error codes:
//! - FC_STORAGE_IO_ERROR (ERROR severity)
//! - FC_STORAGE_WRITE_FAILED (ERROR severity)
//! - FC_STORAGE_READ_FAILED (ERROR severity)
//! - FC_DATA_CORRUPTION (FATAL severity)
//! - FC_RECORD_NOT_FOUND (REJECT severity)
//! - FC_RECORD_VALIDATION_FAILED (REJECT severity)
//! - FC_STORE_CLOSED (ERROR severity)
//! - FC_ID_SPACE_EXHAUSTED (REJECT severity)

use std::fmt;
use std::io;

use crate::record::RecordId;
use crate::validation::ValidationError;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected, store unchanged
    Reject,
    /// Operation fails, store remains usable
    Error,
    /// Backing data cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure
    FcStorageIoError,
    /// Slot write or fsync failed
    FcStorageWriteFailed,
    /// Slot read failed
    FcStorageReadFailed,
    /// Slot bytes do not decode to a record
    FcDataCorruption,
    /// Operation targets an id that is not live
    FcRecordNotFound,
    /// Record rejected by the validation policy
    FcRecordValidationFailed,
    /// Store handle already released
    FcStoreClosed,
    /// No id is left to assign
    FcIdSpaceExhausted,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::FcStorageIoError => "FC_STORAGE_IO_ERROR",
            StorageErrorCode::FcStorageWriteFailed => "FC_STORAGE_WRITE_FAILED",
            StorageErrorCode::FcStorageReadFailed => "FC_STORAGE_READ_FAILED",
            StorageErrorCode::FcDataCorruption => "FC_DATA_CORRUPTION",
            StorageErrorCode::FcRecordNotFound => "FC_RECORD_NOT_FOUND",
            StorageErrorCode::FcRecordValidationFailed => "FC_RECORD_VALIDATION_FAILED",
            StorageErrorCode::FcStoreClosed => "FC_STORE_CLOSED",
            StorageErrorCode::FcIdSpaceExhausted => "FC_ID_SPACE_EXHAUSTED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::FcStorageIoError => Severity::Error,
            StorageErrorCode::FcStorageWriteFailed => Severity::Error,
            StorageErrorCode::FcStorageReadFailed => Severity::Error,
            StorageErrorCode::FcDataCorruption => Severity::Fatal,
            StorageErrorCode::FcRecordNotFound => Severity::Reject,
            StorageErrorCode::FcRecordValidationFailed => Severity::Reject,
            StorageErrorCode::FcStoreClosed => Severity::Error,
            StorageErrorCode::FcIdSpaceExhausted => Severity::Reject,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error type with full context
#[derive(Debug)]
pub struct StorageError {
    /// Error code
    code: StorageErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Field that failed validation, if any
    field: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl StorageError {
    fn with_code(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            field: None,
            source: None,
        }
    }

    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::with_code(StorageErrorCode::FcStorageIoError, message)
        }
    }

    /// Create a new storage write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::with_code(StorageErrorCode::FcStorageWriteFailed, message)
        }
    }

    /// Create a storage write failed error without IO source
    pub fn write_failed_no_source(message: impl Into<String>) -> Self {
        Self::with_code(StorageErrorCode::FcStorageWriteFailed, message)
    }

    /// Create a new storage read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::with_code(StorageErrorCode::FcStorageReadFailed, message)
        }
    }

    /// Create a new data corruption error (FATAL)
    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self::with_code(StorageErrorCode::FcDataCorruption, message)
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            details: Some(format!("byte_offset: {}", offset)),
            ..Self::with_code(StorageErrorCode::FcDataCorruption, reason)
        }
    }

    /// Create a record-not-found error
    pub fn not_found(id: RecordId) -> Self {
        Self {
            details: Some(format!("record_id: {}", id)),
            ..Self::with_code(
                StorageErrorCode::FcRecordNotFound,
                format!("#{} record is not found", id),
            )
        }
    }

    /// Create a store-closed error
    pub fn closed() -> Self {
        Self::with_code(StorageErrorCode::FcStoreClosed, "Store has been closed")
    }

    /// Create an error for a store whose ids have run out
    pub fn id_space_exhausted(last_id: RecordId) -> Self {
        Self {
            details: Some(format!("last_id: {}", last_id)),
            ..Self::with_code(StorageErrorCode::FcIdSpaceExhausted, "No record ids are left")
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns the field that failed validation, if this is a validation error
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns whether the store rejected the request without touching data
    pub fn is_rejection(&self) -> bool {
        self.severity() == Severity::Reject
    }
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        let details = err.details();
        Self {
            details: Some(format!("expected {}, got {}", details.expected, details.actual)),
            field: Some(details.field.clone()),
            ..Self::with_code(
                StorageErrorCode::FcRecordValidationFailed,
                format!("Invalid value for '{}'", details.field),
            )
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
