//! Record storage subsystem for filecabinet
//!
//! Two engines implement the `RecordStore` contract:
//!
//! - `MemoryStore`: in-process records plus three secondary indexes
//! - `FileStore`: fixed-size slot heap on disk with soft delete and purge
//!
//! # Design Principles
//!
//! - Every write is validated before it touches state
//! - File writes are fsynced before the call returns
//! - Removal is soft on disk; only purge reclaims slots
//! - Indexes are derived state, rebuilt from live slots on open
//!
//! # Invariants
//!
//! - An id is unique among live records
//! - A live record sits in exactly the index buckets matching its keys
//! - Slot `i` (0-based) occupies `[i * SLOT_SIZE, (i + 1) * SLOT_SIZE)`
//! - The id stored in a slot equals its 1-based position

pub mod codec;
mod errors;
mod file_store;
mod memory_store;
mod reader;

pub use codec::{DecodedSlot, SLOT_SIZE};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use file_store::{FileStore, MAX_RESTORE_GAP};
pub use memory_store::MemoryStore;
pub use reader::{SlotEntry, SlotReader};

use chrono::NaiveDate;

use crate::record::{Record, RecordFields, RecordId};
use crate::snapshot::Snapshot;
use crate::validation::RecordValidator;

/// Construction options shared by both stores.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Policy run before every write
    pub validator: RecordValidator,
    /// When false, name lookups ignore case
    pub case_sensitive_search: bool,
}

impl StoreOptions {
    pub fn new(validator: RecordValidator) -> Self {
        Self {
            validator,
            case_sensitive_search: true,
        }
    }

    pub fn case_sensitive_search(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_search = case_sensitive;
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new(RecordValidator::default())
    }
}

/// The storage contract both engines implement.
///
/// Methods take `&mut self` because the file store moves its cursor on
/// every read.
pub trait RecordStore {
    /// Validate, assign an id, persist and index a new record.
    fn create_record(&mut self, fields: RecordFields) -> StorageResult<RecordId>;

    /// Overwrite every field of a live record, keeping its id.
    fn edit_record(&mut self, id: RecordId, fields: RecordFields) -> StorageResult<()>;

    /// Remove a live record. Returns `false` if the id is not live.
    fn remove(&mut self, id: RecordId) -> StorageResult<bool>;

    /// All live records ordered by id.
    fn get_records(&mut self) -> StorageResult<Vec<Record>>;

    /// Number of stored records. For the file store this includes removed slots.
    fn get_stat(&mut self) -> StorageResult<usize>;

    /// Number of removed records still occupying storage.
    fn count_of_removed(&mut self) -> StorageResult<usize>;

    fn find_by_first_name(&mut self, first_name: &str) -> StorageResult<Vec<Record>>;

    fn find_by_last_name(&mut self, last_name: &str) -> StorageResult<Vec<Record>>;

    fn find_by_date_of_birth(&mut self, date_of_birth: NaiveDate) -> StorageResult<Vec<Record>>;

    /// Immutable copy of all live records.
    fn make_snapshot(&mut self) -> StorageResult<Snapshot>;

    /// Upsert every valid record of the snapshot by id.
    ///
    /// Invalid records are skipped and logged. Returns the number applied.
    fn restore(&mut self, snapshot: &Snapshot) -> StorageResult<usize>;

    /// Reclaim removed records. Returns the number dropped.
    fn purge(&mut self) -> StorageResult<usize>;

    /// Release any held resources. Idempotent.
    fn close(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn create_record(&mut self, fields: RecordFields) -> StorageResult<RecordId> {
        (**self).create_record(fields)
    }

    fn edit_record(&mut self, id: RecordId, fields: RecordFields) -> StorageResult<()> {
        (**self).edit_record(id, fields)
    }

    fn remove(&mut self, id: RecordId) -> StorageResult<bool> {
        (**self).remove(id)
    }

    fn get_records(&mut self) -> StorageResult<Vec<Record>> {
        (**self).get_records()
    }

    fn get_stat(&mut self) -> StorageResult<usize> {
        (**self).get_stat()
    }

    fn count_of_removed(&mut self) -> StorageResult<usize> {
        (**self).count_of_removed()
    }

    fn find_by_first_name(&mut self, first_name: &str) -> StorageResult<Vec<Record>> {
        (**self).find_by_first_name(first_name)
    }

    fn find_by_last_name(&mut self, last_name: &str) -> StorageResult<Vec<Record>> {
        (**self).find_by_last_name(last_name)
    }

    fn find_by_date_of_birth(&mut self, date_of_birth: NaiveDate) -> StorageResult<Vec<Record>> {
        (**self).find_by_date_of_birth(date_of_birth)
    }

    fn make_snapshot(&mut self) -> StorageResult<Snapshot> {
        (**self).make_snapshot()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StorageResult<usize> {
        (**self).restore(snapshot)
    }

    fn purge(&mut self) -> StorageResult<usize> {
        (**self).purge()
    }

    fn close(&mut self) -> StorageResult<()> {
        (**self).close()
    }
}

/// Log a snapshot record that restore refused.
pub(crate) fn log_restore_skip(id: RecordId, err: &StorageError) {
    let id = id.to_string();
    let reason = err.to_string();
    crate::observability::Logger::warn(
        "RESTORE_RECORD_SKIPPED",
        &[("record_id", id.as_str()), ("reason", reason.as_str())],
    );
}
