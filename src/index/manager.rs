//! Index Manager for filecabinet
//!
//! Maintains the three secondary indexes shared by both stores.
//!
//! # API
//!
//! - `rebuild(records)` - Rebuild all indexes from live records
//! - `insert(record)` - Index a newly stored record
//! - `remove(record)` - Drop a record from every index
//! - `rekey(old, new)` - Move a record between buckets after an edit
//! - `lookup_*` - Exact match lookup, ids sorted ascending

use chrono::NaiveDate;

use super::btree::IndexTree;
use crate::record::{Record, RecordFields, RecordId};

/// Secondary indexes by first name, last name and date of birth.
#[derive(Debug, Clone)]
pub struct IndexManager {
    first_name: IndexTree<String>,
    last_name: IndexTree<String>,
    date_of_birth: IndexTree<NaiveDate>,
    /// When false, name keys are folded to lowercase.
    case_sensitive: bool,
}

impl IndexManager {
    /// Creates an empty manager
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            first_name: IndexTree::new(),
            last_name: IndexTree::new(),
            date_of_birth: IndexTree::new(),
            case_sensitive,
        }
    }

    fn name_key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Rebuild every index from the given live records.
    ///
    /// Callers pass only live records; removed slots must be filtered out.
    pub fn rebuild<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a Record>,
    {
        self.clear();
        for record in records {
            self.insert(record);
        }
    }

    /// Index a record under its current keys.
    pub fn insert(&mut self, record: &Record) {
        let first = self.name_key(&record.first_name);
        let last = self.name_key(&record.last_name);
        self.first_name.insert(first, record.id);
        self.last_name.insert(last, record.id);
        self.date_of_birth.insert(record.date_of_birth, record.id);
    }

    /// Remove a record from every index.
    pub fn remove(&mut self, record: &Record) {
        let first = self.name_key(&record.first_name);
        let last = self.name_key(&record.last_name);
        self.first_name.remove(&first, record.id);
        self.last_name.remove(&last, record.id);
        self.date_of_birth.remove(&record.date_of_birth, record.id);
    }

    /// Move a record between buckets for every keyed field that changed.
    ///
    /// Called before the stored record is overwritten with `new`.
    pub fn rekey(&mut self, old: &Record, new: &RecordFields) {
        let id = old.id;

        let old_first = self.name_key(&old.first_name);
        let new_first = self.name_key(&new.first_name);
        if old_first != new_first {
            self.first_name.remove(&old_first, id);
            self.first_name.insert(new_first, id);
        }

        let old_last = self.name_key(&old.last_name);
        let new_last = self.name_key(&new.last_name);
        if old_last != new_last {
            self.last_name.remove(&old_last, id);
            self.last_name.insert(new_last, id);
        }

        if old.date_of_birth != new.date_of_birth {
            self.date_of_birth.remove(&old.date_of_birth, id);
            self.date_of_birth.insert(new.date_of_birth, id);
        }
    }

    pub fn lookup_first_name(&self, first_name: &str) -> Vec<RecordId> {
        self.first_name.lookup_eq(&self.name_key(first_name))
    }

    pub fn lookup_last_name(&self, last_name: &str) -> Vec<RecordId> {
        self.last_name.lookup_eq(&self.name_key(last_name))
    }

    pub fn lookup_date_of_birth(&self, date_of_birth: NaiveDate) -> Vec<RecordId> {
        self.date_of_birth.lookup_eq(&date_of_birth)
    }

    /// Clear all indexes
    pub fn clear(&mut self) {
        self.first_name.clear();
        self.last_name.clear();
        self.date_of_birth.clear();
    }

    /// Number of ids held by the date-of-birth index (one per live record).
    pub fn indexed_count(&self) -> usize {
        self.date_of_birth.id_count()
    }
}

impl Default for IndexManager {
    fn default() -> Self {
        Self::new(true)
    }
}
