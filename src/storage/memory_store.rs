//! In-memory record store
//!
//! Records live in a map keyed by id, so listing is always ordered by id.
//! Removal is physical; the removed id is never handed out again.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::errors::{StorageError, StorageResult};
use super::{log_restore_skip, RecordStore, StoreOptions};
use crate::index::IndexManager;
use crate::record::{Record, RecordFields, RecordId};
use crate::snapshot::Snapshot;
use crate::validation::{RecordValidator, ValidationDetails, ValidationError};

/// Record store held entirely in process memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: BTreeMap<RecordId, Record>,
    indexes: IndexManager,
    validator: RecordValidator,
    /// Highest id ever assigned, 0 for a fresh store
    last_id: RecordId,
}

impl MemoryStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            records: BTreeMap::new(),
            indexes: IndexManager::new(options.case_sensitive_search),
            validator: options.validator,
            last_id: 0,
        }
    }

    /// Store with case-sensitive search and the given validator.
    pub fn with_validator(validator: RecordValidator) -> Self {
        Self::new(StoreOptions::new(validator))
    }

    pub fn validator(&self) -> &RecordValidator {
        &self.validator
    }

    fn records_for(&self, ids: Vec<RecordId>) -> Vec<Record> {
        ids.iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }

    fn insert_at(&mut self, record: Record) {
        self.last_id = self.last_id.max(record.id);
        self.indexes.insert(&record);
        self.records.insert(record.id, record);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl RecordStore for MemoryStore {
    fn create_record(&mut self, fields: RecordFields) -> StorageResult<RecordId> {
        self.validator.validate(&fields)?;

        let id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StorageError::id_space_exhausted(self.last_id))?;
        self.insert_at(fields.with_id(id));
        Ok(id)
    }

    fn edit_record(&mut self, id: RecordId, fields: RecordFields) -> StorageResult<()> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found(id))?;

        self.validator.validate(&fields)?;

        self.indexes.rekey(record, &fields);
        record.apply(fields);
        Ok(())
    }

    fn remove(&mut self, id: RecordId) -> StorageResult<bool> {
        match self.records.remove(&id) {
            Some(record) => {
                self.indexes.remove(&record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get_records(&mut self) -> StorageResult<Vec<Record>> {
        Ok(self.records.values().cloned().collect())
    }

    fn get_stat(&mut self) -> StorageResult<usize> {
        Ok(self.records.len())
    }

    fn count_of_removed(&mut self) -> StorageResult<usize> {
        Ok(0)
    }

    fn find_by_first_name(&mut self, first_name: &str) -> StorageResult<Vec<Record>> {
        Ok(self.records_for(self.indexes.lookup_first_name(first_name)))
    }

    fn find_by_last_name(&mut self, last_name: &str) -> StorageResult<Vec<Record>> {
        Ok(self.records_for(self.indexes.lookup_last_name(last_name)))
    }

    fn find_by_date_of_birth(&mut self, date_of_birth: NaiveDate) -> StorageResult<Vec<Record>> {
        Ok(self.records_for(self.indexes.lookup_date_of_birth(date_of_birth)))
    }

    fn make_snapshot(&mut self) -> StorageResult<Snapshot> {
        Ok(Snapshot::new(self.records.values().cloned().collect()))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StorageResult<usize> {
        let mut applied = 0;

        for incoming in snapshot.records() {
            let fields = incoming.fields();
            let checked: StorageResult<()> = if incoming.id == 0 {
                let details = ValidationDetails::new("id", "a positive id", "0");
                Err(ValidationError::failed(details).into())
            } else {
                self.validator.validate(&fields).map_err(StorageError::from)
            };
            if let Err(e) = checked {
                log_restore_skip(incoming.id, &e);
                continue;
            }

            match self.records.get_mut(&incoming.id) {
                Some(existing) => {
                    self.indexes.rekey(existing, &fields);
                    existing.apply(fields);
                }
                None => self.insert_at(incoming.clone()),
            }
            applied += 1;
        }

        Ok(applied)
    }

    fn purge(&mut self) -> StorageResult<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::errors::StorageErrorCode;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn person(first: &str, last: &str, born: NaiveDate) -> RecordFields {
        RecordFields::new(first, last, born, 70, Decimal::from_str("250.50").unwrap(), 'K')
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut store = MemoryStore::default();
        assert_eq!(store.create_record(person("Ann", "Lee", date(1990, 5, 1))).unwrap(), 1);
        assert_eq!(store.create_record(person("Bob", "Lee", date(1985, 3, 3))).unwrap(), 2);
        assert_eq!(store.get_stat().unwrap(), 2);
    }

    #[test]
    fn test_create_invalid_leaves_store_unchanged() {
        let mut store = MemoryStore::default();
        let mut fields = person("Ann", "Lee", date(1990, 5, 1));
        fields.weight = 9;

        let err = store.create_record(fields).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::FcRecordValidationFailed);
        assert_eq!(err.field(), Some("weight"));
        assert_eq!(store.get_stat().unwrap(), 0);
        assert_eq!(store.create_record(person("Ann", "Lee", date(1990, 5, 1))).unwrap(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut store = MemoryStore::default();
        store.create_record(person("Ann", "Lee", date(1990, 5, 1))).unwrap();
        store.create_record(person("Bob", "Lee", date(1985, 3, 3))).unwrap();

        assert!(store.remove(2).unwrap());
        assert_eq!(store.create_record(person("Cid", "Moe", date(1980, 1, 1))).unwrap(), 3);
    }

    #[test]
    fn test_edit_unknown_id() {
        let mut store = MemoryStore::default();
        let err = store.edit_record(4, person("Ann", "Lee", date(1990, 5, 1))).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::FcRecordNotFound);
    }

    #[test]
    fn test_edit_invalid_keeps_old_values() {
        let mut store = MemoryStore::default();
        let id = store.create_record(person("Ann", "Lee", date(1990, 5, 1))).unwrap();

        let mut fields = person("Ann", "Lee", date(1990, 5, 1));
        fields.first_name = "A".into();
        assert!(store.edit_record(id, fields).is_err());
        assert_eq!(store.find_by_first_name("Ann").unwrap().len(), 1);
    }

    #[test]
    fn test_case_insensitive_store() {
        let options = StoreOptions::default().case_sensitive_search(false);
        let mut store = MemoryStore::new(options);
        store.create_record(person("Ann", "Lee", date(1990, 5, 1))).unwrap();

        assert_eq!(store.find_by_first_name("aNN").unwrap().len(), 1);
        assert_eq!(store.find_by_last_name("LEE").unwrap()[0].last_name, "Lee");
    }

    #[test]
    fn test_restore_skips_invalid_records() {
        let mut store = MemoryStore::default();
        let good = person("Ann", "Lee", date(1990, 5, 1)).with_id(1);
        let mut bad = person("Bob", "Lee", date(1985, 3, 3)).with_id(2);
        bad.weight = 1000;
        let zero = person("Cid", "Moe", date(1980, 1, 1)).with_id(0);

        let applied = store.restore(&Snapshot::new(vec![good, bad, zero])).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(store.get_stat().unwrap(), 1);
    }

    #[test]
    fn test_restore_advances_id_counter() {
        let mut store = MemoryStore::default();
        let record = person("Ann", "Lee", date(1990, 5, 1)).with_id(10);
        store.restore(&Snapshot::new(vec![record])).unwrap();

        assert_eq!(store.create_record(person("Bob", "Lee", date(1985, 3, 3))).unwrap(), 11);
    }

    #[test]
    fn test_create_after_highest_id_is_rejected() {
        let mut store = MemoryStore::default();
        let last = person("Ann", "Lee", date(1990, 5, 1)).with_id(RecordId::MAX);
        store.restore(&Snapshot::new(vec![last])).unwrap();

        let err = store
            .create_record(person("Bob", "Lee", date(1985, 3, 3)))
            .unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::FcIdSpaceExhausted);
        assert!(err.is_rejection());

        let records = store.get_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].first_name, "Ann");
        assert!(store.find_by_first_name("Bob").unwrap().is_empty());
    }

    #[test]
    fn test_purge_is_noop() {
        let mut store = MemoryStore::default();
        store.create_record(person("Ann", "Lee", date(1990, 5, 1))).unwrap();
        store.remove(1).unwrap();
        assert_eq!(store.purge().unwrap(), 0);
        assert_eq!(store.count_of_removed().unwrap(), 0);
    }
}
