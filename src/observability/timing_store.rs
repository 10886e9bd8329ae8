//! Store decorator that measures every call
//!
//! Elapsed time is recorded into a shared `OperationTimings` and emitted as
//! a `STORE_CALL_TIMED` event at INFO.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;

use super::logger::Logger;
use super::metrics::{OperationTimings, StoreMethod};
use crate::record::{Record, RecordFields, RecordId};
use crate::snapshot::Snapshot;
use crate::storage::{RecordStore, StorageResult};

pub struct TimingStore<S> {
    inner: S,
    timings: Arc<OperationTimings>,
}

impl<S: RecordStore> TimingStore<S> {
    pub fn new(inner: S) -> Self {
        Self::with_timings(inner, Arc::new(OperationTimings::new()))
    }

    /// Decorate `inner`, accumulating into an existing set of timings.
    pub fn with_timings(inner: S, timings: Arc<OperationTimings>) -> Self {
        Self { inner, timings }
    }

    /// Handle to the accumulated timings, usable after the store is boxed.
    pub fn timings(&self) -> Arc<OperationTimings> {
        Arc::clone(&self.timings)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn timed<T>(
        &mut self,
        method: StoreMethod,
        op: impl FnOnce(&mut S) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let start = Instant::now();
        let result = op(&mut self.inner);
        let elapsed = start.elapsed();

        self.timings.record(method, elapsed, result.is_ok());

        let micros = elapsed.as_micros().to_string();
        Logger::info(
            "STORE_CALL_TIMED",
            &[("method", method.as_str()), ("elapsed_us", micros.as_str())],
        );

        result
    }
}

impl<S: RecordStore> RecordStore for TimingStore<S> {
    fn create_record(&mut self, fields: RecordFields) -> StorageResult<RecordId> {
        self.timed(StoreMethod::CreateRecord, |s| s.create_record(fields))
    }

    fn edit_record(&mut self, id: RecordId, fields: RecordFields) -> StorageResult<()> {
        self.timed(StoreMethod::EditRecord, |s| s.edit_record(id, fields))
    }

    fn remove(&mut self, id: RecordId) -> StorageResult<bool> {
        self.timed(StoreMethod::Remove, |s| s.remove(id))
    }

    fn get_records(&mut self) -> StorageResult<Vec<Record>> {
        self.timed(StoreMethod::GetRecords, |s| s.get_records())
    }

    fn get_stat(&mut self) -> StorageResult<usize> {
        self.timed(StoreMethod::GetStat, |s| s.get_stat())
    }

    fn count_of_removed(&mut self) -> StorageResult<usize> {
        self.timed(StoreMethod::CountOfRemoved, |s| s.count_of_removed())
    }

    fn find_by_first_name(&mut self, first_name: &str) -> StorageResult<Vec<Record>> {
        self.timed(StoreMethod::FindByFirstName, |s| {
            s.find_by_first_name(first_name)
        })
    }

    fn find_by_last_name(&mut self, last_name: &str) -> StorageResult<Vec<Record>> {
        self.timed(StoreMethod::FindByLastName, |s| s.find_by_last_name(last_name))
    }

    fn find_by_date_of_birth(&mut self, date_of_birth: NaiveDate) -> StorageResult<Vec<Record>> {
        self.timed(StoreMethod::FindByDateOfBirth, |s| {
            s.find_by_date_of_birth(date_of_birth)
        })
    }

    fn make_snapshot(&mut self) -> StorageResult<Snapshot> {
        self.timed(StoreMethod::MakeSnapshot, |s| s.make_snapshot())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StorageResult<usize> {
        self.timed(StoreMethod::Restore, |s| s.restore(snapshot))
    }

    fn purge(&mut self) -> StorageResult<usize> {
        self.timed(StoreMethod::Purge, |s| s.purge())
    }

    fn close(&mut self) -> StorageResult<()> {
        self.timed(StoreMethod::Close, |s| s.close())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rust_decimal::Decimal;

    fn bob() -> RecordFields {
        RecordFields::new(
            "Bob",
            "Lee",
            NaiveDate::from_ymd_opt(1985, 3, 3).unwrap(),
            80,
            Decimal::new(50_000, 2),
            'B',
        )
    }

    #[test]
    fn test_counts_calls_and_errors() {
        let mut store = TimingStore::new(MemoryStore::default());
        let timings = store.timings();

        store.create_record(bob()).unwrap();
        store.create_record(bob()).unwrap();
        assert!(store.edit_record(42, bob()).is_err());

        assert_eq!(timings.get(StoreMethod::CreateRecord).calls, 2);
        let edit = timings.get(StoreMethod::EditRecord);
        assert_eq!(edit.calls, 1);
        assert_eq!(edit.errors, 1);
        assert_eq!(timings.get(StoreMethod::Purge).calls, 0);
    }

    #[test]
    fn test_timings_survive_boxing() {
        let store = TimingStore::new(MemoryStore::default());
        let timings = store.timings();

        let mut boxed: Box<dyn RecordStore> = Box::new(store);
        boxed.get_stat().unwrap();
        boxed.close().unwrap();

        let methods: Vec<_> = timings.snapshot().iter().map(|t| t.method).collect();
        assert_eq!(methods, vec![StoreMethod::GetStat, StoreMethod::Close]);
    }

    #[test]
    fn test_results_unchanged() {
        let mut store = TimingStore::new(MemoryStore::default());
        let id = store.create_record(bob()).unwrap();

        let found = store.find_by_first_name("Bob").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert!(store.remove(id).unwrap());
        assert!(!store.remove(id).unwrap());
    }
}
