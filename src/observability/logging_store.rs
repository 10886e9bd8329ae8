//! Store decorator that logs every call
//!
//! Each call produces a `STORE_CALL` line with the method and its
//! arguments, followed by `STORE_RETURN` with the result or `STORE_ERROR`
//! with the error code. Results and errors pass through untouched; a sink
//! that fails to write never fails the call.

use std::io::Write;

use chrono::{Local, NaiveDate};

use super::logger::{Logger, Severity};
use super::metrics::StoreMethod;
use crate::record::{Record, RecordFields, RecordId};
use crate::snapshot::Snapshot;
use crate::storage::{RecordStore, StorageResult};

/// Wraps a store and writes one JSON line per call event to `sink`.
pub struct LoggingStore<S, W> {
    inner: S,
    sink: W,
}

impl<S: RecordStore, W: Write> LoggingStore<S, W> {
    pub fn new(inner: S, sink: W) -> Self {
        Self { inner, sink }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_parts(self) -> (S, W) {
        (self.inner, self.sink)
    }

    fn emit(&mut self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let timestamp = Local::now().to_rfc3339();
        let mut all_fields = Vec::with_capacity(fields.len() + 1);
        all_fields.extend_from_slice(fields);
        all_fields.push(("timestamp", timestamp.as_str()));
        let _ = Logger::write_event(&mut self.sink, severity, event, &all_fields);
    }

    fn call<T>(
        &mut self,
        method: StoreMethod,
        args: &[(&str, &str)],
        op: impl FnOnce(&mut S) -> StorageResult<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> StorageResult<T> {
        let mut call_fields = vec![("method", method.as_str())];
        call_fields.extend_from_slice(args);
        self.emit(Severity::Info, "STORE_CALL", &call_fields);

        let result = op(&mut self.inner);

        match &result {
            Ok(value) => {
                let described = describe(value);
                self.emit(
                    Severity::Info,
                    "STORE_RETURN",
                    &[("method", method.as_str()), ("result", described.as_str())],
                );
            }
            Err(e) => {
                let message = e.to_string();
                self.emit(
                    Severity::Warn,
                    "STORE_ERROR",
                    &[
                        ("code", e.code().code()),
                        ("error", message.as_str()),
                        ("method", method.as_str()),
                    ],
                );
            }
        }

        result
    }
}

fn describe_fields(fields: &RecordFields) -> [(&'static str, String); 6] {
    [
        ("first_name", fields.first_name.clone()),
        ("last_name", fields.last_name.clone()),
        ("date_of_birth", fields.date_of_birth.to_string()),
        ("weight", fields.weight.to_string()),
        ("account", fields.account.to_string()),
        ("letter", fields.letter.to_string()),
    ]
}

fn as_field_refs<'a>(owned: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    owned.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

fn count(records: &Vec<Record>) -> String {
    format!("{} record(s)", records.len())
}

impl<S: RecordStore, W: Write> RecordStore for LoggingStore<S, W> {
    fn create_record(&mut self, fields: RecordFields) -> StorageResult<RecordId> {
        let owned = describe_fields(&fields);
        self.call(
            StoreMethod::CreateRecord,
            &as_field_refs(&owned),
            |s| s.create_record(fields),
            |id| format!("#{}", id),
        )
    }

    fn edit_record(&mut self, id: RecordId, fields: RecordFields) -> StorageResult<()> {
        let id_str = id.to_string();
        let owned = describe_fields(&fields);
        let mut args = as_field_refs(&owned);
        args.push(("id", id_str.as_str()));
        self.call(
            StoreMethod::EditRecord,
            &args,
            |s| s.edit_record(id, fields),
            |_| "ok".to_string(),
        )
    }

    fn remove(&mut self, id: RecordId) -> StorageResult<bool> {
        let id_str = id.to_string();
        self.call(
            StoreMethod::Remove,
            &[("id", id_str.as_str())],
            |s| s.remove(id),
            |removed| removed.to_string(),
        )
    }

    fn get_records(&mut self) -> StorageResult<Vec<Record>> {
        self.call(StoreMethod::GetRecords, &[], |s| s.get_records(), count)
    }

    fn get_stat(&mut self) -> StorageResult<usize> {
        self.call(StoreMethod::GetStat, &[], |s| s.get_stat(), |n| n.to_string())
    }

    fn count_of_removed(&mut self) -> StorageResult<usize> {
        self.call(
            StoreMethod::CountOfRemoved,
            &[],
            |s| s.count_of_removed(),
            |n| n.to_string(),
        )
    }

    fn find_by_first_name(&mut self, first_name: &str) -> StorageResult<Vec<Record>> {
        self.call(
            StoreMethod::FindByFirstName,
            &[("first_name", first_name)],
            |s| s.find_by_first_name(first_name),
            count,
        )
    }

    fn find_by_last_name(&mut self, last_name: &str) -> StorageResult<Vec<Record>> {
        self.call(
            StoreMethod::FindByLastName,
            &[("last_name", last_name)],
            |s| s.find_by_last_name(last_name),
            count,
        )
    }

    fn find_by_date_of_birth(&mut self, date_of_birth: NaiveDate) -> StorageResult<Vec<Record>> {
        let date_str = date_of_birth.to_string();
        self.call(
            StoreMethod::FindByDateOfBirth,
            &[("date_of_birth", date_str.as_str())],
            |s| s.find_by_date_of_birth(date_of_birth),
            count,
        )
    }

    fn make_snapshot(&mut self) -> StorageResult<Snapshot> {
        self.call(
            StoreMethod::MakeSnapshot,
            &[],
            |s| s.make_snapshot(),
            |snapshot| format!("{} record(s)", snapshot.len()),
        )
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StorageResult<usize> {
        let len = snapshot.len().to_string();
        self.call(
            StoreMethod::Restore,
            &[("records", len.as_str())],
            |s| s.restore(snapshot),
            |applied| applied.to_string(),
        )
    }

    fn purge(&mut self) -> StorageResult<usize> {
        self.call(StoreMethod::Purge, &[], |s| s.purge(), |n| n.to_string())
    }

    fn close(&mut self) -> StorageResult<()> {
        let result = self.call(StoreMethod::Close, &[], |s| s.close(), |_| "ok".to_string());
        let _ = self.sink.flush();
        result
    }
}
