//! Store Decorator Tests
//!
//! Logging and timing decorators must return exactly what the wrapped store
//! returns, for successes and for errors, in any stacking order.

use chrono::NaiveDate;
use filecabinet::observability::{LoggingStore, StoreMethod, TimingStore};
use filecabinet::record::RecordFields;
use filecabinet::snapshot::Snapshot;
use filecabinet::storage::{FileStore, MemoryStore, RecordStore, StoreOptions};
use rust_decimal::Decimal;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ann() -> RecordFields {
    RecordFields::new("Ann", "Lee", date(1990, 5, 1), 60, Decimal::new(100_000, 2), 'A')
}

fn bob() -> RecordFields {
    RecordFields::new("Bob", "Lee", date(1985, 3, 3), 80, Decimal::new(50_000, 2), 'B')
}

/// Run the same script against a store and describe every outcome.
fn script(store: &mut dyn RecordStore) -> Vec<String> {
    let mut too_light = ann();
    too_light.weight = 1;

    vec![
        format!("{:?}", store.create_record(ann())),
        format!("{:?}", store.create_record(bob())),
        format!("{:?}", store.create_record(too_light).map_err(|e| e.code())),
        format!("{:?}", store.edit_record(9, bob()).map_err(|e| e.code())),
        format!("{:?}", store.find_by_last_name("Lee")),
        format!("{:?}", store.find_by_date_of_birth(date(1985, 3, 3))),
        format!("{:?}", store.remove(1)),
        format!("{:?}", store.remove(1)),
        format!("{:?}", store.get_stat()),
        format!("{:?}", store.count_of_removed()),
        format!("{:?}", store.restore(&Snapshot::new(vec![ann().with_id(1)]))),
        format!("{:?}", store.make_snapshot()),
        format!("{:?}", store.purge()),
        format!("{:?}", store.get_records()),
    ]
}

// =============================================================================
// Transparency
// =============================================================================

#[test]
fn test_memory_decorators_are_transparent() {
    let expected = script(&mut MemoryStore::default());

    let mut logged = LoggingStore::new(MemoryStore::default(), Vec::new());
    assert_eq!(script(&mut logged), expected);

    let mut timed = TimingStore::new(MemoryStore::default());
    assert_eq!(script(&mut timed), expected);

    let mut stacked = LoggingStore::new(TimingStore::new(MemoryStore::default()), std::io::sink());
    assert_eq!(script(&mut stacked), expected);
}

#[test]
fn test_file_decorators_are_transparent() {
    let dir = TempDir::new().unwrap();
    let open = |name: &str| {
        FileStore::open(&dir.path().join(name), StoreOptions::default()).unwrap()
    };

    let expected = script(&mut open("plain.db"));

    let mut stacked = TimingStore::new(LoggingStore::new(open("decorated.db"), Vec::new()));
    assert_eq!(script(&mut stacked), expected);
}

// =============================================================================
// Side Channels
// =============================================================================

#[test]
fn test_logging_store_writes_call_and_outcome_lines() {
    let mut logged = LoggingStore::new(MemoryStore::default(), Vec::new());
    script(&mut logged);

    let (_, sink) = logged.into_parts();
    let lines: Vec<serde_json::Value> = String::from_utf8(sink)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    let calls = lines.iter().filter(|l| l["event"] == "STORE_CALL").count();
    let returns = lines.iter().filter(|l| l["event"] == "STORE_RETURN").count();
    let errors = lines.iter().filter(|l| l["event"] == "STORE_ERROR").count();

    assert_eq!(calls, 14);
    assert_eq!(errors, 2);
    assert_eq!(returns, 12);
    assert!(lines.iter().all(|l| l["timestamp"].is_string()));
}

#[test]
fn test_timing_store_counts_every_method() {
    let mut timed = TimingStore::new(MemoryStore::default());
    let timings = timed.timings();
    script(&mut timed);

    assert_eq!(timings.get(StoreMethod::CreateRecord).calls, 3);
    assert_eq!(timings.get(StoreMethod::CreateRecord).errors, 1);
    assert_eq!(timings.get(StoreMethod::Remove).calls, 2);
    assert_eq!(timings.get(StoreMethod::Close).calls, 0);
    assert_eq!(timings.snapshot().len(), 11);
}
