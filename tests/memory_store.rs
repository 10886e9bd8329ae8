//! Memory Store Tests
//!
//! Covers:
//! - id assignment and listing
//! - index maintenance across create, edit and remove
//! - validation leaves the store unchanged
//! - restore as upsert-by-id, including ids that were removed

use chrono::NaiveDate;
use filecabinet::record::{RecordFields, RecordId};
use filecabinet::snapshot::Snapshot;
use filecabinet::storage::{MemoryStore, RecordStore, StorageErrorCode, StoreOptions};
use filecabinet::validation::RecordValidator;
use rust_decimal::Decimal;

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

fn ids(records: &[filecabinet::record::Record]) -> Vec<RecordId> {
    records.iter().map(|r| r.id).collect()
}

// =============================================================================
// Create / List
// =============================================================================

#[test]
fn test_create_then_list_contains_record() {
    let mut store = MemoryStore::default();
    let id = store.create_record(ann()).unwrap();

    let records = store.get_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].fields(), ann());
}

#[test]
fn test_ann_and_bob_scenario() {
    let mut store = MemoryStore::default();
    assert_eq!(store.create_record(ann()).unwrap(), 1);
    assert_eq!(store.create_record(bob()).unwrap(), 2);

    assert_eq!(ids(&store.find_by_last_name("Lee").unwrap()), vec![1, 2]);

    assert!(store.remove(1).unwrap());
    assert_eq!(ids(&store.find_by_last_name("Lee").unwrap()), vec![2]);
    assert_eq!(store.get_stat().unwrap(), 1);
    assert_eq!(store.count_of_removed().unwrap(), 0);
}

#[test]
fn test_ids_are_not_reused_after_remove() {
    let mut store = MemoryStore::default();
    store.create_record(ann()).unwrap();
    store.create_record(bob()).unwrap();
    store.remove(2).unwrap();

    assert_eq!(store.create_record(bob()).unwrap(), 3);
    assert_eq!(ids(&store.get_records().unwrap()), vec![1, 3]);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_invalid_record_leaves_store_unchanged() {
    let mut store = MemoryStore::default();
    let mut fields = ann();
    fields.weight = 9;

    let err = store.create_record(fields).unwrap_err();
    assert_eq!(err.code(), StorageErrorCode::FcRecordValidationFailed);
    assert_eq!(err.field(), Some("weight"));
    assert!(err.is_rejection());

    assert_eq!(store.get_stat().unwrap(), 0);
    assert!(store.find_by_first_name("Ann").unwrap().is_empty());
}

#[test]
fn test_custom_rules_are_applied() {
    let mut store = MemoryStore::with_validator(RecordValidator::custom_rules());
    let mut fields = ann();
    fields.account = Decimal::new(200_000, 2);

    let err = store.create_record(fields).unwrap_err();
    assert_eq!(err.field(), Some("account"));
}

// =============================================================================
// Edit
// =============================================================================

#[test]
fn test_edit_rekeys_every_index() {
    let mut store = MemoryStore::default();
    let id = store.create_record(ann()).unwrap();

    let mut fields = ann();
    fields.first_name = "Anna".to_string();
    fields.last_name = "Kim".to_string();
    fields.date_of_birth = date(1991, 6, 2);
    store.edit_record(id, fields).unwrap();

    assert!(store.find_by_first_name("Ann").unwrap().is_empty());
    assert!(store.find_by_last_name("Lee").unwrap().is_empty());
    assert!(store.find_by_date_of_birth(date(1990, 5, 1)).unwrap().is_empty());

    assert_eq!(ids(&store.find_by_first_name("Anna").unwrap()), vec![id]);
    assert_eq!(ids(&store.find_by_last_name("Kim").unwrap()), vec![id]);
    assert_eq!(ids(&store.find_by_date_of_birth(date(1991, 6, 2)).unwrap()), vec![id]);
}

#[test]
fn test_edit_missing_id_is_not_found() {
    let mut store = MemoryStore::default();
    let err = store.edit_record(7, ann()).unwrap_err();
    assert_eq!(err.code(), StorageErrorCode::FcRecordNotFound);
}

// =============================================================================
// Remove / Purge
// =============================================================================

#[test]
fn test_remove_twice() {
    let mut store = MemoryStore::default();
    let id = store.create_record(ann()).unwrap();

    assert!(store.remove(id).unwrap());
    assert!(!store.remove(id).unwrap());
    assert_eq!(store.purge().unwrap(), 0);
}

#[test]
fn test_case_insensitive_search() {
    let options = StoreOptions::default().case_sensitive_search(false);
    let mut store = MemoryStore::new(options);
    store.create_record(ann()).unwrap();

    assert_eq!(store.find_by_first_name("ANN").unwrap().len(), 1);
    assert_eq!(store.find_by_last_name("lee").unwrap().len(), 1);
}

// =============================================================================
// Snapshot / Restore
// =============================================================================

#[test]
fn test_snapshot_is_a_copy() {
    let mut store = MemoryStore::default();
    store.create_record(ann()).unwrap();
    let snapshot = store.make_snapshot().unwrap();

    store.remove(1).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.records()[0].first_name, "Ann");
}

#[test]
fn test_restore_into_removed_id_inserts_at_that_id() {
    let mut store = MemoryStore::default();
    store.create_record(ann()).unwrap();
    store.create_record(bob()).unwrap();
    store.remove(1).unwrap();

    let mut restored = bob();
    restored.first_name = "Cid".to_string();
    let applied = store
        .restore(&Snapshot::new(vec![restored.with_id(1)]))
        .unwrap();

    assert_eq!(applied, 1);
    assert_eq!(ids(&store.get_records().unwrap()), vec![1, 2]);
    assert_eq!(ids(&store.find_by_first_name("Cid").unwrap()), vec![1]);
}

#[test]
fn test_restore_overwrites_live_and_skips_invalid() {
    let mut store = MemoryStore::default();
    store.create_record(ann()).unwrap();

    let mut invalid = bob();
    invalid.letter = '7';
    let snapshot = Snapshot::new(vec![bob().with_id(1), invalid.with_id(5), ann().with_id(0)]);

    assert_eq!(store.restore(&snapshot).unwrap(), 1);
    let records = store.get_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].first_name, "Bob");
    assert!(store.find_by_first_name("Ann").unwrap().is_empty());
}

#[test]
fn test_restore_advances_next_id() {
    let mut store = MemoryStore::default();
    store.restore(&Snapshot::new(vec![ann().with_id(10)])).unwrap();

    assert_eq!(store.create_record(bob()).unwrap(), 11);
}

#[test]
fn test_ids_exhausted_after_restoring_highest_id() {
    let mut store = MemoryStore::default();
    store.restore(&Snapshot::new(vec![ann().with_id(RecordId::MAX)])).unwrap();

    let err = store.create_record(bob()).unwrap_err();
    assert_eq!(err.code(), StorageErrorCode::FcIdSpaceExhausted);

    let records = store.get_records().unwrap();
    assert_eq!(ids(&records), vec![RecordId::MAX]);
    assert_eq!(records[0].first_name, "Ann");
    assert_eq!(ids(&store.find_by_first_name("Ann").unwrap()), vec![RecordId::MAX]);
    assert!(store.find_by_first_name("Bob").unwrap().is_empty());

    // Existing records stay editable
    store.edit_record(RecordId::MAX, bob()).unwrap();
    assert_eq!(store.find_by_first_name("Bob").unwrap().len(), 1);
}
