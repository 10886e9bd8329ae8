//! Snapshot Export/Import Tests
//!
//! Export from one store, import into a fresh one: records and ids must
//! come back unchanged, for both formats and both engines.

use std::fs::File;
use std::io::{BufReader, BufWriter};

use chrono::NaiveDate;
use filecabinet::record::RecordFields;
use filecabinet::snapshot::{Snapshot, SnapshotFormat};
use filecabinet::storage::{FileStore, MemoryStore, RecordStore, StoreOptions};
use rust_decimal::Decimal;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn populated() -> MemoryStore {
    let mut store = MemoryStore::default();
    for fields in [
        RecordFields::new("Ann", "Lee", date(1990, 5, 1), 60, Decimal::new(100_000, 2), 'A'),
        RecordFields::new("Bob", "Lee", date(1985, 3, 3), 80, Decimal::new(50_000, 2), 'B'),
        RecordFields::new("Cid", "Moe, Jr", date(1980, 3, 3), 75, Decimal::new(1_250, 2), 'C'),
        RecordFields::new("Dorothée", "Ørsted", date(1975, 12, 31), 55, Decimal::ZERO, 'D'),
    ] {
        store.create_record(fields).unwrap();
    }
    store.remove(2).unwrap();
    store
}

fn export_to_file(
    store: &mut dyn RecordStore,
    format: SnapshotFormat,
    dir: &TempDir,
) -> std::path::PathBuf {
    let path = dir.path().join(format!("export.{}", format));
    let snapshot = store.make_snapshot().unwrap();
    snapshot
        .export(format, BufWriter::new(File::create(&path).unwrap()))
        .unwrap();
    path
}

fn import_from_file(path: &std::path::Path, format: SnapshotFormat) -> Snapshot {
    let report = Snapshot::import(format, BufReader::new(File::open(path).unwrap())).unwrap();
    assert!(report.is_clean(), "unexpected row errors: {:?}", report.errors);
    report.snapshot
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_roundtrip_into_memory_store_preserves_ids() {
    for format in [SnapshotFormat::Csv, SnapshotFormat::Xml] {
        let dir = TempDir::new().unwrap();
        let mut source = populated();
        let path = export_to_file(&mut source, format, &dir);

        let mut target = MemoryStore::default();
        let applied = target.restore(&import_from_file(&path, format)).unwrap();

        assert_eq!(applied, 3, "format {}", format);
        assert_eq!(target.get_records().unwrap(), source.get_records().unwrap());
    }
}

#[test]
fn test_roundtrip_into_file_store_preserves_ids() {
    for format in [SnapshotFormat::Csv, SnapshotFormat::Xml] {
        let dir = TempDir::new().unwrap();
        let mut source = populated();
        let path = export_to_file(&mut source, format, &dir);

        let mut target =
            FileStore::open(&dir.path().join("cabinet.db"), StoreOptions::default()).unwrap();
        target.restore(&import_from_file(&path, format)).unwrap();

        assert_eq!(target.get_records().unwrap(), source.get_records().unwrap());
        // id 2 was removed in the source, so the gap is a removed slot here
        assert_eq!(target.count_of_removed().unwrap(), 1);
    }
}

#[test]
fn test_import_overwrites_existing_ids() {
    let dir = TempDir::new().unwrap();
    let mut source = populated();
    let path = export_to_file(&mut source, SnapshotFormat::Csv, &dir);

    let mut target = MemoryStore::default();
    target
        .create_record(RecordFields::new(
            "Zed",
            "Zed",
            date(2000, 1, 1),
            70,
            Decimal::ONE,
            'Z',
        ))
        .unwrap();

    target
        .restore(&import_from_file(&path, SnapshotFormat::Csv))
        .unwrap();

    assert!(target.find_by_first_name("Zed").unwrap().is_empty());
    assert_eq!(target.find_by_first_name("Ann").unwrap()[0].id, 1);
}

#[test]
fn test_export_empty_store() {
    for format in [SnapshotFormat::Csv, SnapshotFormat::Xml] {
        let dir = TempDir::new().unwrap();
        let mut store = MemoryStore::default();
        let path = export_to_file(&mut store, format, &dir);

        assert!(import_from_file(&path, format).is_empty());
    }
}
