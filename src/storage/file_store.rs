//! File-backed record store
//!
//! The data file is a flat heap of fixed-size slots. Record `id` lives in
//! slot `id - 1`, so an id is derived from position:
//!
//! - create appends at EOF and fsyncs before returning
//! - edit rewrites a live slot in place
//! - remove sets the removed flag in the status word; bytes stay on disk
//! - purge rewrites the file without removed slots, renumbering survivors
//!
//! Secondary indexes are rebuilt from live slots on open and after purge.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::codec::{self, DecodedSlot, Slot, SLOT_SIZE};
use super::errors::{StorageError, StorageResult};
use super::reader::{slot_offset, SlotEntry, SlotReader};
use super::{log_restore_skip, RecordStore, StoreOptions};
use crate::index::IndexManager;
use crate::observability::Logger;
use crate::record::{Record, RecordFields, RecordId};
use crate::snapshot::Snapshot;
use crate::validation::{RecordValidator, ValidationDetails, ValidationError};

/// How far past the last slot a restored id may land.
pub const MAX_RESTORE_GAP: RecordId = 100_000;

/// Blank slots written per `write_all` while filling a gap.
const GAP_BATCH_SLOTS: usize = 256;

/// Record store persisted as fixed-size slots in a single file.
///
/// The store owns its file exclusively. Concurrent access from another
/// handle or process is unsupported.
pub struct FileStore {
    path: PathBuf,
    /// `None` once closed
    file: Option<File>,
    indexes: IndexManager,
    validator: RecordValidator,
    /// Slots in the file, live and removed
    slot_count: RecordId,
}

impl FileStore {
    /// Opens or creates the data file and rebuilds the indexes.
    ///
    /// Creates parent directories if needed.
    ///
    /// # Errors
    ///
    /// - `FC_STORAGE_IO_ERROR` if the file cannot be created or opened
    /// - `FC_DATA_CORRUPTION` if the file ends in a partial slot or a live
    ///   slot does not decode
    pub fn open(path: &Path, options: StoreOptions) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::io_error(
                        format!("Failed to create data directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                StorageError::io_error(format!("Failed to open data file: {}", path.display()), e)
            })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();

        let (slot_count, live) = {
            let mut reader = SlotReader::new(BufReader::new(&mut file), file_size)?;
            (reader.slot_count(), reader.read_live()?)
        };

        let mut indexes = IndexManager::new(options.case_sensitive_search);
        indexes.rebuild(&live);

        let path_str = path.display().to_string();
        let slots = slot_count.to_string();
        let live_count = live.len().to_string();
        Logger::info(
            "FILE_STORE_OPENED",
            &[
                ("live", live_count.as_str()),
                ("path", path_str.as_str()),
                ("slots", slots.as_str()),
            ],
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            indexes,
            validator: options.validator,
            slot_count,
        })
    }

    /// Returns the path to the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Sync and release the file handle.
    ///
    /// A second call is a no-op. Every other operation fails with
    /// `FC_STORE_CLOSED` afterwards.
    pub fn close(&mut self) -> StorageResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(|e| {
                StorageError::io_error(
                    format!("fsync failed while closing {}", self.path.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn file(&mut self) -> StorageResult<&mut File> {
        self.file.as_mut().ok_or_else(StorageError::closed)
    }

    /// Sequential reader over every slot, positioned at the first one.
    fn scan(&mut self) -> StorageResult<SlotReader<BufReader<&mut File>>> {
        let size = self.slot_count as u64 * SLOT_SIZE as u64;
        let file = self.file()?;
        SlotReader::new(BufReader::new(file), size)
    }

    fn read_slot(&mut self, id: RecordId) -> StorageResult<SlotEntry> {
        self.scan()?.read_at(id)
    }

    /// The decoded slot for `id` if it exists and is live.
    fn live_slot(&mut self, id: RecordId) -> StorageResult<Option<DecodedSlot>> {
        if id == 0 || id > self.slot_count {
            return Ok(None);
        }
        let entry = self.read_slot(id)?;
        if entry.is_removed() {
            return Ok(None);
        }
        entry.decode().map(Some)
    }

    /// Positioned write followed by fsync.
    fn write_at(&mut self, offset: u64, bytes: &[u8], what: &str) -> StorageResult<()> {
        let file = self.file()?;
        file.seek(SeekFrom::Start(offset)).map_err(|e| {
            StorageError::write_failed(format!("Failed to seek to offset {}", offset), e)
        })?;
        file.write_all(bytes)
            .map_err(|e| StorageError::write_failed(format!("Failed to write {}", what), e))?;
        file.sync_all().map_err(|e| {
            StorageError::write_failed(format!("fsync failed after writing {}", what), e)
        })
    }

    fn write_slot(&mut self, id: RecordId, slot: &Slot) -> StorageResult<()> {
        self.write_at(slot_offset(id), slot, &format!("record #{}", id))
    }

    fn find_by_ids(&mut self, ids: Vec<RecordId>) -> StorageResult<Vec<Record>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(decoded) = self.live_slot(id)? {
                records.push(decoded.record);
            }
        }
        Ok(records)
    }

    /// Write a restored record at its own id, keeping the indexes in step.
    fn restore_one(&mut self, record: &Record, slot: &Slot) -> StorageResult<()> {
        let id = record.id;

        if id <= self.slot_count {
            let old = self.live_slot(id)?;
            self.write_slot(id, slot)?;
            match old {
                Some(old) => self.indexes.rekey(&old.record, &record.fields()),
                None => self.indexes.insert(record),
            }
            return Ok(());
        }

        let first_new = self.slot_count + 1;
        if let Err(e) = self.append_after_gap(first_new, id, slot) {
            // Drop any partially written gap so the slot count stays true
            if let Ok(file) = self.file() {
                let _ = file.set_len(slot_offset(first_new));
            }
            return Err(e);
        }

        self.slot_count = id;
        self.indexes.insert(record);
        Ok(())
    }

    /// Write removed blanks for `first..id`, then `slot` at `id`, then fsync.
    fn append_after_gap(
        &mut self,
        first: RecordId,
        id: RecordId,
        slot: &Slot,
    ) -> StorageResult<()> {
        let what = format!("record #{}", id);
        let file = self.file()?;
        file.seek(SeekFrom::Start(slot_offset(first))).map_err(|e| {
            StorageError::write_failed(format!("Failed to seek to slot {}", first), e)
        })?;

        let mut batch = Vec::with_capacity(GAP_BATCH_SLOTS * SLOT_SIZE);
        for gap in first..id {
            batch.extend_from_slice(&codec::blank_removed(gap));
            if batch.len() == GAP_BATCH_SLOTS * SLOT_SIZE {
                file.write_all(&batch).map_err(|e| {
                    StorageError::write_failed(format!("Failed to fill gap before {}", what), e)
                })?;
                batch.clear();
            }
        }
        batch.extend_from_slice(slot);

        file.write_all(&batch)
            .map_err(|e| StorageError::write_failed(format!("Failed to write {}", what), e))?;
        file.sync_all().map_err(|e| {
            StorageError::write_failed(format!("fsync failed after writing {}", what), e)
        })
    }

    /// Rejects ids that are zero or too far past the last slot.
    fn check_restore_id(&self, id: RecordId) -> Result<(), ValidationError> {
        let limit = self.slot_count.saturating_add(MAX_RESTORE_GAP);
        let expected = if id == 0 {
            "a positive id".to_string()
        } else if id > limit {
            format!("an id of at most {}", limit)
        } else {
            return Ok(());
        };
        Err(ValidationError::failed(ValidationDetails::new("id", expected, id.to_string())))
    }
}

impl RecordStore for FileStore {
    fn create_record(&mut self, fields: RecordFields) -> StorageResult<RecordId> {
        self.file()?;
        self.validator.validate(&fields)?;

        let id = self.slot_count + 1;
        let slot = codec::encode(id, &fields)?;
        self.write_slot(id, &slot)?;

        self.slot_count = id;
        self.indexes.insert(&fields.with_id(id));
        Ok(id)
    }

    fn edit_record(&mut self, id: RecordId, fields: RecordFields) -> StorageResult<()> {
        self.file()?;
        let old = self
            .live_slot(id)?
            .ok_or_else(|| StorageError::not_found(id))?;

        self.validator.validate(&fields)?;

        let slot = codec::encode(id, &fields)?;
        self.write_slot(id, &slot)?;
        self.indexes.rekey(&old.record, &fields);
        Ok(())
    }

    fn remove(&mut self, id: RecordId) -> StorageResult<bool> {
        self.file()?;
        let decoded = match self.live_slot(id)? {
            Some(decoded) => decoded,
            None => return Ok(false),
        };

        let status = codec::mark_removed(decoded.status);
        let what = format!("status of record #{}", id);
        self.write_at(slot_offset(id), &status.to_le_bytes(), &what)?;
        self.indexes.remove(&decoded.record);
        Ok(true)
    }

    fn get_records(&mut self) -> StorageResult<Vec<Record>> {
        self.scan()?.read_live()
    }

    fn get_stat(&mut self) -> StorageResult<usize> {
        self.file()?;
        Ok(self.slot_count as usize)
    }

    fn count_of_removed(&mut self) -> StorageResult<usize> {
        self.scan()?.count_removed()
    }

    fn find_by_first_name(&mut self, first_name: &str) -> StorageResult<Vec<Record>> {
        self.file()?;
        let ids = self.indexes.lookup_first_name(first_name);
        self.find_by_ids(ids)
    }

    fn find_by_last_name(&mut self, last_name: &str) -> StorageResult<Vec<Record>> {
        self.file()?;
        let ids = self.indexes.lookup_last_name(last_name);
        self.find_by_ids(ids)
    }

    fn find_by_date_of_birth(&mut self, date_of_birth: NaiveDate) -> StorageResult<Vec<Record>> {
        self.file()?;
        let ids = self.indexes.lookup_date_of_birth(date_of_birth);
        self.find_by_ids(ids)
    }

    fn make_snapshot(&mut self) -> StorageResult<Snapshot> {
        Ok(Snapshot::new(self.get_records()?))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StorageResult<usize> {
        self.file()?;
        let mut applied = 0;

        for incoming in snapshot.records() {
            let checked: StorageResult<Slot> = self
                .check_restore_id(incoming.id)
                .and_then(|_| self.validator.validate(&incoming.fields()))
                .map_err(StorageError::from)
                .and_then(|_| codec::encode(incoming.id, &incoming.fields()));
            let slot = match checked {
                Ok(slot) => slot,
                Err(e) => {
                    log_restore_skip(incoming.id, &e);
                    continue;
                }
            };

            self.restore_one(incoming, &slot)?;
            applied += 1;
        }

        Ok(applied)
    }

    fn purge(&mut self) -> StorageResult<usize> {
        let mut kept = Vec::new();
        let mut live = Vec::new();
        let mut dropped = 0;

        {
            let mut reader = self.scan()?;
            while let Some(mut entry) = reader.read_next()? {
                if entry.is_removed() {
                    dropped += 1;
                    continue;
                }
                let mut record = entry.decode()?.record;
                let new_id = live.len() as RecordId + 1;
                codec::write_id(&mut entry.bytes, new_id);
                record.id = new_id;
                kept.extend_from_slice(&entry.bytes);
                live.push(record);
            }
        }

        if dropped == 0 {
            return Ok(0);
        }

        let file = self.file()?;
        file.set_len(0)
            .map_err(|e| StorageError::write_failed("Failed to truncate data file", e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| StorageError::write_failed("Failed to rewind data file", e))?;
        file.write_all(&kept)
            .map_err(|e| StorageError::write_failed("Failed to write compacted slots", e))?;
        file.sync_all()
            .map_err(|e| StorageError::write_failed("fsync failed after purge", e))?;

        self.slot_count = live.len() as RecordId;
        self.indexes.rebuild(&live);

        let dropped_str = dropped.to_string();
        let live_str = live.len().to_string();
        Logger::info(
            "FILE_STORE_PURGED",
            &[("dropped", dropped_str.as_str()), ("live", live_str.as_str())],
        );

        Ok(dropped)
    }

    fn close(&mut self) -> StorageResult<()> {
        FileStore::close(self)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
