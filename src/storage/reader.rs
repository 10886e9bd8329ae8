//! Sequential slot reader
//!
//! Used for every whole-file pass of the file store: the index rebuild on
//! open, listing, purge and counting removed slots. A file whose length is
//! not a multiple of `SLOT_SIZE` is corrupt and is refused up front.

use std::io::{Read, Seek, SeekFrom};

use super::codec::{self, DecodedSlot, Slot, SLOT_SIZE};
use super::errors::{StorageError, StorageResult};
use crate::record::{Record, RecordId};

/// One raw slot as read from disk.
#[derive(Debug, Clone)]
pub struct SlotEntry {
    /// 1-based slot position; equals the id of the record stored there.
    pub position: RecordId,
    pub bytes: Slot,
}

impl SlotEntry {
    pub fn status(&self) -> u16 {
        codec::read_status(&self.bytes)
    }

    pub fn is_removed(&self) -> bool {
        codec::is_removed(self.status())
    }

    /// Decode the slot, checking the stored id against the slot position.
    pub fn decode(&self) -> StorageResult<DecodedSlot> {
        let decoded = codec::decode(&self.bytes).map_err(|e| {
            StorageError::corruption_at_offset(self.offset(), e.message().to_string())
        })?;
        if decoded.record.id != self.position {
            return Err(StorageError::corruption_at_offset(
                self.offset(),
                format!(
                    "Stored id {} does not match slot position {}",
                    decoded.record.id, self.position
                ),
            ));
        }
        Ok(decoded)
    }

    /// Byte offset of this slot in the file.
    pub fn offset(&self) -> u64 {
        slot_offset(self.position)
    }
}

/// Byte offset of the slot holding `id`.
pub fn slot_offset(id: RecordId) -> u64 {
    (id as u64 - 1) * SLOT_SIZE as u64
}

/// Slot reader over any seekable byte source.
pub struct SlotReader<R> {
    reader: R,
    /// Position of the next slot to read (1-based)
    next_position: RecordId,
    slot_count: RecordId,
}

impl<R: Read + Seek> SlotReader<R> {
    /// Wraps a reader over `file_size` bytes of slots and rewinds it.
    ///
    /// # Errors
    ///
    /// `FC_DATA_CORRUPTION` if the size leaves a trailing partial slot.
    pub fn new(mut reader: R, file_size: u64) -> StorageResult<Self> {
        let remainder = file_size % SLOT_SIZE as u64;
        if remainder != 0 {
            return Err(StorageError::corruption_at_offset(
                file_size - remainder,
                format!(
                    "Trailing partial slot: {} bytes, slot size is {}",
                    remainder, SLOT_SIZE
                ),
            ));
        }

        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| StorageError::read_failed("Failed to rewind data file", e))?;

        Ok(Self {
            reader,
            next_position: 1,
            slot_count: (file_size / SLOT_SIZE as u64) as RecordId,
        })
    }

    /// Number of slots in the file, live and removed.
    pub fn slot_count(&self) -> RecordId {
        self.slot_count
    }

    /// Reads the next slot.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(entry))` if a slot was read
    /// - `Ok(None)` at end of file
    pub fn read_next(&mut self) -> StorageResult<Option<SlotEntry>> {
        if self.next_position > self.slot_count {
            return Ok(None);
        }

        let position = self.next_position;
        let mut bytes = [0u8; SLOT_SIZE];
        self.reader.read_exact(&mut bytes).map_err(|e| {
            StorageError::read_failed(format!("Failed to read slot {}", position), e)
        })?;

        self.next_position += 1;
        Ok(Some(SlotEntry { position, bytes }))
    }

    /// Reads the slot at a 1-based position.
    pub fn read_at(&mut self, position: RecordId) -> StorageResult<SlotEntry> {
        if position == 0 || position > self.slot_count {
            return Err(StorageError::not_found(position));
        }
        self.reader
            .seek(SeekFrom::Start(slot_offset(position)))
            .map_err(|e| {
                StorageError::read_failed(format!("Failed to seek to slot {}", position), e)
            })?;
        self.next_position = position;
        match self.read_next()? {
            Some(entry) => Ok(entry),
            None => Err(StorageError::not_found(position)),
        }
    }

    /// Decodes every live slot in slot order. Removed slots are skipped
    /// without being decoded.
    pub fn read_live(&mut self) -> StorageResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(entry) = self.read_next()? {
            if !entry.is_removed() {
                records.push(entry.decode()?.record);
            }
        }
        Ok(records)
    }

    /// Counts slots carrying the removed flag.
    pub fn count_removed(&mut self) -> StorageResult<usize> {
        let mut removed = 0;
        while let Some(entry) = self.read_next()? {
            if entry.is_removed() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
