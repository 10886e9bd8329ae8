//! Fixed-width slot codec
//!
//! Every record occupies exactly `SLOT_SIZE` bytes, little-endian:
//!
//! ```text
//! offset  size  field
//! ------  ----  -----------------------------------------------
//!      0     2  status word (byte 0, bit 2 = removed)
//!      2     4  id (i32)
//!      6   120  first name, 60 UTF-16 code units, zero filled
//!    126   120  last name, 60 UTF-16 code units, zero filled
//!    246    12  year, month, day (3 x i32)
//!    258     2  weight (i16)
//!    260    16  account: lo, mid, hi, flags (4 x u32)
//!    276     2  letter (one UTF-16 code unit)
//! ```
//!
//! There is no header, magic or version. The status word is opaque to
//! `decode`; only `is_removed` and `mark_removed` interpret it.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::errors::{StorageError, StorageResult};
use crate::record::{Record, RecordFields, RecordId};

/// Size of one slot in bytes.
pub const SLOT_SIZE: usize = 278;

/// Maximum length of a name field in UTF-16 code units.
pub const NAME_UNITS: usize = 60;

/// Status bit marking a slot as removed.
pub const REMOVED_FLAG: u16 = 0b0100;

const STATUS_OFFSET: usize = 0;
const ID_OFFSET: usize = 2;
const FIRST_NAME_OFFSET: usize = 6;
const LAST_NAME_OFFSET: usize = FIRST_NAME_OFFSET + NAME_UNITS * 2;
const DATE_OFFSET: usize = LAST_NAME_OFFSET + NAME_UNITS * 2;
const WEIGHT_OFFSET: usize = DATE_OFFSET + 12;
const ACCOUNT_OFFSET: usize = WEIGHT_OFFSET + 2;
const LETTER_OFFSET: usize = ACCOUNT_OFFSET + 16;

/// Highest scale a 96-bit decimal can carry.
const MAX_DECIMAL_SCALE: u32 = 28;
const DECIMAL_SIGN_BIT: u32 = 0x8000_0000;
const DECIMAL_SCALE_MASK: u32 = 0x00FF_0000;

/// One encoded slot.
pub type Slot = [u8; SLOT_SIZE];

/// A decoded slot: the raw status word and the record it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSlot {
    pub status: u16,
    pub record: Record,
}

/// Returns whether a status word carries the removed flag.
pub fn is_removed(status: u16) -> bool {
    status & REMOVED_FLAG != 0
}

/// Returns the status word with the removed flag set, other bits kept.
pub fn mark_removed(status: u16) -> u16 {
    status | REMOVED_FLAG
}

/// Read the status word without decoding the rest of the slot.
pub fn read_status(slot: &Slot) -> u16 {
    read_u16(slot, STATUS_OFFSET)
}

/// Overwrite the status word in place.
pub fn write_status(slot: &mut Slot, status: u16) {
    slot[STATUS_OFFSET..STATUS_OFFSET + 2].copy_from_slice(&status.to_le_bytes());
}

/// Overwrite the stored id in place. Used by purge when slots shift down.
pub fn write_id(slot: &mut Slot, id: RecordId) {
    slot[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&(id as i32).to_le_bytes());
}

/// Encode a record into a fresh slot with a zero status word.
///
/// # Errors
///
/// `FC_STORAGE_WRITE_FAILED` if a name exceeds `NAME_UNITS` code units,
/// the letter is outside the BMP, or the id does not fit an i32.
pub fn encode(id: RecordId, fields: &RecordFields) -> StorageResult<Slot> {
    let stored_id = i32::try_from(id).map_err(|_| {
        StorageError::write_failed_no_source(format!("Record id {} does not fit a slot", id))
    })?;

    let mut slot = [0u8; SLOT_SIZE];
    slot[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&stored_id.to_le_bytes());

    write_name(&mut slot, FIRST_NAME_OFFSET, "first_name", &fields.first_name)?;
    write_name(&mut slot, LAST_NAME_OFFSET, "last_name", &fields.last_name)?;

    let date = fields.date_of_birth;
    let (month, day) = (date.month() as i32, date.day() as i32);
    slot[DATE_OFFSET..DATE_OFFSET + 4].copy_from_slice(&date.year().to_le_bytes());
    slot[DATE_OFFSET + 4..DATE_OFFSET + 8].copy_from_slice(&month.to_le_bytes());
    slot[DATE_OFFSET + 8..DATE_OFFSET + 12].copy_from_slice(&day.to_le_bytes());

    slot[WEIGHT_OFFSET..WEIGHT_OFFSET + 2].copy_from_slice(&fields.weight.to_le_bytes());

    // rust_decimal serializes as flags, lo, mid, hi; the slot stores lo, mid, hi, flags.
    let raw = fields.account.serialize();
    slot[ACCOUNT_OFFSET..ACCOUNT_OFFSET + 12].copy_from_slice(&raw[4..16]);
    slot[ACCOUNT_OFFSET + 12..ACCOUNT_OFFSET + 16].copy_from_slice(&raw[0..4]);

    let mut unit = [0u16; 2];
    let encoded = fields.letter.encode_utf16(&mut unit);
    if encoded.len() != 1 {
        return Err(StorageError::write_failed_no_source(format!(
            "Letter '{}' does not fit one UTF-16 code unit",
            fields.letter
        )));
    }
    slot[LETTER_OFFSET..LETTER_OFFSET + 2].copy_from_slice(&unit[0].to_le_bytes());

    Ok(slot)
}

/// A blank slot flagged removed, used to fill gaps past the end of file.
pub fn blank_removed(id: RecordId) -> Slot {
    let mut slot = [0u8; SLOT_SIZE];
    write_status(&mut slot, mark_removed(0));
    write_id(&mut slot, id);
    slot
}

/// Decode a slot.
///
/// # Errors
///
/// `FC_DATA_CORRUPTION` for a non-positive id, invalid UTF-16, an
/// impossible date, or a malformed decimal.
pub fn decode(slot: &Slot) -> StorageResult<DecodedSlot> {
    let status = read_status(slot);

    let stored_id = read_i32(slot, ID_OFFSET);
    if stored_id < 1 {
        return Err(StorageError::data_corruption(format!(
            "Invalid record id {}",
            stored_id
        )));
    }

    let first_name = read_name(slot, FIRST_NAME_OFFSET, "first_name")?;
    let last_name = read_name(slot, LAST_NAME_OFFSET, "last_name")?;

    let year = read_i32(slot, DATE_OFFSET);
    let month = read_i32(slot, DATE_OFFSET + 4);
    let day = read_i32(slot, DATE_OFFSET + 8);
    let date_of_birth = u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .ok_or_else(|| {
            StorageError::data_corruption(format!(
                "Invalid date of birth {}-{}-{} in record {}",
                year, month, day, stored_id
            ))
        })?;

    let weight = i16::from_le_bytes([slot[WEIGHT_OFFSET], slot[WEIGHT_OFFSET + 1]]);
    let account = read_decimal(slot, stored_id)?;

    let letter_unit = read_u16(slot, LETTER_OFFSET);
    let letter = char::from_u32(letter_unit as u32).ok_or_else(|| {
        StorageError::data_corruption(format!(
            "Invalid letter code unit {:#06x} in record {}",
            letter_unit, stored_id
        ))
    })?;

    let fields = RecordFields::new(first_name, last_name, date_of_birth, weight, account, letter);

    Ok(DecodedSlot {
        status,
        record: fields.with_id(stored_id as RecordId),
    })
}

fn write_name(slot: &mut Slot, offset: usize, field: &str, value: &str) -> StorageResult<()> {
    let units: Vec<u16> = value.encode_utf16().collect();
    if units.len() > NAME_UNITS {
        return Err(StorageError::write_failed_no_source(format!(
            "{} is {} UTF-16 code units long, slot holds {}",
            field,
            units.len(),
            NAME_UNITS
        )));
    }
    for (i, unit) in units.iter().enumerate() {
        let at = offset + i * 2;
        slot[at..at + 2].copy_from_slice(&unit.to_le_bytes());
    }
    Ok(())
}

fn read_name(slot: &Slot, offset: usize, field: &str) -> StorageResult<String> {
    let units: Vec<u16> = (0..NAME_UNITS)
        .map(|i| read_u16(slot, offset + i * 2))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16(&units)
        .map_err(|e| StorageError::data_corruption(format!("Invalid UTF-16 in {}: {}", field, e)))
}

fn read_decimal(slot: &Slot, id: i32) -> StorageResult<Decimal> {
    let lo = read_u32(slot, ACCOUNT_OFFSET);
    let mid = read_u32(slot, ACCOUNT_OFFSET + 4);
    let hi = read_u32(slot, ACCOUNT_OFFSET + 8);
    let flags = read_u32(slot, ACCOUNT_OFFSET + 12);

    let scale = (flags & DECIMAL_SCALE_MASK) >> 16;
    if flags & !(DECIMAL_SIGN_BIT | DECIMAL_SCALE_MASK) != 0 || scale > MAX_DECIMAL_SCALE {
        return Err(StorageError::data_corruption(format!(
            "Invalid account flags {:#010x} in record {}",
            flags, id
        )));
    }

    Ok(Decimal::from_parts(lo, mid, hi, flags & DECIMAL_SIGN_BIT != 0, scale))
}

fn read_u16(slot: &Slot, offset: usize) -> u16 {
    u16::from_le_bytes([slot[offset], slot[offset + 1]])
}

fn read_i32(slot: &Slot, offset: usize) -> i32 {
    i32::from_le_bytes([slot[offset], slot[offset + 1], slot[offset + 2], slot[offset + 3]])
}

fn read_u32(slot: &Slot, offset: usize) -> u32 {
    u32::from_le_bytes([slot[offset], slot[offset + 1], slot[offset + 2], slot[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::errors::StorageErrorCode;
    use std::str::FromStr;

    fn ann() -> RecordFields {
        RecordFields::new(
            "Ann",
            "Lee",
            NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            60,
            Decimal::from_str("1000.00").unwrap(),
            'A',
        )
    }

    #[test]
    fn test_field_offsets() {
        assert_eq!(LAST_NAME_OFFSET, 126);
        assert_eq!(DATE_OFFSET, 246);
        assert_eq!(WEIGHT_OFFSET, 258);
        assert_eq!(ACCOUNT_OFFSET, 260);
        assert_eq!(LETTER_OFFSET + 2, SLOT_SIZE);
    }

    #[test]
    fn test_encode_decode_preserves_record() {
        let slot = encode(7, &ann()).unwrap();
        let decoded = decode(&slot).unwrap();

        assert_eq!(decoded.status, 0);
        assert_eq!(decoded.record, ann().with_id(7));
        // scale survives, so "1000.00" prints as written
        assert_eq!(decoded.record.account.to_string(), "1000.00");
    }

    #[test]
    fn test_byte_layout() {
        let slot = encode(1, &ann()).unwrap();

        assert_eq!(&slot[0..2], &[0, 0]);
        assert_eq!(&slot[2..6], &1i32.to_le_bytes());
        assert_eq!(&slot[6..8], &(b'A' as u16).to_le_bytes());
        assert_eq!(&slot[12..14], &[0, 0]);
        assert_eq!(&slot[246..250], &1990i32.to_le_bytes());
        assert_eq!(&slot[250..254], &5i32.to_le_bytes());
        assert_eq!(&slot[254..258], &1i32.to_le_bytes());
        assert_eq!(&slot[258..260], &60i16.to_le_bytes());
        // 1000.00 = 100000 with scale 2
        assert_eq!(&slot[260..264], &100_000u32.to_le_bytes());
        assert_eq!(&slot[264..272], &[0u8; 8]);
        assert_eq!(&slot[272..276], &(2u32 << 16).to_le_bytes());
        assert_eq!(&slot[276..278], &(b'A' as u16).to_le_bytes());
    }

    #[test]
    fn test_negative_account() {
        let mut fields = ann();
        fields.account = Decimal::from_str("-12.5").unwrap();
        let decoded = decode(&encode(3, &fields).unwrap()).unwrap();
        assert_eq!(decoded.record.account, fields.account);
    }

    #[test]
    fn test_name_at_capacity() {
        let mut fields = ann();
        fields.first_name = "x".repeat(NAME_UNITS);
        let decoded = decode(&encode(1, &fields).unwrap()).unwrap();
        assert_eq!(decoded.record.first_name.len(), NAME_UNITS);
    }

    #[test]
    fn test_name_too_long_rejected() {
        let mut fields = ann();
        fields.last_name = "y".repeat(NAME_UNITS + 1);
        let err = encode(1, &fields).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::FcStorageWriteFailed);
    }

    #[test]
    fn test_letter_outside_bmp_rejected() {
        let mut fields = ann();
        fields.letter = '𝔸';
        assert!(encode(1, &fields).is_err());
    }

    #[test]
    fn test_removed_flag_helpers() {
        assert!(!is_removed(0));
        assert!(is_removed(mark_removed(0)));
        // other bits are preserved
        assert_eq!(mark_removed(0b0001), 0b0101);
        assert!(is_removed(0b0100));
        assert!(!is_removed(0b0011));
    }

    #[test]
    fn test_decode_returns_status_untouched() {
        let mut slot = encode(2, &ann()).unwrap();
        let status = mark_removed(read_status(&slot));
        write_status(&mut slot, status);

        let decoded = decode(&slot).unwrap();
        assert!(is_removed(decoded.status));
        assert_eq!(decoded.record.id, 2);
    }

    #[test]
    fn test_invalid_date_is_corruption() {
        let mut slot = encode(1, &ann()).unwrap();
        slot[250..254].copy_from_slice(&13i32.to_le_bytes());

        let err = decode(&slot).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.code(), StorageErrorCode::FcDataCorruption);
    }

    #[test]
    fn test_decimal_scale_out_of_range_is_corruption() {
        let mut slot = encode(1, &ann()).unwrap();
        slot[272..276].copy_from_slice(&(29u32 << 16).to_le_bytes());
        assert!(decode(&slot).unwrap_err().is_fatal());
    }

    #[test]
    fn test_unpaired_surrogate_is_corruption() {
        let mut slot = encode(1, &ann()).unwrap();
        slot[6..8].copy_from_slice(&0xD800u16.to_le_bytes());
        assert!(decode(&slot).unwrap_err().is_fatal());
    }

    #[test]
    fn test_write_id_rewrites_stored_id() {
        let mut slot = encode(9, &ann()).unwrap();
        write_id(&mut slot, 4);
        assert_eq!(decode(&slot).unwrap().record.id, 4);
    }

    #[test]
    fn test_blank_removed_slot() {
        let slot = blank_removed(5);
        assert!(is_removed(read_status(&slot)));
        assert_eq!(read_i32(&slot, ID_OFFSET), 5);
    }
}
