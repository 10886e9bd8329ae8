//! Record types for filecabinet
//!
//! A record is the single persisted entity of the cabinet. Stores assign the
//! id; every other field comes from the caller as a `RecordFields` value.

mod convert;

pub use convert::{
    format_date, parse_account, parse_date, parse_id, parse_letter, parse_name, parse_weight,
    ConversionError, ConversionResult, DATE_FORMAT,
};

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Record identifier. Always >= 1 for a stored record.
pub type RecordId = u32;

/// Caller-supplied values for a record (everything except the id).
///
/// This is the parameter object passed to `create_record` and `edit_record`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub weight: i16,
    pub account: Decimal,
    pub letter: char,
}

impl RecordFields {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        weight: i16,
        account: Decimal,
        letter: char,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            weight,
            account,
            letter,
        }
    }

    /// Attach an id, producing a full record.
    pub fn with_id(self, id: RecordId) -> Record {
        Record {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            weight: self.weight,
            account: self.account,
            letter: self.letter,
        }
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub weight: i16,
    pub account: Decimal,
    pub letter: char,
}

impl Record {
    /// Returns a copy of the record's fields without the id.
    pub fn fields(&self) -> RecordFields {
        RecordFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            weight: self.weight,
            account: self.account,
            letter: self.letter,
        }
    }

    /// Overwrite every field except the id.
    pub fn apply(&mut self, fields: RecordFields) {
        self.first_name = fields.first_name;
        self.last_name = fields.last_name;
        self.date_of_birth = fields.date_of_birth;
        self.weight = fields.weight;
        self.account = fields.account;
        self.letter = fields.letter;
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}, {}, {}, {}, {}, {}, {}",
            self.id,
            self.first_name,
            self.last_name,
            self.date_of_birth.format("%Y-%b-%d"),
            self.weight,
            self.account,
            self.letter
        )
    }
}
