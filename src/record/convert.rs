//! Text to field value conversion
//!
//! Shared by the CSV/XML readers and the interactive prompts. Conversion
//! only checks that text parses; bounds belong to the validator.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::RecordId;

/// Date format used in CSV, XML and prompts (`dd/MM/yyyy`).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Text that does not parse as the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' is not {expected}")]
pub struct ConversionError {
    pub expected: &'static str,
    pub input: String,
}

impl ConversionError {
    fn new(expected: &'static str, input: &str) -> Self {
        Self {
            expected,
            input: input.to_string(),
        }
    }
}

pub type ConversionResult<T> = Result<T, ConversionError>;

pub fn parse_id(input: &str) -> ConversionResult<RecordId> {
    input
        .trim()
        .parse()
        .map_err(|_| ConversionError::new("a record id", input))
}

/// Names are taken verbatim; emptiness is a validation concern.
pub fn parse_name(input: &str) -> ConversionResult<String> {
    Ok(input.to_string())
}

/// Accepts `dd/MM/yyyy` and ISO `yyyy-MM-dd`.
pub fn parse_date(input: &str) -> ConversionResult<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| ConversionError::new("a date (dd/mm/yyyy)", input))
}

pub fn parse_weight(input: &str) -> ConversionResult<i16> {
    input
        .trim()
        .parse()
        .map_err(|_| ConversionError::new("a whole number between -32768 and 32767", input))
}

pub fn parse_account(input: &str) -> ConversionResult<Decimal> {
    Decimal::from_str(input.trim()).map_err(|_| ConversionError::new("a decimal amount", input))
}

pub fn parse_letter(input: &str) -> ConversionResult<char> {
    let mut chars = input.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => Ok(letter),
        _ => Err(ConversionError::new("a single character", input)),
    }
}

/// Format a date the way `parse_date` reads it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
