//! Field rules
//!
//! Each rule is an independent predicate plus its bounds. Rules know which
//! field they guard and ignore values of other fields.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::ValidationDetails;
use crate::record::RecordFields;

/// A single candidate value, tagged with the field it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    FirstName(&'a str),
    LastName(&'a str),
    DateOfBirth(NaiveDate),
    Weight(i16),
    Account(Decimal),
    Letter(char),
}

impl FieldValue<'_> {
    /// Field name as reported in validation errors
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldValue::FirstName(_) => "first_name",
            FieldValue::LastName(_) => "last_name",
            FieldValue::DateOfBirth(_) => "date_of_birth",
            FieldValue::Weight(_) => "weight",
            FieldValue::Account(_) => "account",
            FieldValue::Letter(_) => "letter",
        }
    }
}

/// One bound check on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    FirstName { min_len: usize, max_len: usize },
    LastName { min_len: usize, max_len: usize },
    /// `to: None` means "today", evaluated at check time.
    DateOfBirth {
        from: NaiveDate,
        #[serde(default)]
        to: Option<NaiveDate>,
    },
    Weight { min: i16, max: i16 },
    Account { min: Decimal, max: Decimal },
    Letter,
}

impl FieldRule {
    /// Name of the field this rule guards
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldRule::FirstName { .. } => "first_name",
            FieldRule::LastName { .. } => "last_name",
            FieldRule::DateOfBirth { .. } => "date_of_birth",
            FieldRule::Weight { .. } => "weight",
            FieldRule::Account { .. } => "account",
            FieldRule::Letter => "letter",
        }
    }

    /// Check the rule against a full set of record fields.
    pub fn check(&self, fields: &RecordFields) -> Result<(), ValidationDetails> {
        let value = match self {
            FieldRule::FirstName { .. } => FieldValue::FirstName(&fields.first_name),
            FieldRule::LastName { .. } => FieldValue::LastName(&fields.last_name),
            FieldRule::DateOfBirth { .. } => FieldValue::DateOfBirth(fields.date_of_birth),
            FieldRule::Weight { .. } => FieldValue::Weight(fields.weight),
            FieldRule::Account { .. } => FieldValue::Account(fields.account),
            FieldRule::Letter => FieldValue::Letter(fields.letter),
        };
        self.check_value(&value)
    }

    /// Check a single value. Values for other fields pass.
    pub fn check_value(&self, value: &FieldValue<'_>) -> Result<(), ValidationDetails> {
        match (self, value) {
            (FieldRule::FirstName { min_len, max_len }, FieldValue::FirstName(name))
            | (FieldRule::LastName { min_len, max_len }, FieldValue::LastName(name)) => {
                check_name(value.field_name(), name, *min_len, *max_len)
            }
            (FieldRule::DateOfBirth { from, to }, FieldValue::DateOfBirth(date)) => {
                let to = to.unwrap_or_else(|| Local::now().date_naive());
                if date < from || *date > to {
                    return Err(ValidationDetails::out_of_range(
                        "date_of_birth",
                        from,
                        to,
                        date,
                    ));
                }
                Ok(())
            }
            (FieldRule::Weight { min, max }, FieldValue::Weight(weight)) => {
                if weight < min || weight > max {
                    return Err(ValidationDetails::out_of_range("weight", min, max, weight));
                }
                Ok(())
            }
            (FieldRule::Account { min, max }, FieldValue::Account(account)) => {
                if account < min || account > max {
                    return Err(ValidationDetails::out_of_range("account", min, max, account));
                }
                Ok(())
            }
            (FieldRule::Letter, FieldValue::Letter(letter)) => {
                // One UTF-16 unit: the slot layout reserves exactly two bytes.
                if !letter.is_alphabetic() || letter.len_utf16() != 1 {
                    return Err(ValidationDetails::new(
                        "letter",
                        "a single alphabetic character",
                        format!("'{}'", letter),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Returns details if the rule's own bounds are inconsistent.
    pub fn check_bounds(&self) -> Result<(), ValidationDetails> {
        let inverted = match self {
            FieldRule::FirstName { min_len, max_len }
            | FieldRule::LastName { min_len, max_len } => min_len > max_len || *min_len == 0,
            FieldRule::DateOfBirth { from, to } => to.map_or(false, |to| *from > to),
            FieldRule::Weight { min, max } => min > max,
            FieldRule::Account { min, max } => min > max,
            FieldRule::Letter => false,
        };
        if inverted {
            return Err(ValidationDetails::new(
                self.field_name(),
                "non-empty range with min <= max",
                format!("{:?}", self),
            ));
        }
        Ok(())
    }
}

fn check_name(
    field: &str,
    name: &str,
    min_len: usize,
    max_len: usize,
) -> Result<(), ValidationDetails> {
    if name.trim().is_empty() {
        return Err(ValidationDetails::blank(field));
    }
    let len = name.chars().count();
    if len < min_len || len > max_len {
        return Err(ValidationDetails::new(
            field,
            format!("length between {} and {}", min_len, max_len),
            format!("length {}", len),
        ));
    }
    Ok(())
}
