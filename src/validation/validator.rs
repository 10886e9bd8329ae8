//! Record validator
//!
//! Validation semantics:
//! - Rules are evaluated in the order they were added
//! - The first failing rule aborts validation and is reported
//! - The validator never mutates the candidate record
//!
//! Stores receive a validator at construction and call it before any write.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::errors::{ValidationError, ValidationResult};
use super::rules::{FieldRule, FieldValue};
use crate::record::RecordFields;

/// Name of the built-in preset used when nothing else is configured.
pub const DEFAULT_PRESET: &str = "default";

/// Ordered list of independent field rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordValidator {
    rules: Vec<FieldRule>,
}

impl RecordValidator {
    /// Create a validator from an explicit rule list.
    ///
    /// # Errors
    ///
    /// Returns `FC_RULES_INVALID` if any rule has inverted or empty bounds.
    pub fn new(rules: Vec<FieldRule>) -> ValidationResult<Self> {
        for rule in &rules {
            rule.check_bounds().map_err(ValidationError::rules_invalid)?;
        }
        Ok(Self { rules })
    }

    /// Validator that accepts every record.
    pub fn permissive() -> Self {
        Self { rules: Vec::new() }
    }

    /// Default rules: names 2-60, born 1950-01-01 up to today,
    /// weight 10-500, account 0-10000, alphabetic letter.
    pub fn default_rules() -> Self {
        ValidatorBuilder::new()
            .first_name(2, 60)
            .last_name(2, 60)
            .date_of_birth(date(1950, 1, 1), None)
            .weight(10, 500)
            .account(Decimal::ZERO, Decimal::from(10_000))
            .letter()
            .build_unchecked()
    }

    /// Custom rules: names 2-30, born 1930-01-01 up to today,
    /// weight 10-400, account 0-1000, alphabetic letter.
    pub fn custom_rules() -> Self {
        ValidatorBuilder::new()
            .first_name(2, 30)
            .last_name(2, 30)
            .date_of_birth(date(1930, 1, 1), None)
            .weight(10, 400)
            .account(Decimal::ZERO, Decimal::from(1_000))
            .letter()
            .build_unchecked()
    }

    /// Look up a named preset ("default" or "custom", case-insensitive).
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" => Some(Self::default_rules()),
            "custom" => Some(Self::custom_rules()),
            _ => None,
        }
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Validate a full record. First failure wins.
    pub fn validate(&self, fields: &RecordFields) -> ValidationResult<()> {
        for rule in &self.rules {
            rule.check(fields).map_err(ValidationError::failed)?;
        }
        Ok(())
    }

    /// Validate a single field value against every rule for that field.
    pub fn validate_value(&self, value: &FieldValue<'_>) -> ValidationResult<()> {
        for rule in &self.rules {
            rule.check_value(value).map_err(ValidationError::failed)?;
        }
        Ok(())
    }
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::default_rules()
    }
}

/// Fluent builder for `RecordValidator`.
#[derive(Debug, Default)]
pub struct ValidatorBuilder {
    rules: Vec<FieldRule>,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, min_len: usize, max_len: usize) -> Self {
        self.rules.push(FieldRule::FirstName { min_len, max_len });
        self
    }

    pub fn last_name(mut self, min_len: usize, max_len: usize) -> Self {
        self.rules.push(FieldRule::LastName { min_len, max_len });
        self
    }

    pub fn date_of_birth(mut self, from: NaiveDate, to: Option<NaiveDate>) -> Self {
        self.rules.push(FieldRule::DateOfBirth { from, to });
        self
    }

    pub fn weight(mut self, min: i16, max: i16) -> Self {
        self.rules.push(FieldRule::Weight { min, max });
        self
    }

    pub fn account(mut self, min: Decimal, max: Decimal) -> Self {
        self.rules.push(FieldRule::Account { min, max });
        self
    }

    pub fn letter(mut self) -> Self {
        self.rules.push(FieldRule::Letter);
        self
    }

    /// Build, checking every rule's bounds.
    pub fn build(self) -> ValidationResult<RecordValidator> {
        RecordValidator::new(self.rules)
    }

    // Presets are known-good; skip the bounds pass.
    fn build_unchecked(self) -> RecordValidator {
        RecordValidator { rules: self.rules }
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}
