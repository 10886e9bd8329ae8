//! Line-oriented console I/O for the shell
//!
//! Input and output are generic so the shell can run against stdin/stdout
//! or in-memory buffers. End of input is reported as `None`, never as an
//! error.

use std::io::{BufRead, Write};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::errors::CliResult;
use crate::record::{self, ConversionResult, RecordFields};
use crate::validation::{FieldValue, RecordValidator};

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Read one line without its terminator. `None` at end of input.
    pub fn read_line(&mut self) -> CliResult<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub fn write_line(&mut self, text: impl AsRef<str>) -> CliResult<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        Ok(())
    }

    /// Print `label` without a newline and read the answer.
    pub fn prompt(&mut self, label: &str) -> CliResult<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Prompt until the text converts and the value passes `check`.
    pub fn read_value<T>(
        &mut self,
        label: &str,
        convert: fn(&str) -> ConversionResult<T>,
        check: impl Fn(&T) -> Result<(), String>,
    ) -> CliResult<Option<T>> {
        loop {
            let text = match self.prompt(label)? {
                Some(text) => text,
                None => return Ok(None),
            };

            let value = match convert(&text) {
                Ok(value) => value,
                Err(e) => {
                    self.write_line(format!(
                        "Conversion failed: {}. Please, correct your input.",
                        e
                    ))?;
                    continue;
                }
            };

            match check(&value) {
                Ok(()) => return Ok(Some(value)),
                Err(reason) => self.write_line(format!(
                    "Validation failed: {}. Please, correct your input.",
                    reason
                ))?,
            }
        }
    }

    /// Prompt for all six record fields, each checked by `validator`.
    pub fn read_fields(&mut self, validator: &RecordValidator) -> CliResult<Option<RecordFields>> {
        let Some(first_name) = self.read_value("First name: ", record::parse_name, |v: &String| {
            check(validator, FieldValue::FirstName(v))
        })?
        else {
            return Ok(None);
        };
        let Some(last_name) = self.read_value("Last name: ", record::parse_name, |v: &String| {
            check(validator, FieldValue::LastName(v))
        })?
        else {
            return Ok(None);
        };
        let Some(date_of_birth) =
            self.read_value("Date of birth: ", record::parse_date, |v: &NaiveDate| {
                check(validator, FieldValue::DateOfBirth(*v))
            })?
        else {
            return Ok(None);
        };
        let Some(weight) = self.read_value("Weight: ", record::parse_weight, |v: &i16| {
            check(validator, FieldValue::Weight(*v))
        })?
        else {
            return Ok(None);
        };
        let Some(account) = self.read_value("Account: ", record::parse_account, |v: &Decimal| {
            check(validator, FieldValue::Account(*v))
        })?
        else {
            return Ok(None);
        };
        let Some(letter) = self.read_value("Letter: ", record::parse_letter, |v: &char| {
            check(validator, FieldValue::Letter(*v))
        })?
        else {
            return Ok(None);
        };

        Ok(Some(RecordFields::new(
            first_name,
            last_name,
            date_of_birth,
            weight,
            account,
            letter,
        )))
    }
}

fn check(validator: &RecordValidator, value: FieldValue<'_>) -> Result<(), String> {
    validator
        .validate_value(&value)
        .map_err(|e| e.details().to_string())
}
