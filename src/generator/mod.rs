//! Random record generator
//!
//! Produces records that pass the default validation preset, numbered
//! consecutively from a start id, and hands them out as a `Snapshot` so the
//! regular CSV/XML writers can persist them.

use chrono::{Duration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::record::{Record, RecordFields, RecordId};
use crate::snapshot::Snapshot;

const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=12;
const WEIGHT: std::ops::RangeInclusive<i16> = 10..=500;
/// Account in cents, 0.00 to 10000.00
const ACCOUNT_CENTS: std::ops::RangeInclusive<i64> = 0..=1_000_000;

fn earliest_birth() -> NaiveDate {
    NaiveDate::from_ymd_opt(1950, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Generates random, valid records.
pub struct RecordGenerator<R = StdRng> {
    rng: R,
}

impl RecordGenerator<StdRng> {
    /// Generator seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator, same seed gives the same records.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for RecordGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RecordGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate `amount` records with ids `start_id, start_id + 1, ...`.
    ///
    /// Returns `None` if the id range would overflow.
    pub fn generate(&mut self, start_id: RecordId, amount: u32) -> Option<Snapshot> {
        if start_id == 0 {
            return None;
        }
        start_id.checked_add(amount)?;

        let records = (0..amount)
            .map(|offset| self.record(start_id + offset))
            .collect();
        Some(Snapshot::new(records))
    }

    pub fn record(&mut self, id: RecordId) -> Record {
        self.fields().with_id(id)
    }

    pub fn fields(&mut self) -> RecordFields {
        let first_name = self.name();
        let last_name = self.name();
        let date_of_birth = self.date_of_birth();
        let weight = self.rng.gen_range(WEIGHT);
        let account = Decimal::new(self.rng.gen_range(ACCOUNT_CENTS), 2);
        let letter = self.rng.gen_range(b'A'..=b'Z') as char;

        RecordFields::new(first_name, last_name, date_of_birth, weight, account, letter)
    }

    fn name(&mut self) -> String {
        let len = self.rng.gen_range(NAME_LEN);
        let mut name = String::with_capacity(len);
        name.push(self.rng.gen_range(b'A'..=b'Z') as char);
        for _ in 1..len {
            name.push(self.rng.gen_range(b'a'..=b'z') as char);
        }
        name
    }

    fn date_of_birth(&mut self) -> NaiveDate {
        let from = earliest_birth();
        let today = Local::now().date_naive();
        let span = (today - from).num_days().max(0);
        from + Duration::days(self.rng.gen_range(0..=span))
    }
}
