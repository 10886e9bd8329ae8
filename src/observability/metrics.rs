//! Per-method call timings for store decorators
//!
//! - Counters only, monotonic, reset on process start
//! - Shared through `Arc` so the shell can report after handing the
//!   store away

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Every `RecordStore` method a decorator can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMethod {
    CreateRecord,
    EditRecord,
    Remove,
    GetRecords,
    GetStat,
    CountOfRemoved,
    FindByFirstName,
    FindByLastName,
    FindByDateOfBirth,
    MakeSnapshot,
    Restore,
    Purge,
    Close,
}

impl StoreMethod {
    pub const ALL: [StoreMethod; 13] = [
        StoreMethod::CreateRecord,
        StoreMethod::EditRecord,
        StoreMethod::Remove,
        StoreMethod::GetRecords,
        StoreMethod::GetStat,
        StoreMethod::CountOfRemoved,
        StoreMethod::FindByFirstName,
        StoreMethod::FindByLastName,
        StoreMethod::FindByDateOfBirth,
        StoreMethod::MakeSnapshot,
        StoreMethod::Restore,
        StoreMethod::Purge,
        StoreMethod::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreMethod::CreateRecord => "create_record",
            StoreMethod::EditRecord => "edit_record",
            StoreMethod::Remove => "remove",
            StoreMethod::GetRecords => "get_records",
            StoreMethod::GetStat => "get_stat",
            StoreMethod::CountOfRemoved => "count_of_removed",
            StoreMethod::FindByFirstName => "find_by_first_name",
            StoreMethod::FindByLastName => "find_by_last_name",
            StoreMethod::FindByDateOfBirth => "find_by_date_of_birth",
            StoreMethod::MakeSnapshot => "make_snapshot",
            StoreMethod::Restore => "restore",
            StoreMethod::Purge => "purge",
            StoreMethod::Close => "close",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for StoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Default)]
struct MethodCounters {
    calls: AtomicU64,
    errors: AtomicU64,
    total_micros: AtomicU64,
}

/// Call counts and accumulated durations per store method.
#[derive(Debug, Default)]
pub struct OperationTimings {
    counters: [MethodCounters; StoreMethod::ALL.len()],
}

impl OperationTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished call.
    pub fn record(&self, method: StoreMethod, elapsed: Duration, succeeded: bool) {
        let counters = &self.counters[method.index()];
        counters.calls.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            counters.errors.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        counters.total_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn get(&self, method: StoreMethod) -> MethodTiming {
        let counters = &self.counters[method.index()];
        MethodTiming {
            method,
            calls: counters.calls.load(Ordering::Relaxed),
            errors: counters.errors.load(Ordering::Relaxed),
            total_micros: counters.total_micros.load(Ordering::Relaxed),
        }
    }

    /// Timings for every method called at least once, in declaration order.
    pub fn snapshot(&self) -> Vec<MethodTiming> {
        StoreMethod::ALL
            .iter()
            .map(|m| self.get(*m))
            .filter(|t| t.calls > 0)
            .collect()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "[]".to_string())
    }
}

/// A point-in-time view of one method's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodTiming {
    pub method: StoreMethod,
    pub calls: u64,
    pub errors: u64,
    pub total_micros: u64,
}

impl MethodTiming {
    pub fn average_micros(&self) -> u64 {
        if self.calls == 0 {
            0
        } else {
            self.total_micros / self.calls
        }
    }
}
