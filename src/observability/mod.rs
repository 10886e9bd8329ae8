//! Observability subsystem for filecabinet
//!
//! - Structured JSON logging to stderr
//! - Begin/complete scopes around long operations
//! - Store decorators that log or time every call
//!
//! # Principles
//!
//! 1. Observability is read-only: decorators never change a result
//! 2. No async or background threads
//! 3. A failing log sink never fails a store call
//!
//! # Usage
//!
//! ```ignore
//! use filecabinet::observability::{Logger, LoggingStore, TimingStore};
//!
//! Logger::info("STORE_OPENED", &[("path", "cabinet.db")]);
//!
//! let timed = TimingStore::new(store);
//! let timings = timed.timings();
//! let logged = LoggingStore::new(timed, std::io::stderr());
//! ```

mod logger;
mod logging_store;
mod metrics;
mod scope;
mod timing_store;

pub use logger::{Logger, Severity};
pub use logging_store::LoggingStore;
pub use metrics::{MethodTiming, OperationTimings, StoreMethod};
pub use scope::{ObservationScope, Timer};
pub use timing_store::TimingStore;
