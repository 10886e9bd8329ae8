//! Secondary indexes for filecabinet
//!
//! Indexes are derived, in-memory-only state. The memory store maintains
//! them alongside its record list; the file store rebuilds them from live
//! slots on open and after purge.
//!
//! # Invariants
//!
//! - A live record appears in exactly the buckets matching its current keys
//! - Buckets never hold stale or duplicate ids
//! - Lookups return ids sorted ascending

mod btree;
mod manager;

pub use btree::IndexTree;
pub use manager::IndexManager;
