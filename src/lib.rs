//! filecabinet - a record cabinet with in-memory and fixed-slot file storage
//!
//! Records carry a name, a date of birth, a weight, an account balance and a
//! letter. Both stores keep exact-match secondary indexes on first name,
//! last name and date of birth, and both exchange records with the outside
//! world through CSV and XML snapshots.

pub mod cli;
pub mod generator;
pub mod index;
pub mod observability;
pub mod record;
pub mod snapshot;
pub mod storage;
pub mod validation;
