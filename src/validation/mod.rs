//! Record validation policy for filecabinet
//!
//! The policy is an ordered list of independent field rules. Stores receive
//! a `RecordValidator` at construction and run it before every write; the
//! store itself never interprets the bounds.
//!
//! # Design Principles
//!
//! - Rules are independent predicates with explicit bounds
//! - Evaluation order is insertion order
//! - First failure wins
//! - No coercion: the validator never rewrites a value

mod errors;
mod rules;
mod validator;

pub use errors::{ValidationDetails, ValidationError, ValidationErrorCode, ValidationResult};
pub use rules::{FieldRule, FieldValue};
pub use validator::{RecordValidator, ValidatorBuilder, DEFAULT_PRESET};
