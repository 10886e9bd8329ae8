//! Validation error types
//!
//! Error codes:
//! - FC_RECORD_VALIDATION_FAILED (REJECT)
//! - FC_RULES_INVALID (REJECT)

use std::fmt;

/// Validation-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// Record violates a field rule
    FcRecordValidationFailed,
    /// Rule set itself is malformed (e.g. min > max)
    FcRulesInvalid,
}

impl ValidationErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationErrorCode::FcRecordValidationFailed => "FC_RECORD_VALIDATION_FAILED",
            ValidationErrorCode::FcRulesInvalid => "FC_RULES_INVALID",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field name (e.g. "first_name")
    pub field: String,
    /// Bound or condition that was expected
    pub expected: String,
    /// Value actually found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn blank(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: "non-blank text".into(),
            actual: "blank".into(),
        }
    }

    pub fn out_of_range(
        field: impl Into<String>,
        min: impl fmt::Display,
        max: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self {
            field: field.into(),
            expected: format!("between {} and {}", min, max),
            actual: actual.to_string(),
        }
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Validation error with its code and details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    code: ValidationErrorCode,
    details: ValidationDetails,
}

impl ValidationError {
    /// A record failed one of its field rules
    pub fn failed(details: ValidationDetails) -> Self {
        Self {
            code: ValidationErrorCode::FcRecordValidationFailed,
            details,
        }
    }

    /// A rule set is malformed
    pub fn rules_invalid(details: ValidationDetails) -> Self {
        Self {
            code: ValidationErrorCode::FcRulesInvalid,
            details,
        }
    }

    pub fn code(&self) -> ValidationErrorCode {
        self.code
    }

    pub fn details(&self) -> &ValidationDetails {
        &self.details
    }

    /// Name of the offending field
    pub fn field(&self) -> &str {
        &self.details.field
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.details)
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;
