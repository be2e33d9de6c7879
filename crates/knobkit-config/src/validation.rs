//! Whole-document validation.
//!
//! [`KnobkitConfig::validate()`](crate::KnobkitConfig::validate) checks every
//! entry and reports all problems at once: a single problem is returned as
//! is, several are wrapped in [`ValidationError::Multiple`].

use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of range.
    #[error("'{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the value, e.g. `"kernels.level.min_threshold"`.
        param: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Unknown kernel parameter name.
    #[error("unknown parameter '{param}' for kernel '{kernel}'")]
    UnknownParameter {
        /// Kernel entry name.
        kernel: String,
        /// Name of the unrecognized parameter.
        param: String,
    },

    /// An entry cannot be built as written.
    #[error("[{section}.{name}]: {reason}")]
    InvalidEntry {
        /// Section of the entry.
        section: &'static str,
        /// Entry name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

impl ValidationError {
    /// Creates an invalid entry error.
    pub fn invalid_entry(
        section: &'static str,
        name: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        ValidationError::InvalidEntry {
            section,
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Folds collected errors into a result.
    pub fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}
