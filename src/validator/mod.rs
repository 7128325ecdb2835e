//! Validators and the validator chain.
//!
//! Validators are read-only checks over a [`Value`]. A failing check returns
//! a [`ValidationError`]; inputs collect those as messages instead of
//! treating them as faults.

mod chain;
mod file;
mod scalar;
mod upload_file;

use std::fmt;

use crate::value::Value;

pub use chain::{ValidatorChain, ValidatorEntry};
pub use file::{FileMimeType, FileSize};
pub use scalar::{Callback, Digits, InArray, NotEmpty, StringLength};
pub use upload_file::{TempDirOrigin, UploadFile, UploadOrigin};

/// A failed validation, identified by a stable code.
///
/// The message is meant for end users and never echoes the rejected value.
///
/// # Examples
///
/// ```
/// use input_filter::ValidationError;
///
/// let error = ValidationError::new("isEmpty", "Value is required and can't be empty");
/// assert_eq!(error.code(), "isEmpty");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    code: &'static str,
    message: String,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The stable error code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// What a validator is for.
///
/// Inputs use roles to avoid injecting a validator the caller already
/// configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorRole {
    /// Any validator without a special role
    Generic,
    /// Rejects empty values
    NotEmpty,
    /// Checks that a file really arrived through an upload
    UploadIntegrity,
}

/// A check over a value.
///
/// `context` is the full data set being validated, when there is one; most
/// validators ignore it.
pub trait Validator: fmt::Debug + Send + Sync {
    /// Validates a value.
    ///
    /// # Errors
    ///
    /// Returns the reason the value was rejected.
    fn validate(&self, value: &Value, context: Option<&Value>) -> Result<(), ValidationError>;

    /// The role this validator plays. Defaults to [`ValidatorRole::Generic`].
    fn role(&self) -> ValidatorRole {
        ValidatorRole::Generic
    }
}
