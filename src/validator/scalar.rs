use std::fmt;

use serde::Deserialize;

use crate::value::Value;
use crate::Error;

use super::{ValidationError, Validator, ValidatorRole};

/// Rejects null, blank strings, empty sequences and empty maps.
///
/// This is the validator inputs inject when they are required and may not be
/// empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotEmpty;

impl NotEmpty {
    /// Code reported for empty values.
    pub const IS_EMPTY: &'static str = "isEmpty";
    /// Message reported for empty values.
    pub const IS_EMPTY_MESSAGE: &'static str = "Value is required and can't be empty";

    pub(crate) fn error() -> ValidationError {
        ValidationError::new(Self::IS_EMPTY, Self::IS_EMPTY_MESSAGE)
    }
}

impl Validator for NotEmpty {
    fn validate(&self, value: &Value, _context: Option<&Value>) -> Result<(), ValidationError> {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            Err(Self::error())
        } else {
            Ok(())
        }
    }

    fn role(&self) -> ValidatorRole {
        ValidatorRole::NotEmpty
    }
}

/// Bounds the length of a string, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLength {
    min: usize,
    max: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StringLengthOptions {
    #[serde(default)]
    min: usize,
    #[serde(default)]
    max: Option<usize>,
}

impl StringLength {
    /// Creates a length check. `max` of `None` means unbounded.
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Builds the validator from plugin options `{"min": .., "max": ..}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] for malformed options or `min > max`.
    pub fn from_options(options: &Value) -> Result<Self, Error> {
        let opts: StringLengthOptions = if options.is_null() {
            StringLengthOptions { min: 0, max: None }
        } else {
            StringLengthOptions::deserialize(options)
                .map_err(|e| Error::invalid_options("stringlength", e))?
        };
        if let Some(max) = opts.max {
            if opts.min > max {
                return Err(Error::invalid_options(
                    "stringlength",
                    format!("min {} exceeds max {}", opts.min, max),
                ));
            }
        }
        Ok(Self::new(opts.min, opts.max))
    }
}

impl Validator for StringLength {
    fn validate(&self, value: &Value, _context: Option<&Value>) -> Result<(), ValidationError> {
        let Some(s) = value.as_str() else {
            return Err(ValidationError::new(
                "stringLengthInvalid",
                "Invalid type given. String expected",
            ));
        };
        let len = s.chars().count();
        if len < self.min {
            return Err(ValidationError::new(
                "stringLengthTooShort",
                format!("The input is less than {} characters long", self.min),
            ));
        }
        match self.max {
            Some(max) if len > max => Err(ValidationError::new(
                "stringLengthTooLong",
                format!("The input is more than {} characters long", max),
            )),
            _ => Ok(()),
        }
    }
}

/// Accepts strings of ASCII digits and non-negative integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Digits;

impl Validator for Digits {
    fn validate(&self, value: &Value, _context: Option<&Value>) -> Result<(), ValidationError> {
        match value {
            Value::Number(n) if n.is_u64() => Ok(()),
            Value::String(s) if s.is_empty() => Err(ValidationError::new(
                "digitsStringEmpty",
                "The input is an empty string",
            )),
            Value::String(s) if s.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
            Value::String(_) | Value::Number(_) => Err(ValidationError::new(
                "notDigits",
                "The input must contain only digits",
            )),
            _ => Err(ValidationError::new(
                "digitsInvalid",
                "Invalid type given. String, integer or float expected",
            )),
        }
    }
}

/// Accepts only values found in a fixed haystack.
#[derive(Debug, Clone, PartialEq)]
pub struct InArray {
    haystack: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct InArrayOptions {
    haystack: Vec<Value>,
}

impl InArray {
    /// Creates the validator.
    pub fn new(haystack: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self {
            haystack: haystack.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the validator from plugin options `{"haystack": [..]}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] when the haystack is missing.
    pub fn from_options(options: &Value) -> Result<Self, Error> {
        let opts = InArrayOptions::deserialize(options)
            .map_err(|e| Error::invalid_options("inarray", e))?;
        Ok(Self {
            haystack: opts.haystack,
        })
    }
}

impl Validator for InArray {
    fn validate(&self, value: &Value, _context: Option<&Value>) -> Result<(), ValidationError> {
        if self.haystack.contains(value) {
            Ok(())
        } else {
            Err(ValidationError::new(
                "notInArray",
                "The input was not found in the haystack",
            ))
        }
    }
}

type Check = dyn Fn(&Value, Option<&Value>) -> bool + Send + Sync;

/// A validator backed by a predicate over the value and the context.
pub struct Callback {
    code: &'static str,
    message: String,
    check: Box<Check>,
}

impl Callback {
    /// Wraps a predicate. A `false` result is reported with `code` and `message`.
    pub fn new(
        code: &'static str,
        message: impl Into<String>,
        check: impl Fn(&Value, Option<&Value>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}

impl Validator for Callback {
    fn validate(&self, value: &Value, context: Option<&Value>) -> Result<(), ValidationError> {
        if (self.check)(value, context) {
            Ok(())
        } else {
            Err(ValidationError::new(self.code, self.message.clone()))
        }
    }
}
