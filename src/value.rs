//! The dynamic value model shared by every input.
//!
//! Inputs carry [`serde_json::Value`]s: scalars, sequences and maps arrive
//! untyped from the request layer and are only given structure by filters
//! and validators.

pub use serde_json::{Map, Value};

/// Returns `true` if a scalar input value counts as "nothing supplied".
///
/// Null, the empty string and the empty sequence are empty. Everything else,
/// including `0`, `false` and the empty map, is a value.
///
/// # Examples
///
/// ```
/// use input_filter::value::is_empty_value;
/// use serde_json::json;
///
/// assert!(is_empty_value(&json!(null)));
/// assert!(is_empty_value(&json!("")));
/// assert!(is_empty_value(&json!([])));
/// assert!(!is_empty_value(&json!(0)));
/// assert!(!is_empty_value(&json!("file")));
/// ```
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Short name of a value's JSON type, used in log fields.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
