//! Filters and the ordered filter chain.
//!
//! A filter is a value-to-value transformation. Inputs run their filter
//! chain when a value is read, never when it is set, so the raw value stays
//! available for validation.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::plugin::FilterPluginManager;
use crate::value::Value;
use crate::Error;

/// A value transformation.
///
/// Filters must be total: a value the filter does not understand is
/// returned unchanged.
pub trait Filter: fmt::Debug + Send + Sync {
    /// Transforms a value.
    fn filter(&self, value: Value) -> Value;
}

/// Ordered pipeline of filters.
///
/// # Examples
///
/// ```
/// use input_filter::filter::{FilterChain, StringToLower, StringTrim};
/// use serde_json::json;
///
/// let mut chain = FilterChain::new();
/// chain.attach(StringTrim).attach(StringToLower);
///
/// assert_eq!(chain.filter(json!("  Hello ")), json!("hello"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn attach(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Appends an already shared filter.
    pub fn attach_shared(&mut self, filter: Arc<dyn Filter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Resolves a filter by name through `plugins` and appends it.
    ///
    /// # Errors
    ///
    /// Propagates lookup and option errors from the plugin manager.
    pub fn attach_by_name(
        &mut self,
        plugins: &FilterPluginManager,
        name: &str,
        options: &Value,
    ) -> Result<&mut Self, Error> {
        let filter = plugins.get_with_options(name, options)?;
        self.filters.push(filter);
        Ok(self)
    }

    /// Inserts a filter at the front of the chain.
    pub fn prepend(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.insert(0, Arc::new(filter));
        self
    }

    /// Runs every filter in order.
    pub fn filter(&self, value: Value) -> Value {
        self.filters.iter().fold(value, |acc, f| f.filter(acc))
    }

    /// Appends the filters of `other`, keeping their order.
    pub fn merge(&mut self, other: &FilterChain) {
        self.filters.extend(other.filters.iter().cloned());
    }

    /// Number of filters in the chain.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

fn map_strings(value: Value, f: impl Fn(&str) -> String + Copy) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| map_strings(v, f)).collect()),
        other => other,
    }
}

/// Strips leading and trailing whitespace from strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringTrim;

impl Filter for StringTrim {
    fn filter(&self, value: Value) -> Value {
        map_strings(value, |s| s.trim().to_string())
    }
}

/// Lowercases strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToLower;

impl Filter for StringToLower {
    fn filter(&self, value: Value) -> Value {
        map_strings(value, str::to_lowercase)
    }
}

/// Uppercases strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToUpper;

impl Filter for StringToUpper {
    fn filter(&self, value: Value) -> Value {
        map_strings(value, str::to_uppercase)
    }
}

/// Turns empty values into null.
///
/// `""`, `[]` and `{}` become null; everything else passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToNull;

impl Filter for ToNull {
    fn filter(&self, value: Value) -> Value {
        let empty = match &value {
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            Value::Null
        } else {
            value
        }
    }
}

/// Reduces paths to their final component.
///
/// On a string this strips directories. On an upload descriptor it rewrites
/// the client-supplied `name`, which browsers on some platforms send with a
/// full path.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseName;

impl BaseName {
    fn base(path: &str) -> String {
        let unified = path.replace('\\', "/");
        Path::new(&unified)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl Filter for BaseName {
    fn filter(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(Self::base(&s)),
            Value::Object(mut map) => {
                if let Some(Value::String(name)) = map.get("name") {
                    let base = Self::base(name);
                    map.insert("name".to_string(), Value::String(base));
                }
                Value::Object(map)
            }
            other => other,
        }
    }
}

/// A filter backed by a closure.
///
/// # Examples
///
/// ```
/// use input_filter::filter::{Callback, Filter};
/// use serde_json::json;
///
/// let double = Callback::new(|v| match v.as_i64() {
///     Some(n) => json!(n * 2),
///     None => v,
/// });
/// assert_eq!(double.filter(json!(21)), json!(42));
/// ```
pub struct Callback {
    f: Box<dyn Fn(Value) -> Value + Send + Sync>,
}

impl Callback {
    /// Wraps a closure.
    pub fn new(f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self { f: Box::new(f) }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}

impl Filter for Callback {
    fn filter(&self, value: Value) -> Value {
        (self.f)(value)
    }
}

/// Replaces a descriptor field, mostly useful in tests and fixtures.
#[derive(Debug, Clone)]
pub struct SetField {
    key: String,
    value: Value,
}

impl SetField {
    /// Creates a filter that sets `key` to `value` on maps.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Filter for SetField {
    fn filter(&self, value: Value) -> Value {
        match value {
            Value::Object(mut map) => {
                map.insert(self.key.clone(), self.value.clone());
                Value::Object(map)
            }
            other => other,
        }
    }
}
