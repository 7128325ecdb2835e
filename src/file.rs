//! Upload descriptors and the "was a file sent" decision.
//!
//! An HTTP server hands every multipart upload slot to the application as a
//! small record: where the temporary copy lives (`tmp_name`), the client's
//! file name (`name`), `size`, MIME `type` and an `error` status. A field
//! with the `multiple` attribute arrives as a sequence of those records, and
//! clients posting without a browser form (AJAX) often send a bare string
//! instead.
//!
//! This module classifies such raw values ([`RawFileValue`]), decides whether
//! they are empty ([`is_empty_file`]) and normalizes malformed ones before
//! validation ([`normalize_upload`]).

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::value::{is_empty_value, type_name, Map, Value};

/// Status code attached to an upload slot by the server.
///
/// Serialized as the bare integer the server reports. Equality and hashing
/// go through [`code`](Self::code), so `Other(4)` equals `NoFile`.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum UploadErrorCode {
    /// The file was received.
    Ok,
    /// The file exceeds the server-wide size limit.
    IniSize,
    /// The file exceeds the size limit declared by the form.
    FormSize,
    /// Only part of the file was received.
    Partial,
    /// No file was sent for this slot.
    NoFile,
    /// The server has no temporary directory.
    NoTmpDir,
    /// The temporary copy could not be written.
    CantWrite,
    /// A server extension stopped the upload.
    Extension,
    /// A code this crate does not know.
    ///
    /// Holding an assigned code here is tolerated: it compares and
    /// classifies as the named variant.
    Other(i64),
}

impl UploadErrorCode {
    /// The integer the server uses for this status.
    pub fn code(self) -> i64 {
        match self {
            Self::Ok => 0,
            Self::IniSize => 1,
            Self::FormSize => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::NoTmpDir => 6,
            Self::CantWrite => 7,
            Self::Extension => 8,
            Self::Other(code) => code,
        }
    }
}

impl PartialEq for UploadErrorCode {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Hash for UploadErrorCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl From<i64> for UploadErrorCode {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::IniSize,
            2 => Self::FormSize,
            3 => Self::Partial,
            4 => Self::NoFile,
            6 => Self::NoTmpDir,
            7 => Self::CantWrite,
            8 => Self::Extension,
            other => Self::Other(other),
        }
    }
}

impl From<UploadErrorCode> for i64 {
    fn from(code: UploadErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One upload slot as reported by the server.
///
/// Every field is optional: clients and test fixtures routinely send partial
/// records, and only the validators decide what is required.
///
/// # Examples
///
/// ```
/// use input_filter::file::{FileDescriptor, UploadErrorCode};
/// use serde_json::json;
///
/// let descriptor = FileDescriptor::from_value(&json!({
///     "tmp_name": "/tmp/upload-a1b2",
///     "name": "avatar.png",
///     "size": 2048,
///     "type": "image/png",
///     "error": 0,
/// }))
/// .expect("well-formed descriptor");
///
/// assert_eq!(descriptor.error, Some(UploadErrorCode::Ok));
/// assert_eq!(descriptor.mime_type.as_deref(), Some("image/png"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Path of the server's temporary copy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_name: Option<String>,
    /// File name as supplied by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// MIME type as supplied by the client
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Upload status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<UploadErrorCode>,
}

impl FileDescriptor {
    /// The record validated when no file was supplied at all.
    ///
    /// Every field is present: empty strings, zero size and
    /// [`UploadErrorCode::NoFile`].
    pub fn empty_placeholder() -> Self {
        Self {
            tmp_name: Some(String::new()),
            name: Some(String::new()),
            size: Some(0),
            mime_type: Some(String::new()),
            error: Some(UploadErrorCode::NoFile),
        }
    }

    /// Reads a descriptor out of a raw value.
    ///
    /// Returns `None` unless the value is a map carrying a `tmp_name` or
    /// `error` key whose recognized keys have the expected types. Unknown
    /// keys are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if !map.contains_key("tmp_name") && !map.contains_key("error") {
            return None;
        }
        Self::deserialize(value).ok()
    }

    /// Returns `true` if the slot reports [`UploadErrorCode::NoFile`].
    pub fn is_no_file(&self) -> bool {
        self.error == Some(UploadErrorCode::NoFile)
    }

    /// Converts the descriptor back into the map shape validators receive.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(tmp_name) = &self.tmp_name {
            map.insert("tmp_name".to_string(), Value::from(tmp_name.as_str()));
        }
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::from(name.as_str()));
        }
        if let Some(size) = self.size {
            map.insert("size".to_string(), Value::from(size));
        }
        if let Some(mime_type) = &self.mime_type {
            map.insert("type".to_string(), Value::from(mime_type.as_str()));
        }
        if let Some(error) = self.error {
            map.insert("error".to_string(), Value::from(error.code()));
        }
        Value::Object(map)
    }
}

/// A raw upload value, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFileValue {
    /// A single upload slot
    Single(FileDescriptor),
    /// A multi-file upload
    Multiple(Vec<FileDescriptor>),
    /// Anything that is not a descriptor, such as a string posted by a script
    Opaque(Value),
}

impl RawFileValue {
    /// Classifies a raw value.
    ///
    /// A sequence is [`Multiple`](Self::Multiple) only if it is non-empty and
    /// every element is a descriptor; otherwise it is opaque.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => match FileDescriptor::from_value(value) {
                Some(descriptor) => Self::Single(descriptor),
                None => Self::Opaque(value.clone()),
            },
            Value::Array(items) if !items.is_empty() => {
                let descriptors: Option<Vec<FileDescriptor>> =
                    items.iter().map(FileDescriptor::from_value).collect();
                match descriptors {
                    Some(descriptors) => Self::Multiple(descriptors),
                    None => Self::Opaque(value.clone()),
                }
            }
            _ => Self::Opaque(value.clone()),
        }
    }

    /// Returns `true` if the value means "no file supplied".
    ///
    /// - a single descriptor is empty iff its `error` is `NoFile`;
    /// - a multi-file value is empty iff **every** descriptor's `error` is
    ///   `NoFile`;
    /// - an opaque value follows [`is_empty_value`].
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(descriptor) => descriptor.is_no_file(),
            Self::Multiple(descriptors) => descriptors.iter().all(FileDescriptor::is_no_file),
            Self::Opaque(value) => is_empty_value(value),
        }
    }
}

/// Returns `true` if a raw upload value means "no file supplied".
///
/// # Examples
///
/// ```
/// use input_filter::file::is_empty_file;
/// use serde_json::json;
///
/// assert!(is_empty_file(&json!({"tmp_name": "", "error": 4})));
/// assert!(!is_empty_file(&json!({"tmp_name": "/tmp/x", "error": 0})));
/// assert!(is_empty_file(&json!([{"tmp_name": "a", "error": 4}, {"tmp_name": "b", "error": 4}])));
/// assert!(!is_empty_file(&json!([{"tmp_name": "a", "error": 4}, {"tmp_name": "b", "error": 0}])));
/// assert!(is_empty_file(&json!("")));
/// ```
pub fn is_empty_file(value: &Value) -> bool {
    RawFileValue::from_value(value).is_empty()
}

/// What the upload validators actually receive.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedUpload {
    /// Validate one descriptor
    Single(Value),
    /// Validate each descriptor in order
    Multiple(Vec<Value>),
}

/// Normalizes a raw upload value before validation.
///
/// Descriptors carrying a `tmp_name` pass through untouched, as do
/// multi-file values made only of such descriptors. A non-empty string `s`
/// becomes a `NoFile` descriptor naming `s`. Everything else becomes
/// [`FileDescriptor::empty_placeholder`]. This never fails.
pub fn normalize_upload(raw: &Value) -> NormalizedUpload {
    let has_tmp_name = |d: &FileDescriptor| d.tmp_name.is_some();

    match RawFileValue::from_value(raw) {
        RawFileValue::Single(descriptor) if has_tmp_name(&descriptor) => {
            NormalizedUpload::Single(raw.clone())
        }
        RawFileValue::Multiple(descriptors) if descriptors.iter().all(has_tmp_name) => {
            let items = raw.as_array().cloned().unwrap_or_default();
            NormalizedUpload::Multiple(items)
        }
        RawFileValue::Opaque(Value::String(s)) if !s.is_empty() => {
            tracing::debug!(kind = "string", "normalizing non-descriptor upload value");
            let descriptor = FileDescriptor {
                tmp_name: Some(s.clone()),
                name: Some(s),
                ..FileDescriptor::empty_placeholder()
            };
            NormalizedUpload::Single(descriptor.to_value())
        }
        _ => {
            tracing::debug!(
                kind = type_name(raw),
                "replacing absent or malformed upload value with placeholder"
            );
            NormalizedUpload::Single(FileDescriptor::empty_placeholder().to_value())
        }
    }
}
