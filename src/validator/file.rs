use std::path::Path;

use serde::Deserialize;

use crate::file::FileDescriptor;
use crate::value::Value;
use crate::Error;

use super::{ValidationError, Validator};

// Applies `check` to one descriptor or to every descriptor of a sequence.
fn each_descriptor(
    value: &Value,
    not_found: fn() -> ValidationError,
    check: impl Fn(&FileDescriptor) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    match value {
        Value::Array(items) if !items.is_empty() => items.iter().try_for_each(|item| {
            FileDescriptor::from_value(item).map_or_else(|| Err(not_found()), |d| check(&d))
        }),
        _ => FileDescriptor::from_value(value).map_or_else(|| Err(not_found()), |d| check(&d)),
    }
}

/// Bounds the size of uploaded files, in bytes.
///
/// The size comes from the descriptor; when the descriptor has none, the
/// temporary file's metadata is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSize {
    #[serde(default)]
    min: Option<u64>,
    #[serde(default)]
    max: Option<u64>,
}

impl FileSize {
    /// The file is larger than `max`.
    pub const TOO_BIG: &'static str = "fileSizeTooBig";
    /// The file is smaller than `min`.
    pub const TOO_SMALL: &'static str = "fileSizeTooSmall";
    /// The size could not be determined.
    pub const NOT_FOUND: &'static str = "fileSizeNotFound";

    /// Creates the validator.
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    /// Builds the validator from plugin options `{"min": .., "max": ..}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] for malformed options or `min > max`.
    pub fn from_options(options: &Value) -> Result<Self, Error> {
        let size = if options.is_null() {
            Self::default()
        } else {
            Self::deserialize(options).map_err(|e| Error::invalid_options("filesize", e))?
        };
        if let (Some(min), Some(max)) = (size.min, size.max) {
            if min > max {
                return Err(Error::invalid_options(
                    "filesize",
                    format!("min {} exceeds max {}", min, max),
                ));
            }
        }
        Ok(size)
    }

    fn not_found() -> ValidationError {
        ValidationError::new(Self::NOT_FOUND, "File is not readable or does not exist")
    }

    fn size_of(descriptor: &FileDescriptor) -> Option<u64> {
        descriptor.size.or_else(|| {
            let tmp = descriptor.tmp_name.as_deref()?;
            std::fs::metadata(Path::new(tmp)).ok().map(|m| m.len())
        })
    }
}

impl Validator for FileSize {
    fn validate(&self, value: &Value, _context: Option<&Value>) -> Result<(), ValidationError> {
        each_descriptor(value, Self::not_found, |descriptor| {
            let size = Self::size_of(descriptor).ok_or_else(Self::not_found)?;
            if let Some(max) = self.max.filter(|max| size > *max) {
                return Err(ValidationError::new(
                    Self::TOO_BIG,
                    format!("Maximum allowed size for file is '{}' bytes", max),
                ));
            }
            if let Some(min) = self.min.filter(|min| size < *min) {
                return Err(ValidationError::new(
                    Self::TOO_SMALL,
                    format!("Minimum expected size for file is '{}' bytes", min),
                ));
            }
            Ok(())
        })
    }
}

/// Restricts the declared MIME type of uploaded files.
///
/// Entries may end in `/*` to allow a whole family, e.g. `image/*`. The type
/// is the one the client declared; pair this with content sniffing where
/// that matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMimeType {
    allowed: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileMimeTypeOptions {
    mime_types: Vec<String>,
}

impl FileMimeType {
    /// Creates the validator.
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed
                .into_iter()
                .map(|m| m.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Builds the validator from plugin options `{"mime_types": [..]}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] when `mime_types` is missing.
    pub fn from_options(options: &Value) -> Result<Self, Error> {
        let opts = FileMimeTypeOptions::deserialize(options)
            .map_err(|e| Error::invalid_options("filemimetype", e))?;
        Ok(Self::new(opts.mime_types))
    }

    fn allows(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        // Parameters such as `; charset=utf-8` do not affect the type.
        let essence = mime.split(';').next().unwrap_or_default().trim();
        self.allowed.iter().any(|allowed| match allowed.strip_suffix("/*") {
            Some(family) => essence
                .split_once('/')
                .is_some_and(|(top, _)| top == family),
            None => allowed == essence,
        })
    }

    fn not_detected() -> ValidationError {
        ValidationError::new("fileMimeTypeNotDetected", "Mimetype could not be detected from file")
    }
}

impl Validator for FileMimeType {
    fn validate(&self, value: &Value, _context: Option<&Value>) -> Result<(), ValidationError> {
        each_descriptor(value, Self::not_detected, |descriptor| {
            let mime = descriptor
                .mime_type
                .as_deref()
                .filter(|m| !m.is_empty())
                .ok_or_else(Self::not_detected)?;
            if self.allows(mime) {
                Ok(())
            } else {
                Err(ValidationError::new(
                    "fileMimeTypeFalse",
                    "File has an incorrect mimetype",
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_size_uses_descriptor_size() {
        let v = FileSize::new(Some(10), Some(100));
        assert!(v.validate(&json!({"tmp_name": "x", "size": 50}), None).is_ok());
        assert_eq!(
            v.validate(&json!({"tmp_name": "x", "size": 500}), None).unwrap_err().code(),
            "fileSizeTooBig"
        );
        assert_eq!(
            v.validate(&json!({"tmp_name": "x", "size": 5}), None).unwrap_err().code(),
            "fileSizeTooSmall"
        );
    }

    #[test]
    fn file_size_falls_back_to_metadata() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &[0u8; 64]).unwrap();
        let value = json!({"tmp_name": file.path().to_string_lossy(), "error": 0});

        assert!(FileSize::new(None, Some(64)).validate(&value, None).is_ok());
        assert!(FileSize::new(None, Some(63)).validate(&value, None).is_err());
    }

    #[test]
    fn file_size_without_any_size_is_not_found() {
        let err = FileSize::new(None, Some(1))
            .validate(&json!({"tmp_name": "/definitely/not/here"}), None)
            .unwrap_err();
        assert_eq!(err.code(), "fileSizeNotFound");
    }

    #[test]
    fn file_size_checks_every_descriptor() {
        let v = FileSize::new(None, Some(10));
        let value = json!([
            {"tmp_name": "a", "size": 1},
            {"tmp_name": "b", "size": 11},
        ]);
        assert_eq!(v.validate(&value, None).unwrap_err().code(), "fileSizeTooBig");
    }

    #[test]
    fn file_size_options() {
        assert_eq!(
            FileSize::from_options(&json!({"max": 5})).unwrap(),
            FileSize::new(None, Some(5))
        );
        assert!(FileSize::from_options(&json!({"min": 9, "max": 5})).is_err());
    }

    #[test]
    fn mime_type_exact_and_family() {
        let v = FileMimeType::new(["application/pdf", "image/*"]);
        let with_type = |t: &str| json!({"tmp_name": "x", "type": t});

        assert!(v.validate(&with_type("application/pdf"), None).is_ok());
        assert!(v.validate(&with_type("IMAGE/PNG"), None).is_ok());
        assert!(v.validate(&with_type("text/plain; charset=utf-8"), None).is_err());
        assert_eq!(
            v.validate(&with_type(""), None).unwrap_err().code(),
            "fileMimeTypeNotDetected"
        );
    }

    #[test]
    fn mime_type_options() {
        let v = FileMimeType::from_options(&json!({"mime_types": ["text/plain"]})).unwrap();
        assert!(v.validate(&json!({"tmp_name": "x", "type": "text/plain"}), None).is_ok());
        assert!(FileMimeType::from_options(&json!({})).is_err());
    }
}
