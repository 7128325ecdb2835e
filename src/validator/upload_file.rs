use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::file::{FileDescriptor, UploadErrorCode};
use crate::value::Value;
use crate::Error;

use super::{ValidationError, Validator, ValidatorRole};

/// Decides whether a temporary path was really produced by the upload layer.
///
/// Without this check a client could post a descriptor pointing at any file
/// on the server.
pub trait UploadOrigin: fmt::Debug + Send + Sync {
    /// Returns true if `path` is a file the upload layer wrote.
    fn is_uploaded_file(&self, path: &Path) -> bool;
}

/// Accepts regular files located under the upload directory.
///
/// Defaults to the system temporary directory, where multipart parsers
/// spool uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempDirOrigin {
    dir: PathBuf,
}

impl TempDirOrigin {
    /// Trusts files under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The trusted directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for TempDirOrigin {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl UploadOrigin for TempDirOrigin {
    fn is_uploaded_file(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        // Resolve symlinks on both sides so `/tmp` -> `/private/tmp` style
        // links cannot be used to escape the directory.
        match (path.canonicalize(), self.dir.canonicalize()) {
            (Ok(file), Ok(dir)) => file.starts_with(dir),
            _ => false,
        }
    }
}

/// The upload-integrity validator.
///
/// Checks the status code the server attached to each descriptor and, for
/// successful uploads, that the temporary file exists and came from the
/// upload layer. A sequence of descriptors is checked element by element.
///
/// # Examples
///
/// ```
/// use input_filter::validator::{UploadFile, Validator};
/// use serde_json::json;
///
/// let validator = UploadFile::default();
/// let err = validator
///     .validate(&json!({"tmp_name": "", "error": 4}), None)
///     .unwrap_err();
/// assert_eq!(err.code(), UploadFile::NO_FILE);
/// ```
#[derive(Debug, Clone)]
pub struct UploadFile {
    origin: Arc<dyn UploadOrigin>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct UploadFileOptions {
    upload_dir: Option<PathBuf>,
}

impl UploadFile {
    /// The file exceeds the server-wide size limit.
    pub const INI_SIZE: &'static str = "fileUploadFileErrorIniSize";
    /// The file exceeds the form's size limit.
    pub const FORM_SIZE: &'static str = "fileUploadFileErrorFormSize";
    /// The file was only partially received.
    pub const PARTIAL: &'static str = "fileUploadFileErrorPartial";
    /// No file was sent.
    pub const NO_FILE: &'static str = "fileUploadFileErrorNoFile";
    /// The server has no temporary directory.
    pub const NO_TMP_DIR: &'static str = "fileUploadFileErrorNoTmpDir";
    /// The temporary copy could not be written.
    pub const CANT_WRITE: &'static str = "fileUploadFileErrorCantWrite";
    /// A server extension stopped the upload.
    pub const EXTENSION: &'static str = "fileUploadFileErrorExtension";
    /// The temporary path was not produced by the upload layer.
    pub const ATTACK: &'static str = "fileUploadFileErrorAttack";
    /// The temporary file does not exist.
    pub const FILE_NOT_FOUND: &'static str = "fileUploadFileErrorFileNotFound";
    /// The status code is missing or unknown.
    pub const UNKNOWN: &'static str = "fileUploadFileErrorUnknown";

    /// Creates the validator with a custom origin check.
    pub fn with_origin(origin: Arc<dyn UploadOrigin>) -> Self {
        Self { origin }
    }

    /// Builds the validator from plugin options `{"upload_dir": ".."}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] for unknown or mistyped keys.
    pub fn from_options(options: &Value) -> Result<Self, Error> {
        let opts = if options.is_null() {
            UploadFileOptions::default()
        } else {
            UploadFileOptions::deserialize(options)
                .map_err(|e| Error::invalid_options("fileuploadfile", e))?
        };
        Ok(match opts.upload_dir {
            Some(dir) => Self::with_origin(Arc::new(TempDirOrigin::new(dir))),
            None => Self::default(),
        })
    }

    fn check(&self, descriptor: &FileDescriptor) -> Result<(), ValidationError> {
        let status = descriptor.error.map(|error| UploadErrorCode::from(error.code()));
        let (code, message) = match status {
            Some(UploadErrorCode::Ok) => return self.check_received(descriptor),
            Some(UploadErrorCode::IniSize) => (Self::INI_SIZE, "File exceeds the defined ini size"),
            Some(UploadErrorCode::FormSize) => {
                (Self::FORM_SIZE, "File exceeds the defined form size")
            }
            Some(UploadErrorCode::Partial) => (Self::PARTIAL, "File was only partially uploaded"),
            Some(UploadErrorCode::NoFile) => (Self::NO_FILE, "File was not uploaded"),
            Some(UploadErrorCode::NoTmpDir) => {
                (Self::NO_TMP_DIR, "No temporary directory was found for file")
            }
            Some(UploadErrorCode::CantWrite) => (Self::CANT_WRITE, "File can't be written"),
            Some(UploadErrorCode::Extension) => (
                Self::EXTENSION,
                "An extension returned an error while uploading the file",
            ),
            Some(UploadErrorCode::Other(_)) | None => {
                (Self::UNKNOWN, "Unknown error while uploading file")
            }
        };
        Err(ValidationError::new(code, message))
    }

    fn check_received(&self, descriptor: &FileDescriptor) -> Result<(), ValidationError> {
        let path = match descriptor.tmp_name.as_deref() {
            Some(tmp) if !tmp.is_empty() => Path::new(tmp),
            _ => return Err(Self::not_found()),
        };
        if !path.exists() {
            return Err(Self::not_found());
        }
        if !self.origin.is_uploaded_file(path) {
            tracing::warn!(
                tmp_name = %path.display(),
                "rejecting upload whose temporary file did not come from the upload layer"
            );
            return Err(ValidationError::new(
                Self::ATTACK,
                "File was illegally uploaded. This could be a possible attack",
            ));
        }
        Ok(())
    }

    fn not_found() -> ValidationError {
        ValidationError::new(Self::FILE_NOT_FOUND, "File was not found")
    }
}

impl Default for UploadFile {
    fn default() -> Self {
        Self::with_origin(Arc::new(TempDirOrigin::default()))
    }
}

impl Validator for UploadFile {
    fn validate(&self, value: &Value, _context: Option<&Value>) -> Result<(), ValidationError> {
        match value {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .try_for_each(|item| self.validate(item, None)),
            _ => match FileDescriptor::from_value(value) {
                Some(descriptor) => self.check(&descriptor),
                None => Err(Self::not_found()),
            },
        }
    }

    fn role(&self) -> ValidatorRole {
        ValidatorRole::UploadIntegrity
    }
}
