use std::sync::Arc;

use crate::validator::{
    Digits, FileMimeType, FileSize, InArray, NotEmpty, StringLength, UploadFile, Validator,
};

use super::{Plugin, PluginKind, ValidatorPluginManager};

/// Marker for managers that serve [`Validator`]s.
#[derive(Debug)]
pub struct Validators;

impl PluginKind for Validators {
    type Output = Arc<dyn Validator>;

    const KIND: &'static str = "Validator";
    const CAPABILITY: &'static str = "Validator";

    fn accept(plugin: Plugin) -> Result<Self::Output, Plugin> {
        match plugin {
            Plugin::Validator(validator) => Ok(validator),
            other => Err(other),
        }
    }
}

impl ValidatorPluginManager {
    /// Name under which inputs look up the upload-integrity validator.
    pub const UPLOAD_FILE: &'static str = "fileuploadfile";
    /// Name under which inputs look up the not-empty validator.
    pub const NOT_EMPTY: &'static str = "notempty";

    /// A manager preloaded with the built-in validators.
    ///
    /// Registered names: `notempty`, `stringlength`, `digits`, `inarray`,
    /// `fileuploadfile` (aliases `uploadfile`, `fileupload`), `filesize` and
    /// `filemimetype`.
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.register_or_replace(Self::NOT_EMPTY, |_| Ok(Plugin::Validator(Arc::new(NotEmpty))));
        manager.register_or_replace("stringlength", |options| {
            Ok(Plugin::Validator(Arc::new(StringLength::from_options(options)?)))
        });
        manager.register_or_replace("digits", |_| Ok(Plugin::Validator(Arc::new(Digits))));
        manager.register_or_replace("inarray", |options| {
            Ok(Plugin::Validator(Arc::new(InArray::from_options(options)?)))
        });
        manager.register_or_replace(Self::UPLOAD_FILE, |options| {
            Ok(Plugin::Validator(Arc::new(UploadFile::from_options(options)?)))
        });
        manager.register_or_replace("filesize", |options| {
            Ok(Plugin::Validator(Arc::new(FileSize::from_options(options)?)))
        });
        manager.register_or_replace("filemimetype", |options| {
            Ok(Plugin::Validator(Arc::new(FileMimeType::from_options(options)?)))
        });
        manager.alias("uploadfile", Self::UPLOAD_FILE);
        manager.alias("fileupload", Self::UPLOAD_FILE);
        manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidatorRole;
    use serde_json::json;

    #[test]
    fn defaults_are_registered() {
        let manager = ValidatorPluginManager::with_defaults();
        for name in [
            "NotEmpty",
            "StringLength",
            "Digits",
            "File\\UploadFile",
            "UploadFile",
            "FileSize",
            "File\\MimeType",
        ] {
            assert!(manager.has(name), "missing default validator {}", name);
        }
    }

    #[test]
    fn upload_file_has_integrity_role() {
        let manager = ValidatorPluginManager::with_defaults();
        let validator = manager.get(ValidatorPluginManager::UPLOAD_FILE).unwrap();
        assert_eq!(validator.role(), ValidatorRole::UploadIntegrity);
    }

    #[test]
    fn option_errors_surface() {
        let manager = ValidatorPluginManager::with_defaults();
        assert!(manager.get("inarray").is_err());
        assert!(manager
            .get_with_options("inarray", &json!({"haystack": ["a"]}))
            .is_ok());
    }
}
