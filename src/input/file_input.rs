use std::sync::Arc;

use crate::file::{is_empty_file, normalize_upload, NormalizedUpload};
use crate::plugin::ValidatorPluginManager;
use crate::validator::{UploadFile, Validator, ValidatorRole};
use crate::value::Value;

use super::{default_chain, InputInterface, InputState};

/// An input carrying upload descriptors.
///
/// Differences from [`Input`](super::Input):
///
/// - emptiness follows [`is_empty_file`]: a slot reporting "no file sent" is
///   empty, and a multi-file value is empty only if every slot is;
/// - validators see the **raw** descriptor, because filters may move or
///   rename the temporary file and the integrity check must run on what the
///   server reported;
/// - filters run only after a successful validation;
/// - the upload-integrity validator is prepended once, on the first
///   validation, unless disabled or already present;
/// - absent or malformed values are validated as an empty placeholder
///   descriptor;
/// - there is no fallback value and no implicit not-empty check.
///
/// # Examples
///
/// ```
/// use input_filter::input::{FileInput, InputInterface};
/// use input_filter::validator::UploadFile;
/// use serde_json::json;
///
/// let mut input = FileInput::new("avatar");
/// input.set_value(json!({"tmp_name": "", "name": "", "size": 0, "type": "", "error": 4}));
///
/// assert!(!input.is_valid(None));
/// assert_eq!(input.messages()[0].code(), UploadFile::NO_FILE);
/// assert_eq!(input.validator_chain().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FileInput {
    state: InputState,
    auto_prepend_upload_validator: bool,
    // The instance this input prepended, whatever role it reports.
    injected: Option<Arc<dyn Validator>>,
    validated: bool,
}

impl FileInput {
    /// Creates a required file input backed by the default validator plugins.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: InputState::new(name, default_chain(None)),
            auto_prepend_upload_validator: true,
            injected: None,
            validated: false,
        }
    }

    /// Creates a required file input whose chain resolves validators through `plugins`.
    ///
    /// The injected upload validator is looked up in `plugins` under
    /// [`ValidatorPluginManager::UPLOAD_FILE`], so overriding that name changes
    /// what gets injected.
    pub fn with_plugins(name: impl Into<String>, plugins: Arc<ValidatorPluginManager>) -> Self {
        Self {
            state: InputState::new(name, default_chain(Some(plugins))),
            auto_prepend_upload_validator: true,
            injected: None,
            validated: false,
        }
    }

    /// Sets the upload-validator policy at construction.
    ///
    /// Disable it where descriptors do not come from a real upload layer,
    /// such as fixtures in tests.
    pub fn with_auto_prepend_upload_validator(mut self, enabled: bool) -> Self {
        self.auto_prepend_upload_validator = enabled;
        self
    }

    /// Whether the upload-integrity validator is prepended on validation.
    pub fn auto_prepend_upload_validator(&self) -> bool {
        self.auto_prepend_upload_validator
    }

    /// Enables or disables prepending the upload-integrity validator.
    pub fn set_auto_prepend_upload_validator(&mut self, enabled: bool) {
        self.auto_prepend_upload_validator = enabled;
    }

    /// Returns true if `raw` means "no file supplied".
    pub fn is_empty_file(&self, raw: &Value) -> bool {
        is_empty_file(raw)
    }

    fn inject_upload_validator(&mut self) {
        if !self.auto_prepend_upload_validator {
            return;
        }
        let chain = &mut self.state.validators;
        if chain.has_role(ValidatorRole::UploadIntegrity) {
            return;
        }
        if self.injected.as_ref().is_some_and(|v| chain.contains(v)) {
            return;
        }
        let validator: Arc<dyn Validator> =
            match chain.plugin_manager().get(ValidatorPluginManager::UPLOAD_FILE) {
                Ok(validator) => validator,
                Err(err) => {
                    tracing::warn!(
                        input = %self.state.name,
                        error = %err,
                        "upload validator unavailable from plugins; using built-in"
                    );
                    Arc::new(UploadFile::default())
                }
            };
        chain.prepend_shared(Arc::clone(&validator), true);
        self.injected = Some(validator);
        tracing::debug!(input = %self.state.name, "prepended upload validator");
    }

    fn filter_descriptor(&self, value: Value) -> Value {
        self.state.filters.filter(value)
    }
}

fn has_tmp_name(value: &Value) -> bool {
    value.as_object().is_some_and(|m| m.contains_key("tmp_name"))
}

impl InputInterface for FileInput {
    fn state(&self) -> &InputState {
        &self.state
    }

    /// Any change may touch the value or the filters, so the filtered view
    /// waits for the next validation.
    fn state_mut(&mut self) -> &mut InputState {
        self.validated = false;
        &mut self.state
    }

    fn set_value(&mut self, value: Value) {
        self.state.value = Some(value);
        self.validated = false;
    }

    fn clear_value(&mut self) {
        self.state.value = None;
        self.validated = false;
    }

    /// The raw value until a successful validation, the filtered value after.
    ///
    /// A multi-file value is filtered element by element; elements that are
    /// not descriptors are dropped.
    fn value(&self) -> Value {
        let raw = self.state.raw().clone();
        if !self.validated {
            return raw;
        }
        match raw {
            single if has_tmp_name(&single) => self.filter_descriptor(single),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .filter(has_tmp_name)
                    .map(|item| self.filter_descriptor(item))
                    .collect(),
            ),
            other => other,
        }
    }

    fn is_valid(&mut self, context: Option<&Value>) -> bool {
        self.validated = false;

        let has_value = self.state.value.is_some();
        let required = self.state.required;
        let allow_empty = self.state.allow_empty;
        let continue_if_empty = self.state.continue_if_empty;
        let empty = is_empty_file(self.state.raw());

        if !has_value && !required {
            return self.state.finish(Ok(()));
        }
        if !has_value {
            return self.state.fail_required();
        }
        if empty && !required && !continue_if_empty {
            return self.state.finish(Ok(()));
        }
        if empty && allow_empty && !continue_if_empty {
            return self.state.finish(Ok(()));
        }

        self.inject_upload_validator();

        let chain = &self.state.validators;
        let result = match normalize_upload(self.state.raw()) {
            NormalizedUpload::Single(descriptor) => chain.validate(&descriptor, context),
            // Stop at the first bad file.
            NormalizedUpload::Multiple(descriptors) => descriptors
                .iter()
                .try_for_each(|descriptor| chain.validate(descriptor, context)),
        };

        self.validated = self.state.finish(result);
        self.validated
    }

    fn merge(&mut self, source: &dyn InputInterface) {
        self.state.merge_from(source.state());
        if let Some(file_input) = source.as_file_input() {
            self.auto_prepend_upload_validator = file_input.auto_prepend_upload_validator;
            let own_still_present = self
                .injected
                .as_ref()
                .is_some_and(|v| self.state.validators.contains(v));
            if !own_still_present {
                self.injected = file_input.injected.clone();
            }
        }
        self.validated = false;
    }

    fn as_file_input(&self) -> Option<&FileInput> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SetField;
    use crate::plugin::Plugin;
    use crate::validator::{Callback, NotEmpty};
    use serde_json::json;

    fn fixture_input() -> FileInput {
        FileInput::new("foo").with_auto_prepend_upload_validator(false)
    }

    #[test]
    fn auto_prepend_is_on_by_default() {
        assert!(FileInput::new("foo").auto_prepend_upload_validator());
    }

    #[test]
    fn value_is_raw_until_validated() {
        let mut input = fixture_input();
        input.set_value(json!({"tmp_name": "bar"}));
        input.filter_chain_mut().attach(SetField::new("tmp_name", "foo"));

        assert_eq!(input.value(), json!({"tmp_name": "bar"}));
        assert!(input.is_valid(None), "{:?}", input.messages());
        assert_eq!(input.value(), json!({"tmp_name": "foo"}));
        assert_eq!(input.raw_value(), &json!({"tmp_name": "bar"}));
    }

    #[test]
    fn setting_a_new_value_resets_filtering() {
        let mut input = fixture_input();
        input.filter_chain_mut().attach(SetField::new("tmp_name", "new"));
        input.set_value(json!({"tmp_name": "bar"}));
        assert!(input.is_valid(None));

        input.set_value(json!({"tmp_name": "baz"}));
        assert_eq!(input.value(), json!({"tmp_name": "baz"}));
    }

    #[test]
    fn multi_file_values_are_filtered_per_descriptor() {
        let mut input = fixture_input();
        input.set_value(json!([
            {"tmp_name": "foo"},
            {"tmp_name": "bar"},
            {"tmp_name": "baz"},
        ]));
        input.filter_chain_mut().attach(SetField::new("tmp_name", "new"));

        assert!(input.is_valid(None));
        assert_eq!(
            input.value(),
            json!([{"tmp_name": "new"}, {"tmp_name": "new"}, {"tmp_name": "new"}])
        );
    }

    #[test]
    fn validators_run_before_filters() {
        let bad = json!({"tmp_name": " /tmp/x ", "name": "foo", "size": 1, "error": 0});
        let expected = bad.clone();

        let mut input = fixture_input();
        input.set_value(bad.clone());
        input.filter_chain_mut().attach(SetField::new("tmp_name", "new"));
        input.validator_chain_mut().attach(
            Callback::new("seen", "saw raw value", move |v, _| {
                assert_eq!(v, &expected);
                false
            }),
            false,
        );

        assert!(!input.is_valid(None));
        assert_eq!(input.value(), bad);
    }

    #[test]
    fn upload_validator_not_added_when_disabled() {
        let mut input = fixture_input();
        input.set_value(json!({"tmp_name": "bar"}));

        assert!(input.is_valid(None));
        assert!(input.validator_chain().is_empty());
    }

    #[test]
    fn existing_upload_validator_is_not_duplicated() {
        let mut input = FileInput::new("foo");
        input.set_value(json!({"tmp_name": "bar"}));

        #[derive(Debug)]
        struct TrustingUpload;
        impl crate::validator::Validator for TrustingUpload {
            fn validate(
                &self,
                _value: &Value,
                _context: Option<&Value>,
            ) -> Result<(), crate::ValidationError> {
                Ok(())
            }
            fn role(&self) -> ValidatorRole {
                ValidatorRole::UploadIntegrity
            }
        }
        input.validator_chain_mut().prepend(TrustingUpload, true);

        assert!(input.is_valid(None));
        assert_eq!(input.validator_chain().len(), 1);
    }

    #[test]
    fn replaced_upload_plugin_without_role_is_injected_once() {
        let mut plugins = ValidatorPluginManager::with_defaults();
        plugins.register_or_replace(ValidatorPluginManager::UPLOAD_FILE, |_| {
            Ok(Plugin::Validator(Arc::new(Callback::new("x", "x", |_, _| true))))
        });
        let mut input = FileInput::with_plugins("foo", Arc::new(plugins));
        input.set_value(json!(""));

        for _ in 0..3 {
            assert!(input.is_valid(None));
        }

        assert_eq!(input.validator_chain().len(), 1);
    }

    #[test]
    fn replacing_the_chain_allows_a_fresh_injection() {
        let mut input = FileInput::new("foo");
        input.set_value(json!(""));
        assert!(!input.is_valid(None));

        input.set_validator_chain(crate::ValidatorChain::new());
        assert!(!input.is_valid(None));

        assert_eq!(input.validator_chain().len(), 1);
    }

    #[test]
    fn merged_file_input_keeps_single_injected_validator() {
        let mut plugins = ValidatorPluginManager::with_defaults();
        plugins.register_or_replace(ValidatorPluginManager::UPLOAD_FILE, |_| {
            Ok(Plugin::Validator(Arc::new(Callback::new("x", "x", |_, _| true))))
        });
        let plugins = Arc::new(plugins);

        let mut source = FileInput::with_plugins("foo", Arc::clone(&plugins));
        source.set_value(json!(""));
        assert!(source.is_valid(None));

        let mut target = FileInput::with_plugins("foo", plugins);
        target.merge(&source);
        assert!(target.is_valid(None));

        assert_eq!(target.validator_chain().len(), 1);
    }

    #[test]
    fn state_changes_after_validation_hide_filtered_value() {
        let mut input = fixture_input();
        input.filter_chain_mut().attach(SetField::new("name", "filtered"));
        input.set_value(json!({"tmp_name": "a"}));
        assert!(input.is_valid(None));
        assert_eq!(input.value()["name"], json!("filtered"));

        input.state_mut().value = Some(json!({"tmp_name": "b"}));
        assert_eq!(input.value(), json!({"tmp_name": "b"}));

        assert!(input.is_valid(None));
        input.set_filter_chain(crate::FilterChain::new());
        input.filter_chain_mut().attach(SetField::new("name", "late"));
        assert_eq!(input.value(), json!({"tmp_name": "b"}));
    }

    #[test]
    fn required_without_value_fails() {
        let mut input = fixture_input();
        assert!(!input.is_valid(None));
        assert_eq!(input.messages()[0].code(), NotEmpty::IS_EMPTY);
    }

    #[test]
    fn optional_empty_upload_passes() {
        let mut input = FileInput::new("foo");
        input.set_required(false);
        input.set_value(json!({"tmp_name": "", "error": 4}));

        assert!(input.is_valid(None));
        // Nothing ran, so nothing was injected.
        assert!(input.validator_chain().is_empty());
    }

    #[test]
    fn allow_empty_passes_required_empty_upload() {
        let mut input = FileInput::new("foo");
        input.set_allow_empty(true);
        input.set_value(json!([{"tmp_name": "", "error": 4}, {"tmp_name": "", "error": 4}]));

        assert!(input.is_valid(None));
    }

    #[test]
    fn no_not_empty_validator_is_injected() {
        let mut input = fixture_input();
        input.set_value(json!(""));

        input.is_valid(None);

        assert!(!input.validator_chain().has_role(ValidatorRole::NotEmpty));
    }

    #[test]
    fn multi_file_validation_stops_at_first_failure() {
        let mut input = fixture_input();
        input.set_value(json!([
            {"tmp_name": "a", "error": 0},
            {"tmp_name": "b", "error": 3},
            {"tmp_name": "c", "error": 3},
        ]));
        input.validator_chain_mut().attach(
            Callback::new("partial", "partial upload", |v, _| v["error"] == json!(0)),
            false,
        );

        assert!(!input.is_valid(None));
        assert_eq!(input.messages().len(), 1);
    }

    #[test]
    fn is_empty_file_delegates_to_classifier() {
        let input = fixture_input();
        assert!(input.is_empty_file(&json!({"tmp_name": "", "error": 4})));
        assert!(!input.is_empty_file(&json!({"tmp_name": "name", "error": 0})));
    }

    #[test]
    fn merge_copies_auto_prepend_flag() {
        let source = FileInput::new("source");
        let mut target = fixture_input();

        target.merge(&source);

        assert!(target.auto_prepend_upload_validator());
        assert_eq!(target.name(), "source");
    }

    #[test]
    fn merge_from_plain_input_keeps_flag() {
        let source = crate::input::Input::new("plain");
        let mut target = fixture_input();

        target.merge(&source);

        assert!(!target.auto_prepend_upload_validator());
    }
}
