use std::sync::Arc;

use serde::Deserialize;

use crate::input::{FileInput, Input, InputInterface};
use crate::plugin::{FilterPluginManager, ValidatorPluginManager};
use crate::value::Value;
use crate::Error;

use super::InputFilter;

/// Which input type a spec builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// An [`Input`]
    #[default]
    Input,
    /// A [`FileInput`]
    File,
}

/// A filter reference in an [`InputSpec`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    /// Plugin name
    pub name: String,
    /// Plugin options
    #[serde(default)]
    pub options: Value,
}

/// A validator reference in an [`InputSpec`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorSpec {
    /// Plugin name
    pub name: String,
    /// Plugin options
    #[serde(default)]
    pub options: Value,
    /// Stop the chain when this validator fails
    #[serde(default)]
    pub break_chain_on_failure: bool,
}

fn default_required() -> bool {
    true
}

/// Declarative description of one input.
///
/// # Examples
///
/// ```
/// use input_filter::input_filter::{InputKind, InputSpec};
/// use serde_json::json;
///
/// let spec: InputSpec = serde_json::from_value(json!({
///     "name": "avatar",
///     "type": "file",
///     "validators": [{"name": "filesize", "options": {"max": 1048576}}],
/// }))
/// .unwrap();
///
/// assert_eq!(spec.kind, InputKind::File);
/// assert!(spec.required);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    /// Input name
    pub name: String,
    /// Input type
    #[serde(default, rename = "type")]
    pub kind: InputKind,
    /// See [`InputInterface::is_required`]
    #[serde(default = "default_required")]
    pub required: bool,
    /// See [`InputInterface::allow_empty`]
    #[serde(default)]
    pub allow_empty: bool,
    /// See [`InputInterface::continue_if_empty`]
    #[serde(default)]
    pub continue_if_empty: bool,
    /// See [`InputInterface::break_on_failure`]
    #[serde(default)]
    pub break_on_failure: bool,
    /// See [`InputInterface::error_message`]
    #[serde(default)]
    pub error_message: Option<String>,
    /// Fallback value; plain inputs only
    #[serde(default)]
    pub fallback_value: Option<Value>,
    /// Upload-validator policy; file inputs only
    #[serde(default)]
    pub auto_prepend_upload_validator: Option<bool>,
    /// Filters, in order
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    /// Validators, in order
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
}

impl InputSpec {
    /// A required plain input with no chains.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: InputKind::Input,
            required: true,
            allow_empty: false,
            continue_if_empty: false,
            break_on_failure: false,
            error_message: None,
            fallback_value: None,
            auto_prepend_upload_validator: None,
            filters: Vec::new(),
            validators: Vec::new(),
        }
    }
}

/// Builds inputs and input filters from specs.
///
/// The factory resolves filter and validator names through the plugin
/// managers it holds. Input filters created by an
/// [`InputFilterPluginManager`](crate::plugin::InputFilterPluginManager) get
/// that manager's filter and validator managers injected here.
#[derive(Debug, Clone)]
pub struct Factory {
    filters: Arc<FilterPluginManager>,
    validators: Arc<ValidatorPluginManager>,
}

impl Factory {
    /// A factory backed by the default plugins.
    pub fn new() -> Self {
        Self::with_plugin_managers(
            Arc::new(FilterPluginManager::with_defaults()),
            Arc::new(ValidatorPluginManager::with_defaults()),
        )
    }

    /// A factory backed by the given plugin managers.
    pub fn with_plugin_managers(
        filters: Arc<FilterPluginManager>,
        validators: Arc<ValidatorPluginManager>,
    ) -> Self {
        Self {
            filters,
            validators,
        }
    }

    /// The filter plugin manager.
    pub fn filter_plugin_manager(&self) -> &Arc<FilterPluginManager> {
        &self.filters
    }

    /// Replaces the filter plugin manager.
    pub fn set_filter_plugin_manager(&mut self, filters: Arc<FilterPluginManager>) {
        self.filters = filters;
    }

    /// The validator plugin manager.
    pub fn validator_plugin_manager(&self) -> &Arc<ValidatorPluginManager> {
        &self.validators
    }

    /// Replaces the validator plugin manager.
    pub fn set_validator_plugin_manager(&mut self, validators: Arc<ValidatorPluginManager>) {
        self.validators = validators;
    }

    /// Builds one input.
    ///
    /// # Errors
    ///
    /// Fails if a filter or validator cannot be resolved or rejects its options.
    pub fn create_input(&self, spec: &InputSpec) -> Result<Box<dyn InputInterface>, Error> {
        let mut input: Box<dyn InputInterface> = match spec.kind {
            InputKind::Input => {
                let mut input = Input::with_plugins(spec.name.clone(), self.validators.clone());
                if let Some(fallback) = &spec.fallback_value {
                    input.set_fallback_value(fallback.clone());
                }
                Box::new(input)
            }
            InputKind::File => {
                let mut input = FileInput::with_plugins(spec.name.clone(), self.validators.clone());
                if let Some(enabled) = spec.auto_prepend_upload_validator {
                    input.set_auto_prepend_upload_validator(enabled);
                }
                Box::new(input)
            }
        };

        input.set_required(spec.required);
        input.set_allow_empty(spec.allow_empty);
        input.set_continue_if_empty(spec.continue_if_empty);
        input.set_break_on_failure(spec.break_on_failure);
        input.set_error_message(spec.error_message.clone());

        for filter in &spec.filters {
            input
                .filter_chain_mut()
                .attach_by_name(&self.filters, &filter.name, &filter.options)?;
        }
        for validator in &spec.validators {
            input.validator_chain_mut().attach_by_name(
                &validator.name,
                &validator.options,
                validator.break_chain_on_failure,
            )?;
        }

        tracing::debug!(input = %spec.name, kind = ?spec.kind, "created input from spec");
        Ok(input)
    }

    /// Builds one input from an untyped spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if `spec` is not a valid [`InputSpec`],
    /// otherwise as [`create_input`](Self::create_input).
    pub fn create_input_from_value(&self, spec: &Value) -> Result<Box<dyn InputInterface>, Error> {
        let spec = InputSpec::deserialize(spec).map_err(|e| Error::invalid_options("input", e))?;
        self.create_input(&spec)
    }

    /// Builds an input filter holding one input per spec.
    ///
    /// The new input filter uses this factory's plugin managers.
    ///
    /// # Errors
    ///
    /// As [`create_input`](Self::create_input).
    pub fn create_input_filter(&self, specs: &[InputSpec]) -> Result<InputFilter, Error> {
        let mut input_filter = InputFilter::with_factory(self.clone());
        for spec in specs {
            input_filter.add_boxed(self.create_input(spec)?);
        }
        Ok(input_filter)
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Plugin;
    use crate::validator::Callback;
    use serde_json::json;

    #[test]
    fn spec_defaults() {
        let spec: InputSpec = serde_json::from_value(json!({"name": "email"})).unwrap();
        assert_eq!(spec, InputSpec::new("email"));
    }

    #[test]
    fn spec_rejects_unknown_keys() {
        let result: Result<InputSpec, _> =
            serde_json::from_value(json!({"name": "email", "requird": false}));
        assert!(result.is_err());
    }

    #[test]
    fn builds_plain_input_with_chains() {
        let factory = Factory::new();
        let spec: InputSpec = serde_json::from_value(json!({
            "name": "code",
            "required": false,
            "break_on_failure": true,
            "filters": [{"name": "StringTrim"}],
            "validators": [
                {"name": "Digits", "break_chain_on_failure": true},
                {"name": "StringLength", "options": {"max": 4}},
            ],
        }))
        .unwrap();

        let mut input = factory.create_input(&spec).unwrap();

        assert_eq!(input.name(), "code");
        assert!(!input.is_required());
        assert!(input.break_on_failure());
        assert_eq!(input.filter_chain().len(), 1);
        assert_eq!(input.validator_chain().len(), 2);

        input.set_value(json!(" 1234 "));
        assert!(input.is_valid(None));
        input.set_value(json!("12345"));
        assert!(!input.is_valid(None));
    }

    #[test]
    fn builds_file_input() {
        let factory = Factory::new();
        let spec: InputSpec = serde_json::from_value(json!({
            "name": "avatar",
            "type": "file",
            "auto_prepend_upload_validator": false,
        }))
        .unwrap();

        let input = factory.create_input(&spec).unwrap();
        let file_input = input.as_file_input().expect("file input");
        assert!(!file_input.auto_prepend_upload_validator());
    }

    #[test]
    fn fallback_applies_to_plain_inputs() {
        let factory = Factory::new();
        let mut spec = InputSpec::new("page");
        spec.fallback_value = Some(json!(1));

        let mut input = factory.create_input(&spec).unwrap();
        assert!(input.is_valid(None));
        assert_eq!(input.value(), json!(1));
    }

    #[test]
    fn unknown_plugin_names_fail() {
        let factory = Factory::new();
        let mut spec = InputSpec::new("x");
        spec.validators.push(ValidatorSpec {
            name: "nope".to_string(),
            options: Value::Null,
            break_chain_on_failure: false,
        });

        assert!(matches!(
            factory.create_input(&spec),
            Err(Error::PluginNotFound { kind: "Validator", .. })
        ));
    }

    #[test]
    fn uses_its_validator_manager() {
        let mut validators = ValidatorPluginManager::with_defaults();
        validators
            .register_invokable("even", || {
                Plugin::Validator(Arc::new(Callback::new("odd", "odd", |v, _| {
                    v.as_i64().is_some_and(|n| n % 2 == 0)
                })))
            })
            .unwrap();
        let factory = Factory::with_plugin_managers(
            Arc::new(FilterPluginManager::with_defaults()),
            Arc::new(validators),
        );

        let mut input = factory
            .create_input_from_value(&json!({"name": "n", "validators": [{"name": "even"}]}))
            .unwrap();
        input.set_value(json!(3));
        assert!(!input.is_valid(None));
        assert!(input
            .validator_chain()
            .plugin_manager()
            .has("even"));
    }

    #[test]
    fn create_input_from_value_rejects_bad_spec() {
        let factory = Factory::new();
        assert!(matches!(
            factory.create_input_from_value(&json!({"type": "file"})),
            Err(Error::InvalidOptions { .. })
        ));
    }
}
