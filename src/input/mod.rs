//! Inputs: one named value plus the chains that filter and validate it.
//!
//! [`Input`] handles ordinary scalar and structured values. [`FileInput`]
//! handles upload descriptors: it validates the raw descriptor before any
//! filter runs and injects the upload-integrity validator on its own.

mod file_input;
mod generic;

use std::fmt;
use std::sync::Arc;

use crate::filter::FilterChain;
use crate::plugin::ValidatorPluginManager;
use crate::validator::{NotEmpty, ValidationError, ValidatorChain};
use crate::value::Value;

pub use file_input::FileInput;
pub use generic::Input;

/// Settings and state shared by every input type.
#[derive(Debug, Clone)]
pub struct InputState {
    name: String,
    required: bool,
    allow_empty: bool,
    continue_if_empty: bool,
    break_on_failure: bool,
    error_message: Option<String>,
    value: Option<Value>,
    filters: FilterChain,
    validators: ValidatorChain,
    messages: Vec<ValidationError>,
}

impl InputState {
    pub(crate) fn new(name: impl Into<String>, validators: ValidatorChain) -> Self {
        Self {
            name: name.into(),
            required: true,
            allow_empty: false,
            continue_if_empty: false,
            break_on_failure: false,
            error_message: None,
            value: None,
            filters: FilterChain::new(),
            validators,
            messages: Vec::new(),
        }
    }

    /// The raw value, or null if none was set.
    pub(crate) fn raw(&self) -> &Value {
        self.value.as_ref().unwrap_or(&Value::Null)
    }

    /// Records the outcome of a validation run.
    pub(crate) fn finish(&mut self, result: Result<(), Vec<ValidationError>>) -> bool {
        match result {
            Ok(()) => {
                self.messages.clear();
                true
            }
            Err(errors) => {
                self.messages = match &self.error_message {
                    Some(message) => vec![ValidationError::new("errorMessage", message.clone())],
                    None => errors,
                };
                false
            }
        }
    }

    /// Fails a required input that received no value.
    pub(crate) fn fail_required(&mut self) -> bool {
        self.finish(Err(vec![NotEmpty::error()]))
    }

    /// The merge rules shared by all inputs.
    ///
    /// Settings are copied from `source`; its raw value only if it has one;
    /// its filters and validators are appended to this input's chains.
    pub(crate) fn merge_from(&mut self, source: &InputState) {
        self.break_on_failure = source.break_on_failure;
        self.continue_if_empty = source.continue_if_empty;
        self.error_message = source.error_message.clone();
        self.name = source.name.clone();
        self.required = source.required;
        self.allow_empty = source.allow_empty;
        if let Some(value) = &source.value {
            self.value = Some(value.clone());
        }
        self.filters.merge(&source.filters);
        self.validators.merge(&source.validators);
    }
}

/// The contract every input fulfils.
///
/// Implementors expose their [`InputState`]; the provided methods cover the
/// settings every input shares.
pub trait InputInterface: fmt::Debug + Send {
    /// Shared state.
    fn state(&self) -> &InputState;

    /// Shared state, mutably.
    fn state_mut(&mut self) -> &mut InputState;

    /// The value after filtering.
    fn value(&self) -> Value;

    /// Validates the current value.
    ///
    /// `context` is the whole data set the input belongs to, if any.
    /// Validation may add validators to the chain.
    fn is_valid(&mut self, context: Option<&Value>) -> bool;

    /// Copies settings, value and chains from `source`.
    fn merge(&mut self, source: &dyn InputInterface);

    /// Downcast hook used by merge rules specific to file inputs.
    fn as_file_input(&self) -> Option<&FileInput> {
        None
    }

    /// The input's name.
    fn name(&self) -> &str {
        &self.state().name
    }

    /// Renames the input.
    fn set_name(&mut self, name: String) {
        self.state_mut().name = name;
    }

    /// Sets the raw value.
    fn set_value(&mut self, value: Value) {
        self.state_mut().value = Some(value);
    }

    /// Forgets the value, as if none had been supplied.
    fn clear_value(&mut self) {
        self.state_mut().value = None;
    }

    /// Returns true if a value was supplied, even an empty one.
    fn has_value(&self) -> bool {
        self.state().value.is_some()
    }

    /// The value as supplied, or null.
    fn raw_value(&self) -> &Value {
        self.state().raw()
    }

    /// Whether a value must be supplied. Defaults to true.
    fn is_required(&self) -> bool {
        self.state().required
    }

    /// Sets whether a value must be supplied.
    fn set_required(&mut self, required: bool) {
        self.state_mut().required = required;
    }

    /// Whether an empty value passes without running validators.
    fn allow_empty(&self) -> bool {
        self.state().allow_empty
    }

    /// Sets whether an empty value passes without running validators.
    fn set_allow_empty(&mut self, allow_empty: bool) {
        self.state_mut().allow_empty = allow_empty;
    }

    /// Whether validators still run on an empty value.
    fn continue_if_empty(&self) -> bool {
        self.state().continue_if_empty
    }

    /// Sets whether validators still run on an empty value.
    fn set_continue_if_empty(&mut self, continue_if_empty: bool) {
        self.state_mut().continue_if_empty = continue_if_empty;
    }

    /// Whether a failure of this input stops the enclosing input filter.
    fn break_on_failure(&self) -> bool {
        self.state().break_on_failure
    }

    /// Sets whether a failure of this input stops the enclosing input filter.
    fn set_break_on_failure(&mut self, break_on_failure: bool) {
        self.state_mut().break_on_failure = break_on_failure;
    }

    /// The message that replaces validator messages on failure.
    fn error_message(&self) -> Option<&str> {
        self.state().error_message.as_deref()
    }

    /// Sets the message that replaces validator messages on failure.
    fn set_error_message(&mut self, message: Option<String>) {
        self.state_mut().error_message = message;
    }

    /// The filter chain.
    fn filter_chain(&self) -> &FilterChain {
        &self.state().filters
    }

    /// The filter chain, mutably.
    fn filter_chain_mut(&mut self) -> &mut FilterChain {
        &mut self.state_mut().filters
    }

    /// Replaces the filter chain.
    fn set_filter_chain(&mut self, chain: FilterChain) {
        self.state_mut().filters = chain;
    }

    /// The validator chain.
    fn validator_chain(&self) -> &ValidatorChain {
        &self.state().validators
    }

    /// The validator chain, mutably.
    fn validator_chain_mut(&mut self) -> &mut ValidatorChain {
        &mut self.state_mut().validators
    }

    /// Replaces the validator chain.
    fn set_validator_chain(&mut self, chain: ValidatorChain) {
        self.state_mut().validators = chain;
    }

    /// Messages from the last failed validation; empty after a success.
    fn messages(&self) -> &[ValidationError] {
        &self.state().messages
    }
}

/// Builds the chain new inputs start with.
pub(crate) fn default_chain(plugins: Option<Arc<ValidatorPluginManager>>) -> ValidatorChain {
    match plugins {
        Some(plugins) => ValidatorChain::with_plugin_manager(plugins),
        None => ValidatorChain::new(),
    }
}
