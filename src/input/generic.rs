use std::sync::Arc;

use crate::plugin::ValidatorPluginManager;
use crate::validator::{NotEmpty, Validator, ValidatorRole};
use crate::value::{is_empty_value, Value};

use super::{default_chain, InputInterface, InputState};

/// An ordinary input.
///
/// Validation runs on the filtered value. A required input that may not be
/// empty gets a [`NotEmpty`] validator prepended on its first validation.
///
/// # Examples
///
/// ```
/// use input_filter::filter::StringTrim;
/// use input_filter::input::{Input, InputInterface};
/// use serde_json::json;
///
/// let mut input = Input::new("username");
/// input.filter_chain_mut().attach(StringTrim);
///
/// input.set_value(json!("   "));
/// assert!(!input.is_valid(None));
/// assert_eq!(input.messages()[0].code(), "isEmpty");
///
/// input.set_value(json!("  alice "));
/// assert!(input.is_valid(None));
/// assert_eq!(input.value(), json!("alice"));
/// ```
#[derive(Debug, Clone)]
pub struct Input {
    state: InputState,
    fallback: Option<Value>,
    injected: Option<Arc<dyn Validator>>,
}

impl Input {
    /// Creates a required input backed by the default validator plugins.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: InputState::new(name, default_chain(None)),
            fallback: None,
            injected: None,
        }
    }

    /// Creates a required input whose chain resolves validators through `plugins`.
    pub fn with_plugins(name: impl Into<String>, plugins: Arc<ValidatorPluginManager>) -> Self {
        Self {
            state: InputState::new(name, default_chain(Some(plugins))),
            fallback: None,
            injected: None,
        }
    }

    /// The value used when none is supplied or validation fails.
    pub fn fallback_value(&self) -> Option<&Value> {
        self.fallback.as_ref()
    }

    /// Sets the fallback value.
    pub fn set_fallback_value(&mut self, value: Value) {
        self.fallback = Some(value);
    }

    /// Removes the fallback value.
    pub fn clear_fallback_value(&mut self) {
        self.fallback = None;
    }

    fn take_fallback(&mut self) -> bool {
        match self.fallback.clone() {
            Some(fallback) => {
                self.state.value = Some(fallback);
                self.state.finish(Ok(()))
            }
            None => false,
        }
    }

    fn inject_not_empty_validator(&mut self) {
        let chain = &mut self.state.validators;
        if chain.has_role(ValidatorRole::NotEmpty) {
            return;
        }
        if self.injected.as_ref().is_some_and(|v| chain.contains(v)) {
            return;
        }
        let validator: Arc<dyn Validator> =
            match chain.plugin_manager().get(ValidatorPluginManager::NOT_EMPTY) {
                Ok(validator) => validator,
                Err(err) => {
                    tracing::warn!(
                        input = %self.state.name,
                        error = %err,
                        "not-empty validator unavailable from plugins; using built-in"
                    );
                    Arc::new(NotEmpty)
                }
            };
        chain.prepend_shared(Arc::clone(&validator), true);
        self.injected = Some(validator);
        tracing::debug!(input = %self.state.name, "prepended not-empty validator");
    }
}

impl InputInterface for Input {
    fn state(&self) -> &InputState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut InputState {
        &mut self.state
    }

    fn value(&self) -> Value {
        self.state.filters.filter(self.state.raw().clone())
    }

    fn is_valid(&mut self, context: Option<&Value>) -> bool {
        let has_value = self.state.value.is_some();
        let required = self.state.required;
        let allow_empty = self.state.allow_empty;
        let continue_if_empty = self.state.continue_if_empty;

        if !has_value && self.take_fallback() {
            return true;
        }
        if !has_value && !required {
            return self.state.finish(Ok(()));
        }
        if !has_value {
            return self.state.fail_required();
        }

        let value = self.value();
        let empty = is_empty_value(&value);

        if empty && !required && !continue_if_empty {
            return self.state.finish(Ok(()));
        }
        if empty && allow_empty && !continue_if_empty {
            return self.state.finish(Ok(()));
        }

        if !allow_empty && !continue_if_empty {
            self.inject_not_empty_validator();
        }

        let result = self.state.validators.validate(&value, context);
        if result.is_err() && self.take_fallback() {
            return true;
        }
        self.state.finish(result)
    }

    fn merge(&mut self, source: &dyn InputInterface) {
        self.state.merge_from(source.state());
    }
}
