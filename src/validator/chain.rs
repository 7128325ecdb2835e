use std::sync::Arc;

use crate::plugin::ValidatorPluginManager;
use crate::value::Value;
use crate::Error;

use super::{ValidationError, Validator, ValidatorRole};

/// A validator together with its chain settings.
#[derive(Debug, Clone)]
pub struct ValidatorEntry {
    validator: Arc<dyn Validator>,
    break_chain_on_failure: bool,
}

impl ValidatorEntry {
    /// The validator itself.
    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    /// Whether a failure of this validator stops the chain.
    pub fn breaks_chain_on_failure(&self) -> bool {
        self.break_chain_on_failure
    }
}

/// Ordered list of validators run against one value.
///
/// Every chain carries the validator plugin manager used to resolve
/// validators by name, including the ones inputs inject on their own.
///
/// # Examples
///
/// ```
/// use input_filter::validator::{NotEmpty, StringLength, ValidatorChain};
/// use serde_json::json;
///
/// let mut chain = ValidatorChain::new();
/// chain.attach(NotEmpty, true);
/// chain.attach(StringLength::new(3, Some(8)), false);
///
/// assert!(chain.validate(&json!("alice"), None).is_ok());
///
/// let errors = chain.validate(&json!(""), None).unwrap_err();
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].code(), "isEmpty");
/// ```
#[derive(Debug, Clone)]
pub struct ValidatorChain {
    entries: Vec<ValidatorEntry>,
    plugins: Arc<ValidatorPluginManager>,
}

impl ValidatorChain {
    /// Creates an empty chain backed by the default validator plugins.
    pub fn new() -> Self {
        Self::with_plugin_manager(Arc::new(ValidatorPluginManager::with_defaults()))
    }

    /// Creates an empty chain backed by the given plugin manager.
    pub fn with_plugin_manager(plugins: Arc<ValidatorPluginManager>) -> Self {
        Self {
            entries: Vec::new(),
            plugins,
        }
    }

    /// The plugin manager used for name lookups.
    pub fn plugin_manager(&self) -> &Arc<ValidatorPluginManager> {
        &self.plugins
    }

    /// Replaces the plugin manager used for name lookups.
    pub fn set_plugin_manager(&mut self, plugins: Arc<ValidatorPluginManager>) {
        self.plugins = plugins;
    }

    /// Appends a validator.
    pub fn attach(
        &mut self,
        validator: impl Validator + 'static,
        break_chain_on_failure: bool,
    ) -> &mut Self {
        self.attach_shared(Arc::new(validator), break_chain_on_failure)
    }

    /// Appends an already shared validator.
    pub fn attach_shared(
        &mut self,
        validator: Arc<dyn Validator>,
        break_chain_on_failure: bool,
    ) -> &mut Self {
        self.entries.push(ValidatorEntry {
            validator,
            break_chain_on_failure,
        });
        self
    }

    /// Resolves a validator by name and appends it.
    ///
    /// # Errors
    ///
    /// Propagates lookup and option errors from the plugin manager.
    pub fn attach_by_name(
        &mut self,
        name: &str,
        options: &Value,
        break_chain_on_failure: bool,
    ) -> Result<&mut Self, Error> {
        let validator = self.plugins.get_with_options(name, options)?;
        Ok(self.attach_shared(validator, break_chain_on_failure))
    }

    /// Inserts a validator at the front of the chain.
    pub fn prepend(
        &mut self,
        validator: impl Validator + 'static,
        break_chain_on_failure: bool,
    ) -> &mut Self {
        self.prepend_shared(Arc::new(validator), break_chain_on_failure)
    }

    /// Inserts an already shared validator at the front of the chain.
    pub fn prepend_shared(
        &mut self,
        validator: Arc<dyn Validator>,
        break_chain_on_failure: bool,
    ) -> &mut Self {
        self.entries.insert(
            0,
            ValidatorEntry {
                validator,
                break_chain_on_failure,
            },
        );
        self
    }

    /// Resolves a validator by name and inserts it at the front.
    ///
    /// # Errors
    ///
    /// Propagates lookup and option errors from the plugin manager.
    pub fn prepend_by_name(
        &mut self,
        name: &str,
        options: &Value,
        break_chain_on_failure: bool,
    ) -> Result<&mut Self, Error> {
        let validator = self.plugins.get_with_options(name, options)?;
        Ok(self.prepend_shared(validator, break_chain_on_failure))
    }

    /// The validators in run order.
    pub fn validators(&self) -> &[ValidatorEntry] {
        &self.entries
    }

    /// Returns true if any validator in the chain plays `role`.
    pub fn has_role(&self, role: ValidatorRole) -> bool {
        self.entries.iter().any(|e| e.validator.role() == role)
    }

    /// Returns true if this exact validator instance is in the chain.
    pub fn contains(&self, validator: &Arc<dyn Validator>) -> bool {
        self.entries
            .iter()
            .any(|e| std::ptr::addr_eq(Arc::as_ptr(&e.validator), Arc::as_ptr(validator)))
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the chain has no validators.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the validators in order and collects every failure.
    ///
    /// A failing validator registered with `break_chain_on_failure` stops
    /// the run.
    ///
    /// # Errors
    ///
    /// Returns all collected failures if any validator rejected the value.
    pub fn validate(
        &self,
        value: &Value,
        context: Option<&Value>,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for entry in &self.entries {
            if let Err(err) = entry.validator.validate(value, context) {
                errors.push(err);
                if entry.break_chain_on_failure {
                    break;
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Appends the validators of `other`, keeping this chain's plugin manager.
    pub fn merge(&mut self, other: &ValidatorChain) {
        self.entries.extend(other.entries.iter().cloned());
    }
}

impl Default for ValidatorChain {
    fn default() -> Self {
        Self::new()
    }
}
