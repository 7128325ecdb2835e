//! Input filters: named collections of inputs validated as one data set.
//!
//! An [`InputFilter`] distributes a data map across its inputs, validates
//! each one against the whole set, and reports which inputs passed, which
//! failed, and why. Input filters nest: a nested filter receives the
//! sub-map stored under its name.

mod factory;

use std::fmt;

use indexmap::IndexMap;

use crate::input::InputInterface;
use crate::validator::ValidationError;
use crate::value::{Map, Value};
use crate::verified::Verified;
use crate::Error;

pub use factory::{Factory, FilterSpec, InputKind, InputSpec, ValidatorSpec};

/// The contract every input filter fulfils.
///
/// Custom input filters usually wrap an [`InputFilter`] and add their
/// inputs in [`init`](Self::init), which the
/// [`InputFilterPluginManager`](crate::plugin::InputFilterPluginManager)
/// calls after injecting its plugin managers into [`factory_mut`](Self::factory_mut).
pub trait InputFilterInterface: fmt::Debug + Send {
    /// Replaces the data set and distributes it to the inputs.
    fn set_data(&mut self, data: Map<String, Value>);

    /// Validates the current data set.
    ///
    /// `context` defaults to the data set itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingData`] if no data was set.
    fn is_valid(&mut self, context: Option<&Value>) -> Result<bool, Error>;

    /// Filtered values of every input.
    fn values(&self) -> Map<String, Value>;

    /// Raw values of every input.
    fn raw_values(&self) -> Map<String, Value>;

    /// Messages of every input that failed the last validation, keyed by
    /// input name. Nested failures use dotted keys, e.g. `address.zip`.
    fn messages(&self) -> IndexMap<String, Vec<ValidationError>>;

    /// Hook run once after creation through a plugin manager.
    fn init(&mut self) {}

    /// The factory this input filter builds inputs with, if it has one.
    fn factory_mut(&mut self) -> Option<&mut Factory> {
        None
    }
}

#[derive(Debug)]
enum Entry {
    Input(Box<dyn InputInterface>),
    Filter(Box<dyn InputFilterInterface>),
}

/// The standard input filter.
///
/// Inputs are kept in insertion order. Validation visits them in that
/// order and stops early after a failing input that has
/// [`break_on_failure`](InputInterface::break_on_failure) set.
///
/// # Examples
///
/// ```
/// use input_filter::input::{FileInput, Input, InputInterface};
/// use input_filter::input_filter::{InputFilter, InputFilterInterface};
/// use input_filter::validator::StringLength;
/// use serde_json::json;
///
/// let mut username = Input::new("username");
/// username.validator_chain_mut().attach(StringLength::new(3, None), false);
///
/// let mut avatar = FileInput::new("avatar");
/// avatar.set_required(false);
///
/// let mut form = InputFilter::new();
/// form.add(username).add(avatar);
///
/// form.set_data(json!({"username": "al"}).as_object().unwrap().clone());
/// assert!(!form.is_valid(None).unwrap());
/// assert_eq!(form.invalid_inputs(), ["username"]);
/// assert!(form.messages().contains_key("username"));
/// ```
#[derive(Debug, Default)]
pub struct InputFilter {
    entries: IndexMap<String, Entry>,
    data: Option<Map<String, Value>>,
    valid_inputs: Vec<String>,
    invalid_inputs: Vec<String>,
    validated: bool,
    factory: Factory,
}

impl InputFilter {
    /// Creates an empty input filter with a default [`Factory`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty input filter that builds inputs with `factory`.
    pub fn with_factory(factory: Factory) -> Self {
        Self {
            factory,
            ..Self::default()
        }
    }

    /// Adds an input under its own name.
    ///
    /// If an input with that name exists, the new one is merged into it.
    /// If a nested input filter has that name, it is replaced.
    pub fn add(&mut self, input: impl InputInterface + 'static) -> &mut Self {
        self.add_boxed(Box::new(input))
    }

    /// Adds a boxed input; see [`add`](Self::add).
    pub fn add_boxed(&mut self, input: Box<dyn InputInterface>) -> &mut Self {
        let name = input.name().to_string();
        match self.entries.get_mut(&name) {
            Some(Entry::Input(existing)) => {
                tracing::debug!(input = %name, "merging into existing input");
                existing.merge(input.as_ref());
            }
            _ => {
                self.entries.insert(name, Entry::Input(input));
            }
        }
        self.reset();
        self
    }

    /// Adds an input built from `spec` by this filter's factory.
    ///
    /// # Errors
    ///
    /// See [`Factory::create_input`].
    pub fn add_spec(&mut self, spec: &InputSpec) -> Result<&mut Self, Error> {
        let input = self.factory.create_input(spec)?;
        Ok(self.add_boxed(input))
    }

    /// Nests an input filter under `name`, replacing any entry of that name.
    pub fn add_input_filter(
        &mut self,
        name: impl Into<String>,
        input_filter: impl InputFilterInterface + 'static,
    ) -> &mut Self {
        self.entries
            .insert(name.into(), Entry::Filter(Box::new(input_filter)));
        self.reset();
        self
    }

    /// The input named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputNotFound`] if there is no input of that name.
    /// Nested input filters are reached through
    /// [`get_input_filter`](Self::get_input_filter).
    pub fn get(&self, name: &str) -> Result<&dyn InputInterface, Error> {
        match self.entries.get(name) {
            Some(Entry::Input(input)) => Ok(input.as_ref()),
            _ => Err(Error::InputNotFound(name.to_string())),
        }
    }

    /// The input named `name`, mutably.
    ///
    /// The input may change through the returned reference, so the last
    /// validation result is dropped and
    /// [`verified_values`](Self::verified_values) fails until the next
    /// [`is_valid`](InputFilterInterface::is_valid).
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn get_mut(&mut self, name: &str) -> Result<&mut (dyn InputInterface + 'static), Error> {
        if !matches!(self.entries.get(name), Some(Entry::Input(_))) {
            return Err(Error::InputNotFound(name.to_string()));
        }
        self.reset();
        match self.entries.get_mut(name) {
            Some(Entry::Input(input)) => Ok(input.as_mut()),
            _ => Err(Error::InputNotFound(name.to_string())),
        }
    }

    /// The nested input filter named `name`.
    pub fn get_input_filter(&self, name: &str) -> Option<&dyn InputFilterInterface> {
        match self.entries.get(name)? {
            Entry::Filter(input_filter) => Some(input_filter.as_ref()),
            Entry::Input(_) => None,
        }
    }

    /// Returns true if an input or nested input filter is named `name`.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Removes the input or nested input filter named `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.entries.shift_remove(name).is_some();
        if removed {
            self.reset();
        }
        removed
    }

    /// Number of inputs and nested input filters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the inputs that passed the last validation.
    pub fn valid_inputs(&self) -> &[String] {
        &self.valid_inputs
    }

    /// Names of the inputs that failed the last validation.
    pub fn invalid_inputs(&self) -> &[String] {
        &self.invalid_inputs
    }

    /// The factory used by [`add_spec`](Self::add_spec).
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Filtered values, available only after a successful validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotValidated`] unless the last call to
    /// [`is_valid`](InputFilterInterface::is_valid) succeeded with no
    /// changes since.
    pub fn verified_values(&self) -> Result<Verified<Map<String, Value>>, Error> {
        if !self.validated {
            return Err(Error::NotValidated);
        }
        Ok(Verified::new_unchecked(self.values()))
    }

    fn reset(&mut self) {
        self.valid_inputs.clear();
        self.invalid_inputs.clear();
        self.validated = false;
    }
}

impl InputFilterInterface for InputFilter {
    fn set_data(&mut self, data: Map<String, Value>) {
        for (name, entry) in &mut self.entries {
            match entry {
                Entry::Input(input) => match data.get(name) {
                    Some(value) => input.set_value(value.clone()),
                    None => input.clear_value(),
                },
                Entry::Filter(input_filter) => {
                    let nested = match data.get(name) {
                        Some(Value::Object(nested)) => nested.clone(),
                        _ => Map::new(),
                    };
                    input_filter.set_data(nested);
                }
            }
        }
        self.data = Some(data);
        self.reset();
    }

    fn is_valid(&mut self, context: Option<&Value>) -> Result<bool, Error> {
        let data = self.data.as_ref().ok_or(Error::MissingData)?;
        let context = match context {
            Some(context) => context.clone(),
            None => Value::Object(data.clone()),
        };

        let mut valid_inputs = Vec::new();
        let mut invalid_inputs = Vec::new();

        for (name, entry) in &mut self.entries {
            match entry {
                Entry::Input(input) => {
                    // Optional inputs absent from the data set are not validated.
                    if !data.contains_key(name) && !input.is_required() {
                        continue;
                    }
                    if input.is_valid(Some(&context)) {
                        valid_inputs.push(name.clone());
                        continue;
                    }
                    invalid_inputs.push(name.clone());
                    if input.break_on_failure() {
                        tracing::debug!(input = %name, "stopping validation after failure");
                        break;
                    }
                }
                Entry::Filter(input_filter) => {
                    if input_filter.is_valid(None)? {
                        valid_inputs.push(name.clone());
                    } else {
                        invalid_inputs.push(name.clone());
                    }
                }
            }
        }

        let valid = invalid_inputs.is_empty();
        tracing::debug!(
            valid,
            passed = valid_inputs.len(),
            failed = invalid_inputs.len(),
            "validated input filter"
        );

        self.valid_inputs = valid_inputs;
        self.invalid_inputs = invalid_inputs;
        self.validated = valid;
        Ok(valid)
    }

    fn values(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(name, entry)| {
                let value = match entry {
                    Entry::Input(input) => input.value(),
                    Entry::Filter(input_filter) => Value::Object(input_filter.values()),
                };
                (name.clone(), value)
            })
            .collect()
    }

    fn raw_values(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(name, entry)| {
                let value = match entry {
                    Entry::Input(input) => input.raw_value().clone(),
                    Entry::Filter(input_filter) => Value::Object(input_filter.raw_values()),
                };
                (name.clone(), value)
            })
            .collect()
    }

    fn messages(&self) -> IndexMap<String, Vec<ValidationError>> {
        let mut messages = IndexMap::new();
        for name in &self.invalid_inputs {
            match self.entries.get(name) {
                Some(Entry::Input(input)) => {
                    messages.insert(name.clone(), input.messages().to_vec());
                }
                Some(Entry::Filter(input_filter)) => {
                    for (child, errors) in input_filter.messages() {
                        messages.insert(format!("{name}.{child}"), errors);
                    }
                }
                None => {}
            }
        }
        messages
    }

    fn factory_mut(&mut self) -> Option<&mut Factory> {
        Some(&mut self.factory)
    }
}
