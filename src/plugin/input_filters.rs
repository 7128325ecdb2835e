use std::sync::Arc;

use crate::input_filter::{InputFilter, InputFilterInterface};
use crate::value::Value;
use crate::Error;

use super::{FilterPluginManager, Plugin, PluginKind, PluginManager, ValidatorPluginManager};

/// Marker for managers that serve input filters.
#[derive(Debug)]
pub struct InputFilters;

impl PluginKind for InputFilters {
    type Output = Box<dyn InputFilterInterface>;

    const KIND: &'static str = "InputFilter";
    const CAPABILITY: &'static str = "InputFilterInterface";

    fn accept(plugin: Plugin) -> Result<Self::Output, Plugin> {
        match plugin {
            Plugin::InputFilter(input_filter) => Ok(input_filter),
            other => Err(other),
        }
    }
}

/// Registry of input filters.
///
/// Every instance it hands out gets, in order:
///
/// 1. this manager's filter and validator plugin managers injected into its
///    [`Factory`](crate::input_filter::Factory), when it exposes one;
/// 2. a call to [`init`](InputFilterInterface::init).
///
/// Initializers added with [`add_initializer`](Self::add_initializer) run
/// after both.
///
/// # Examples
///
/// ```
/// use input_filter::input_filter::{InputFilter, InputFilterInterface, InputSpec};
/// use input_filter::plugin::{InputFilterPluginManager, Plugin};
///
/// #[derive(Debug, Default)]
/// struct Signup(InputFilter);
///
/// impl InputFilterInterface for Signup {
///     fn set_data(&mut self, data: serde_json::Map<String, serde_json::Value>) {
///         self.0.set_data(data)
///     }
///     fn is_valid(&mut self, context: Option<&serde_json::Value>) -> Result<bool, input_filter::Error> {
///         self.0.is_valid(context)
///     }
///     fn values(&self) -> serde_json::Map<String, serde_json::Value> {
///         self.0.values()
///     }
///     fn raw_values(&self) -> serde_json::Map<String, serde_json::Value> {
///         self.0.raw_values()
///     }
///     fn messages(&self) -> indexmap::IndexMap<String, Vec<input_filter::ValidationError>> {
///         self.0.messages()
///     }
///     fn init(&mut self) {
///         self.0.add_spec(&InputSpec::new("email")).unwrap();
///     }
///     fn factory_mut(&mut self) -> Option<&mut input_filter::input_filter::Factory> {
///         self.0.factory_mut()
///     }
/// }
///
/// let mut manager = InputFilterPluginManager::with_defaults();
/// manager
///     .register_invokable("signup", || Plugin::InputFilter(Box::new(Signup::default())))
///     .unwrap();
///
/// let mut signup = manager.get("Signup").unwrap();
/// signup.set_data(serde_json::Map::new());
/// assert!(!signup.is_valid(None).unwrap());
/// assert!(signup.messages().contains_key("email"));
/// ```
#[derive(Debug)]
pub struct InputFilterPluginManager {
    plugins: PluginManager<InputFilters>,
    filters: Arc<FilterPluginManager>,
    validators: Arc<ValidatorPluginManager>,
}

impl InputFilterPluginManager {
    /// Name of the plain [`InputFilter`] registered by default.
    pub const INPUT_FILTER: &'static str = "inputfilter";

    /// Creates a manager whose input filters resolve plugins through
    /// `filters` and `validators`.
    pub fn new(filters: Arc<FilterPluginManager>, validators: Arc<ValidatorPluginManager>) -> Self {
        let mut plugins = PluginManager::new();
        plugins.register_or_replace(Self::INPUT_FILTER, |_| {
            Ok(Plugin::InputFilter(Box::new(InputFilter::new())))
        });

        let (populate_filters, populate_validators) = (filters.clone(), validators.clone());
        plugins.add_initializer(move |input_filter: &mut Box<dyn InputFilterInterface>| {
            if let Some(factory) = input_filter.factory_mut() {
                factory.set_filter_plugin_manager(populate_filters.clone());
                factory.set_validator_plugin_manager(populate_validators.clone());
            }
        });
        plugins.add_initializer(|input_filter: &mut Box<dyn InputFilterInterface>| {
            input_filter.init();
        });

        Self {
            plugins,
            filters,
            validators,
        }
    }

    /// A manager backed by the default filter and validator plugins.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(FilterPluginManager::with_defaults()),
            Arc::new(ValidatorPluginManager::with_defaults()),
        )
    }

    /// The filter plugins injected into created input filters.
    pub fn filter_plugin_manager(&self) -> &Arc<FilterPluginManager> {
        &self.filters
    }

    /// The validator plugins injected into created input filters.
    pub fn validator_plugin_manager(&self) -> &Arc<ValidatorPluginManager> {
        &self.validators
    }

    /// See [`PluginManager::register`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePlugin`] if the name is taken.
    pub fn register(
        &mut self,
        name: &str,
        factory: impl Fn(&Value) -> Result<Plugin, Error> + Send + Sync + 'static,
    ) -> Result<(), Error> {
        self.plugins.register(name, factory)
    }

    /// See [`PluginManager::register_or_replace`].
    pub fn register_or_replace(
        &mut self,
        name: &str,
        factory: impl Fn(&Value) -> Result<Plugin, Error> + Send + Sync + 'static,
    ) {
        self.plugins.register_or_replace(name, factory);
    }

    /// See [`PluginManager::register_invokable`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePlugin`] if the name is taken.
    pub fn register_invokable(
        &mut self,
        name: &str,
        factory: impl Fn() -> Plugin + Send + Sync + 'static,
    ) -> Result<(), Error> {
        self.plugins.register_invokable(name, factory)
    }

    /// See [`PluginManager::alias`].
    pub fn alias(&mut self, alias: &str, target: &str) {
        self.plugins.alias(alias, target);
    }

    /// See [`PluginManager::add_initializer`].
    pub fn add_initializer(
        &mut self,
        initializer: impl Fn(&mut Box<dyn InputFilterInterface>) + Send + Sync + 'static,
    ) {
        self.plugins.add_initializer(initializer);
    }

    /// See [`PluginManager::has`].
    pub fn has(&self, name: &str) -> bool {
        self.plugins.has(name)
    }

    /// See [`PluginManager::names`].
    pub fn names(&self) -> Vec<String> {
        self.plugins.names()
    }

    /// Builds the input filter registered under `name`.
    ///
    /// # Errors
    ///
    /// See [`get_with_options`](Self::get_with_options).
    pub fn get(&self, name: &str) -> Result<Box<dyn InputFilterInterface>, Error> {
        self.plugins.get(name)
    }

    /// Builds the input filter registered under `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::PluginNotFound`] if no factory matches;
    /// - [`Error::InvalidPlugin`] if the factory built something other than
    ///   an input filter;
    /// - whatever the factory itself returns.
    pub fn get_with_options(
        &self,
        name: &str,
        options: &Value,
    ) -> Result<Box<dyn InputFilterInterface>, Error> {
        self.plugins.get_with_options(name, options)
    }
}

impl Default for InputFilterPluginManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}
