//! Typed plugin registries.
//!
//! A [`PluginManager`] maps names to factories. Factories may build any
//! [`Plugin`]; the manager's [`PluginKind`] decides whether the result has
//! the capability the manager serves, and rejects it otherwise. This keeps
//! name-based configuration (`"stringlength"`, `"File\\UploadFile"`) while
//! handing callers concrete trait objects.
//!
//! # Examples
//!
//! ```
//! use input_filter::plugin::{Plugin, ValidatorPluginManager};
//! use input_filter::validator::StringLength;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut validators = ValidatorPluginManager::with_defaults();
//! validators
//!     .register_invokable("username_length", || {
//!         Plugin::Validator(Arc::new(StringLength::new(3, Some(16))))
//!     })
//!     .unwrap();
//!
//! let validator = validators.get("UsernameLength").unwrap();
//! assert!(validator.validate(&json!("al"), None).is_err());
//! ```

mod filters;
mod input_filters;
mod validators;

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::filter::Filter;
use crate::input_filter::InputFilterInterface;
use crate::validator::Validator;
use crate::value::Value;
use crate::Error;

pub use filters::Filters;
pub use input_filters::{InputFilterPluginManager, InputFilters};
pub use validators::Validators;

/// Registry of filters.
pub type FilterPluginManager = PluginManager<Filters>;
/// Registry of validators.
pub type ValidatorPluginManager = PluginManager<Validators>;

/// Anything a factory can build.
pub enum Plugin {
    /// A filter
    Filter(Arc<dyn Filter>),
    /// A validator
    Validator(Arc<dyn Validator>),
    /// An input filter
    InputFilter(Box<dyn InputFilterInterface>),
}

impl Plugin {
    /// Name of the plugin's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Plugin::Filter(_) => "Filter",
            Plugin::Validator(_) => "Validator",
            Plugin::InputFilter(_) => "InputFilterInterface",
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plugin::Filter(inner) => f.debug_tuple("Filter").field(inner).finish(),
            Plugin::Validator(inner) => f.debug_tuple("Validator").field(inner).finish(),
            Plugin::InputFilter(inner) => f.debug_tuple("InputFilter").field(inner).finish(),
        }
    }
}

/// The capability a manager serves.
pub trait PluginKind {
    /// What callers receive from the manager.
    type Output;

    /// Manager name used in errors and logs.
    const KIND: &'static str;

    /// Capability a plugin must have to be accepted.
    const CAPABILITY: &'static str;

    /// Extracts the capability from a constructed plugin.
    ///
    /// # Errors
    ///
    /// Hands the plugin back when it lacks the capability.
    fn accept(plugin: Plugin) -> Result<Self::Output, Plugin>;
}

type Factory = Arc<dyn Fn(&Value) -> Result<Plugin, Error> + Send + Sync>;
type Initializer<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// Canonical form of a plugin name.
///
/// Lowercases and drops `_`, `-`, `\`, `/`, `.` and spaces, so
/// `File\UploadFile`, `file_upload_file` and `fileuploadfile` are one name.
///
/// ```
/// use input_filter::plugin::canonical_name;
///
/// assert_eq!(canonical_name("File\\UploadFile"), "fileuploadfile");
/// assert_eq!(canonical_name("string-length"), "stringlength");
/// ```
pub fn canonical_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | '\\' | '/' | '.' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Name-keyed registry of plugin factories for one capability.
///
/// Every lookup builds a fresh instance; nothing is cached.
pub struct PluginManager<K: PluginKind> {
    factories: HashMap<String, Factory>,
    aliases: HashMap<String, String>,
    initializers: Vec<Initializer<K::Output>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: PluginKind> PluginManager<K> {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            aliases: HashMap::new(),
            initializers: Vec::new(),
            _kind: PhantomData,
        }
    }

    /// Registers a factory that receives the lookup's options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePlugin`] if the name is taken.
    pub fn register(
        &mut self,
        name: &str,
        factory: impl Fn(&Value) -> Result<Plugin, Error> + Send + Sync + 'static,
    ) -> Result<(), Error> {
        let key = canonical_name(name);
        if self.factories.contains_key(&key) {
            return Err(Error::DuplicatePlugin {
                kind: K::KIND,
                name: key,
            });
        }
        self.factories.insert(key, Arc::new(factory));
        Ok(())
    }

    /// Registers a factory, replacing any existing one under the same name.
    pub fn register_or_replace(
        &mut self,
        name: &str,
        factory: impl Fn(&Value) -> Result<Plugin, Error> + Send + Sync + 'static,
    ) {
        let key = canonical_name(name);
        self.aliases.remove(&key);
        self.factories.insert(key, Arc::new(factory));
    }

    /// Registers a factory that takes no options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePlugin`] if the name is taken.
    pub fn register_invokable(
        &mut self,
        name: &str,
        factory: impl Fn() -> Plugin + Send + Sync + 'static,
    ) -> Result<(), Error> {
        self.register(name, move |_| Ok(factory()))
    }

    /// Makes `alias` resolve to `target`.
    pub fn alias(&mut self, alias: &str, target: &str) {
        self.aliases
            .insert(canonical_name(alias), canonical_name(target));
    }

    /// Adds a hook run on every accepted instance, after earlier hooks.
    pub fn add_initializer(&mut self, initializer: impl Fn(&mut K::Output) + Send + Sync + 'static) {
        self.initializers.push(Arc::new(initializer));
    }

    /// Returns true if `name` resolves to a factory.
    pub fn has(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Canonical names with a registered factory, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Builds the plugin registered under `name` with no options.
    ///
    /// # Errors
    ///
    /// See [`get_with_options`](Self::get_with_options).
    pub fn get(&self, name: &str) -> Result<K::Output, Error> {
        self.get_with_options(name, &Value::Null)
    }

    /// Builds the plugin registered under `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::PluginNotFound`] if no factory matches;
    /// - whatever the factory returns, typically [`Error::InvalidOptions`];
    /// - [`Error::InvalidPlugin`] if the factory built a plugin of the wrong kind.
    pub fn get_with_options(&self, name: &str, options: &Value) -> Result<K::Output, Error> {
        let key = self.resolve(name).ok_or_else(|| Error::PluginNotFound {
            kind: K::KIND,
            name: name.to_string(),
        })?;
        let factory = self.factories.get(&key).ok_or_else(|| Error::PluginNotFound {
            kind: K::KIND,
            name: name.to_string(),
        })?;

        let plugin = factory(options)?;
        let mut instance = K::accept(plugin).map_err(|rejected| {
            tracing::warn!(
                kind = K::KIND,
                plugin = %key,
                actual = rejected.kind_name(),
                "factory produced a plugin without the required capability"
            );
            Error::InvalidPlugin {
                name: name.to_string(),
                expected: K::CAPABILITY,
                actual: rejected.kind_name(),
            }
        })?;

        for initializer in &self.initializers {
            initializer(&mut instance);
        }

        tracing::debug!(kind = K::KIND, plugin = %key, "created plugin");
        Ok(instance)
    }

    fn resolve(&self, name: &str) -> Option<String> {
        let mut key = canonical_name(name);
        // Bounded so that alias cycles end instead of spinning.
        for _ in 0..=self.aliases.len() {
            if self.factories.contains_key(&key) {
                return Some(key);
            }
            key = self.aliases.get(&key)?.clone();
        }
        None
    }
}

impl<K: PluginKind> Default for PluginManager<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PluginKind> fmt::Debug for PluginManager<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("kind", &K::KIND)
            .field("plugins", &self.names())
            .field("aliases", &self.aliases.len())
            .field("initializers", &self.initializers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::StringTrim;
    use crate::validator::NotEmpty;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn not_empty() -> Plugin {
        Plugin::Validator(Arc::new(NotEmpty))
    }

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_name("Vendor\\Validator\\NotEmpty"), "vendorvalidatornotempty");
        assert_eq!(canonical_name("Not Empty"), "notempty");
        assert_eq!(canonical_name("not.empty"), "notempty");
    }

    #[test]
    fn lookup_is_canonical() {
        let mut manager = ValidatorPluginManager::new();
        manager.register_invokable("not_empty", not_empty).unwrap();

        assert!(manager.has("NotEmpty"));
        assert!(manager.get("not-empty").is_ok());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut manager = ValidatorPluginManager::new();
        manager.register_invokable("notempty", not_empty).unwrap();

        let err = manager.register_invokable("NotEmpty", not_empty).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicatePlugin {
                kind: "Validator",
                name: "notempty".to_string()
            }
        );
    }

    #[test]
    fn register_or_replace_overrides() {
        let mut manager = ValidatorPluginManager::new();
        manager.register_invokable("check", not_empty).unwrap();
        manager.register_or_replace("check", |_| {
            Ok(Plugin::Validator(Arc::new(crate::validator::Digits)))
        });

        let validator = manager.get("check").unwrap();
        assert!(validator.validate(&json!("abc"), None).is_err());
        assert!(validator.validate(&json!("123"), None).is_ok());
    }

    #[test]
    fn unknown_name_is_not_found() {
        let manager = ValidatorPluginManager::new();
        let err = manager.get("missing").unwrap_err();
        assert!(matches!(err, Error::PluginNotFound { kind: "Validator", .. }));
    }

    #[test]
    fn wrong_capability_is_rejected() {
        let mut manager = ValidatorPluginManager::new();
        manager
            .register_invokable("trim", || Plugin::Filter(Arc::new(StringTrim)))
            .unwrap();

        let err = manager.get("trim").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidPlugin {
                name: "trim".to_string(),
                expected: "Validator",
                actual: "Filter",
            }
        );
    }

    #[test]
    fn aliases_resolve_through_chains() {
        let mut manager = ValidatorPluginManager::new();
        manager.register_invokable("notempty", not_empty).unwrap();
        manager.alias("required", "notempty");
        manager.alias("mandatory", "required");

        assert!(manager.has("Mandatory"));
        assert!(manager.get("mandatory").is_ok());
    }

    #[test]
    fn alias_cycles_terminate() {
        let mut manager = ValidatorPluginManager::new();
        manager.alias("a", "b");
        manager.alias("b", "a");

        assert!(!manager.has("a"));
    }

    #[test]
    fn factories_receive_options() {
        let mut manager = ValidatorPluginManager::new();
        manager
            .register("length", |options| {
                let v = crate::validator::StringLength::from_options(options)?;
                Ok(Plugin::Validator(Arc::new(v)))
            })
            .unwrap();

        let validator = manager
            .get_with_options("length", &json!({"max": 1}))
            .unwrap();
        assert!(validator.validate(&json!("ab"), None).is_err());

        let err = manager
            .get_with_options("length", &json!({"max": "one"}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOptions { .. }));
    }

    #[test]
    fn every_lookup_builds_new_instance_and_runs_initializers() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let mut manager = ValidatorPluginManager::new();
        manager.register_invokable("notempty", not_empty).unwrap();
        manager.add_initializer(|_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
        });

        let a = manager.get("notempty").unwrap();
        let b = manager.get("notempty").unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn names_are_sorted_and_canonical() {
        let mut manager = FilterPluginManager::new();
        manager
            .register_invokable("String_Trim", || Plugin::Filter(Arc::new(StringTrim)))
            .unwrap();
        manager
            .register_invokable("Base-Name", || Plugin::Filter(Arc::new(crate::filter::BaseName)))
            .unwrap();

        assert_eq!(manager.names(), vec!["basename", "stringtrim"]);
    }
}
