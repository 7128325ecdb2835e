use std::fmt;

/// Configuration faults raised by plugin managers and input filters.
///
/// Validation failures are not errors: they are reported as
/// [`ValidationError`](crate::ValidationError) messages on the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A factory produced a plugin that lacks the capability the manager serves.
    InvalidPlugin {
        /// The name the plugin was requested under
        name: String,
        /// The capability the manager requires
        expected: &'static str,
        /// The kind of plugin the factory actually produced
        actual: &'static str,
    },
    /// No factory is registered under the requested name.
    PluginNotFound {
        /// The kind of manager that was asked
        kind: &'static str,
        /// The requested name
        name: String,
    },
    /// A factory is already registered under this name.
    DuplicatePlugin {
        /// The kind of manager that was asked
        kind: &'static str,
        /// The canonical name that collided
        name: String,
    },
    /// A plugin factory could not interpret its options.
    InvalidOptions {
        /// The plugin whose options were rejected
        plugin: String,
        /// What was wrong with them
        message: String,
    },
    /// `is_valid` was called on an input filter before any data was set.
    MissingData,
    /// Verified values were requested before a successful validation.
    NotValidated,
    /// No input with this name exists in the input filter.
    InputNotFound(String),
}

impl Error {
    /// Creates an [`Error::InvalidOptions`] for the given plugin.
    pub fn invalid_options(plugin: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::InvalidOptions {
            plugin: plugin.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPlugin {
                name,
                expected,
                actual,
            } => write!(
                f,
                "Plugin '{}' of type {} is invalid; must implement {}",
                name, actual, expected
            ),
            Error::PluginNotFound { kind, name } => {
                write!(f, "{} manager has no plugin named '{}'", kind, name)
            }
            Error::DuplicatePlugin { kind, name } => {
                write!(f, "{} manager already has a plugin named '{}'", kind, name)
            }
            Error::InvalidOptions { plugin, message } => {
                write!(f, "Invalid options for plugin '{}': {}", plugin, message)
            }
            Error::MissingData => write!(f, "No data present to validate"),
            Error::NotValidated => write!(f, "Values have not passed validation"),
            Error::InputNotFound(name) => write!(f, "No input named '{}'", name),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_plugin_names_the_missing_capability() {
        let err = Error::InvalidPlugin {
            name: "digits".to_string(),
            expected: "InputFilterInterface",
            actual: "Validator",
        };

        let output = err.to_string();
        assert!(output.contains("digits"));
        assert!(output.contains("must implement InputFilterInterface"));
    }

    #[test]
    fn invalid_options_constructor() {
        let err = Error::invalid_options("stringlength", "min exceeds max");
        assert_eq!(
            err,
            Error::InvalidOptions {
                plugin: "stringlength".to_string(),
                message: "min exceeds max".to_string(),
            }
        );
    }
}
