use std::sync::Arc;

use crate::filter::{BaseName, Filter, StringToLower, StringToUpper, StringTrim, ToNull};

use super::{FilterPluginManager, Plugin, PluginKind};

/// Marker for managers that serve [`Filter`]s.
#[derive(Debug)]
pub struct Filters;

impl PluginKind for Filters {
    type Output = Arc<dyn Filter>;

    const KIND: &'static str = "Filter";
    const CAPABILITY: &'static str = "Filter";

    fn accept(plugin: Plugin) -> Result<Self::Output, Plugin> {
        match plugin {
            Plugin::Filter(filter) => Ok(filter),
            other => Err(other),
        }
    }
}

impl FilterPluginManager {
    /// A manager preloaded with the built-in filters.
    ///
    /// Registered names: `stringtrim`, `stringtolower`, `stringtoupper`,
    /// `tonull` (alias `null`) and `basename`.
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.register_or_replace("stringtrim", |_| Ok(Plugin::Filter(Arc::new(StringTrim))));
        manager.register_or_replace("stringtolower", |_| {
            Ok(Plugin::Filter(Arc::new(StringToLower)))
        });
        manager.register_or_replace("stringtoupper", |_| {
            Ok(Plugin::Filter(Arc::new(StringToUpper)))
        });
        manager.register_or_replace("tonull", |_| Ok(Plugin::Filter(Arc::new(ToNull))));
        manager.register_or_replace("basename", |_| Ok(Plugin::Filter(Arc::new(BaseName))));
        manager.alias("null", "tonull");
        manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn defaults_are_registered() {
        let manager = FilterPluginManager::with_defaults();
        for name in ["StringTrim", "string_to_lower", "StringToUpper", "Null", "BaseName"] {
            assert!(manager.has(name), "missing default filter {}", name);
        }
    }

    #[test]
    fn default_filters_work() {
        let manager = FilterPluginManager::with_defaults();
        let trim = manager.get("stringtrim").unwrap();
        assert_eq!(trim.filter(json!("  x ")), json!("x"));
    }

    #[test]
    fn validators_are_not_filters() {
        let mut manager = FilterPluginManager::new();
        manager
            .register_invokable("notempty", || {
                Plugin::Validator(Arc::new(crate::validator::NotEmpty))
            })
            .unwrap();

        assert!(matches!(
            manager.get("notempty"),
            Err(Error::InvalidPlugin { expected: "Filter", .. })
        ));
    }
}
