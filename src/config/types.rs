use std::collections::BTreeMap;
use std::path::PathBuf;

use super::registry::Registry;
use super::value::Value;

/// A loaded set of settings resolved lazily against a [`Registry`].
#[derive(Debug, Clone)]
pub struct Config {
    pub(super) registry: Registry,
    pub(super) items: BTreeMap<String, Value>,
    pub(super) defaults: BTreeMap<String, Value>,
    pub(super) source: Option<PathBuf>,
}

impl Config {
    /// Build a configuration from explicit values and instance defaults.
    /// Explicit values given under an alias land on the canonical key.
    pub fn new<I, K, V>(registry: &Registry, items: I, defaults: BTreeMap<String, Value>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut config = Self::with_defaults(registry, defaults);
        for (key, value) in items {
            config.set_value(key, value);
        }
        config
    }

    /// A configuration seeded only from instance defaults.
    pub fn with_defaults(registry: &Registry, defaults: BTreeMap<String, Value>) -> Self {
        Self {
            registry: registry.clone(),
            items: BTreeMap::new(),
            defaults,
            source: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// File or directory this configuration was loaded from.
    pub fn source(&self) -> Option<&std::path::Path> {
        self.source.as_deref()
    }

    pub fn explicit_items(&self) -> &BTreeMap<String, Value> {
        &self.items
    }

    pub fn instance_defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    /// Merged view: registry defaults, then instance defaults, then
    /// explicit values. Environment overrides are not included.
    pub fn items(&self) -> BTreeMap<String, Value> {
        let mut values = self.registry.defaults();
        values.extend(self.defaults.iter().map(|(k, v)| (k.clone(), v.clone())));
        values.extend(self.items.iter().map(|(k, v)| (k.clone(), v.clone())));
        values
    }
}
