//! Setting resolution.
//!
//! A name is resolved by trying each layer in order and stopping at the
//! first that answers:
//!
//! 1. environment variable of the same name (when the registry allows it)
//! 2. explicit values
//! 3. alias redirect to the canonical key (re-enters the chain)
//! 4. instance defaults
//! 5. registry defaults

use super::environment::env_value;
use super::error::{ConfigError, Result};
use super::types::Config;
use super::value::Value;

enum Resolution {
    Found(Value),
    Redirect(String),
}

type Layer = fn(&Config, &str) -> Result<Option<Resolution>>;

const LAYERS: [Layer; 5] = [
    from_environment,
    from_explicit,
    from_alias,
    from_instance_defaults,
    from_registry_defaults,
];

fn from_environment(config: &Config, name: &str) -> Result<Option<Resolution>> {
    if !config.registry.env_allowed() {
        return Ok(None);
    }
    Ok(env_value(name)?.map(Resolution::Found))
}

fn from_explicit(config: &Config, name: &str) -> Result<Option<Resolution>> {
    Ok(config.items.get(name).cloned().map(Resolution::Found))
}

fn from_alias(config: &Config, name: &str) -> Result<Option<Resolution>> {
    Ok(config.registry.redirect(name).map(Resolution::Redirect))
}

fn from_instance_defaults(config: &Config, name: &str) -> Result<Option<Resolution>> {
    Ok(config.defaults.get(name).cloned().map(Resolution::Found))
}

fn from_registry_defaults(config: &Config, name: &str) -> Result<Option<Resolution>> {
    Ok(config.registry.default_of(name).map(Resolution::Found))
}

impl Config {
    /// Resolve `name` through every layer. Fails with
    /// [`ConfigError::AttributeNotFound`] when nothing knows the name.
    pub fn get_value(&self, name: &str) -> Result<Value> {
        for layer in LAYERS {
            match layer(self, name)? {
                Some(Resolution::Found(value)) => return Ok(value),
                Some(Resolution::Redirect(canonical)) => return self.get_value(&canonical),
                None => continue,
            }
        }
        Err(ConfigError::AttributeNotFound(name.to_string()))
    }

    /// Store an explicit value. Writing an alias writes its canonical key.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let key = self.registry.redirect(&name).unwrap_or(name);
        self.items.insert(key, value.into());
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.get_value(name).is_ok()
    }

    /// Like [`Config::get_value`] but falls back to `default` for unknown
    /// names.
    pub fn get_or(&self, name: &str, default: impl Into<Value>) -> Value {
        self.get_value(name).unwrap_or_else(|_| default.into())
    }

    /// Dictionary-style read: unknown names fail with
    /// [`ConfigError::KeyNotFound`].
    pub fn get_item(&self, name: &str) -> Result<Value> {
        self.get_value(name).map_err(|err| match err {
            ConfigError::AttributeNotFound(name) => ConfigError::KeyNotFound(name),
            other => other,
        })
    }

    pub fn set_item(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set_value(name, value);
    }

    /// Registry description of a setting that currently resolves. Aliases
    /// report the description of their canonical key; settings known only
    /// from the file or instance defaults have none.
    pub fn get_description(&self, name: &str) -> Result<Option<String>> {
        if !self.has_value(name) {
            return Err(ConfigError::NoSuchConfiguration(name.to_string()));
        }
        let key = self
            .registry
            .canonical_of(name)
            .unwrap_or_else(|| name.to_string());
        Ok(self.registry.description_of(&key))
    }
}
