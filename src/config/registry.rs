use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use super::constants::DEFAULT_GROUP;
use super::value::Value;

/// Catalog of known settings shared by every [`Config`](super::Config)
/// built against it.
///
/// Cloning a `Registry` yields another handle to the same catalog; use
/// [`Registry::new`] for an independent one. Definitions and aliases are
/// expected to be declared during startup, before configurations are read
/// from several threads.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Definitions>>,
}

#[derive(Debug, Default)]
struct Definitions {
    defaults: BTreeMap<String, Value>,
    descriptions: HashMap<String, String>,
    groups: Vec<String>,
    group_items: HashMap<String, Vec<String>>,
    aliases: HashMap<String, Vec<String>>,
    aliased_items: HashMap<String, String>,
    allow_env: bool,
}

/// One documented setting, as listed by [`Registry::sections`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub default: Value,
    pub description: String,
    pub aliases: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) the default and description for `key`
    /// in the `General` group.
    pub fn define(
        &self,
        key: impl Into<String>,
        default: impl Into<Value>,
        description: impl Into<String>,
    ) {
        self.define_in(key, default, description, DEFAULT_GROUP);
    }

    /// Register (or overwrite) `key` under `group`. Defining a key twice
    /// lists it twice in the documentation; the last default wins.
    pub fn define_in(
        &self,
        key: impl Into<String>,
        default: impl Into<Value>,
        description: impl Into<String>,
        group: impl Into<String>,
    ) {
        let key = key.into();
        let group = group.into();
        let mut defs = self.inner.write();

        defs.defaults.insert(key.clone(), default.into());
        defs.descriptions.insert(key.clone(), description.into());
        defs.group_items.entry(group.clone()).or_default().push(key);

        if !defs.groups.contains(&group) {
            defs.groups.push(group);
        }
    }

    /// Make `new_name` redirect to `existing`. Chains are collapsed in both
    /// directions: an alias of an alias points at the canonical key, and
    /// aliases that pointed at `new_name` are moved onto it as well.
    /// Declarations that would form a cycle are ignored with a warning.
    pub fn alias(&self, new_name: impl Into<String>, existing: impl Into<String>) {
        let new_name = new_name.into();
        let existing = existing.into();
        let mut defs = self.inner.write();

        let canonical = defs
            .aliased_items
            .get(&existing)
            .cloned()
            .unwrap_or(existing);

        if canonical == new_name {
            warn!(alias = %new_name, "ignoring alias of {new_name} that would point at itself");
            return;
        }

        for target in defs.aliased_items.values_mut() {
            if *target == new_name {
                *target = canonical.clone();
            }
        }
        let moved = defs.aliases.remove(&new_name).unwrap_or_default();

        let list = defs.aliases.entry(canonical.clone()).or_default();
        list.extend(moved);
        list.push(new_name.clone());
        defs.aliased_items.insert(new_name, canonical);
    }

    /// Serve settings straight from the environment for every
    /// configuration built on this registry.
    pub fn allow_environment_variables(&self) {
        self.inner.write().allow_env = true;
    }

    pub fn disallow_environment_variables(&self) {
        self.inner.write().allow_env = false;
    }

    pub fn env_allowed(&self) -> bool {
        self.inner.read().allow_env
    }

    pub fn default_of(&self, key: &str) -> Option<Value> {
        self.inner.read().defaults.get(key).cloned()
    }

    pub fn description_of(&self, key: &str) -> Option<String> {
        self.inner.read().descriptions.get(key).cloned()
    }

    /// Canonical key for `name` if it is a registered alias.
    pub fn canonical_of(&self, name: &str) -> Option<String> {
        self.inner.read().aliased_items.get(name).cloned()
    }

    /// Canonical key for an alias, logging the deprecation notice. Used on
    /// every read or write through an alias name.
    pub(crate) fn redirect(&self, name: &str) -> Option<String> {
        let canonical = self.canonical_of(name)?;
        warn!(
            alias = name,
            canonical = %canonical,
            "Option {name} is marked as deprecated please use {canonical} instead."
        );
        Some(canonical)
    }

    pub fn aliases_of(&self, key: &str) -> Vec<String> {
        self.inner
            .read()
            .aliases
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of every registry default, sorted by key.
    pub fn defaults(&self) -> BTreeMap<String, Value> {
        self.inner.read().defaults.clone()
    }

    pub fn groups(&self) -> Vec<String> {
        self.inner.read().groups.clone()
    }

    /// Groups in definition order with their entries in listing order.
    pub fn sections(&self) -> Vec<(String, Vec<Entry>)> {
        let defs = self.inner.read();
        defs.groups
            .iter()
            .map(|group| {
                let entries = defs
                    .group_items
                    .get(group)
                    .map(|keys| {
                        keys.iter()
                            .map(|key| Entry {
                                key: key.clone(),
                                default: defs
                                    .defaults
                                    .get(key)
                                    .cloned()
                                    .unwrap_or(Value::None),
                                description: defs
                                    .descriptions
                                    .get(key)
                                    .cloned()
                                    .unwrap_or_default(),
                                aliases: defs.aliases.get(key).cloned().unwrap_or_default(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                (group.clone(), entries)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_records_groups_in_first_seen_order() {
        let registry = Registry::new();
        registry.define_in("FOO", "fooval", "Foo", "FooValues");
        registry.define_in("BAR", "barval", "Bar", "BarValues");
        registry.define_in("BAZ", "bazval", "Baz", "BarValues");

        assert_eq!(registry.groups(), vec!["FooValues", "BarValues"]);
        let sections = registry.sections();
        let bar_keys: Vec<_> = sections[1].1.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(bar_keys, vec!["BAR", "BAZ"]);
    }

    #[test]
    fn redefining_keeps_duplicate_listing_and_last_default() {
        let registry = Registry::new();
        registry.define("FOO", "first", "one");
        registry.define("FOO", "second", "two");

        assert_eq!(registry.default_of("FOO"), Some(Value::from("second")));
        assert_eq!(registry.description_of("FOO").as_deref(), Some("two"));
        assert_eq!(registry.sections()[0].1.len(), 2);
    }

    #[test]
    fn alias_chains_collapse_to_canonical() {
        let registry = Registry::new();
        registry.alias("B", "A");
        registry.alias("C", "B");

        assert_eq!(registry.canonical_of("B").as_deref(), Some("A"));
        assert_eq!(registry.canonical_of("C").as_deref(), Some("A"));
        assert_eq!(registry.aliases_of("A"), vec!["B", "C"]);
        assert!(registry.aliases_of("B").is_empty());
    }

    #[test]
    fn aliasing_an_alias_target_moves_its_aliases() {
        let registry = Registry::new();
        registry.alias("B", "A");
        registry.alias("A", "C");

        assert_eq!(registry.canonical_of("A").as_deref(), Some("C"));
        assert_eq!(registry.canonical_of("B").as_deref(), Some("C"));
        assert_eq!(registry.aliases_of("C"), vec!["B", "A"]);
        assert!(registry.aliases_of("A").is_empty());
    }

    #[test]
    fn alias_cycles_are_ignored() {
        let registry = Registry::new();
        registry.alias("B", "A");
        registry.alias("A", "B");
        registry.alias("X", "X");

        assert_eq!(registry.canonical_of("B").as_deref(), Some("A"));
        assert!(registry.canonical_of("A").is_none());
        assert!(registry.canonical_of("X").is_none());
    }

    #[test]
    fn clones_share_state_but_new_registries_do_not() {
        let registry = Registry::new();
        let handle = registry.clone();
        handle.define("FOO", 1i64, "shared");
        handle.allow_environment_variables();

        assert_eq!(registry.default_of("FOO"), Some(Value::Int(1)));
        assert!(registry.env_allowed());
        assert!(Registry::new().default_of("FOO").is_none());
    }
}
