use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::Result;
use super::registry::Registry;
use super::types::Config;
use super::value::Value;

/// Collects the inputs of a load and runs it.
///
/// ```no_run
/// use layerconf::config::{Config, Registry};
///
/// let registry = Registry::new();
/// let config = Config::builder(&registry)
///     .with_file_name("app.conf")
///     .with_search_paths(["/etc/app", "."])
///     .with_default("WORKERS", 4i64)
///     .build()?;
/// # Ok::<(), layerconf::config::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct ConfigBuilder {
    registry: Registry,
    path: Option<PathBuf>,
    file_name: Option<String>,
    search_paths: Vec<PathBuf>,
    defaults: BTreeMap<String, Value>,
    items: Vec<(String, Value)>,
}

impl ConfigBuilder {
    pub fn new(registry: &Registry) -> Self {
        Self {
            registry: registry.clone(),
            path: None,
            file_name: None,
            search_paths: Vec::new(),
            defaults: BTreeMap::new(),
            items: Vec::new(),
        }
    }

    /// File or directory to load. Takes precedence over the search path.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.search_paths
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    pub fn with_defaults(mut self, defaults: BTreeMap<String, Value>) -> Self {
        self.defaults.extend(defaults);
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Explicit value applied before the file; the file wins on conflicts.
    pub fn with_item(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.items.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<Config> {
        let Self {
            registry,
            path,
            file_name,
            search_paths,
            defaults,
            items,
        } = self;

        let path = match (path, file_name) {
            (Some(path), _) => Some(path),
            (None, Some(name)) if !search_paths.is_empty() => Config::locate(&name, &search_paths),
            _ => None,
        };

        let mut config = Config::new(&registry, items, defaults);
        if let Some(path) = path {
            config.load_from(&path)?;
        }
        Ok(config)
    }
}
