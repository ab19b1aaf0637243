use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::builder::ConfigBuilder;
use super::constants::CONF_SUFFIX;
use super::error::{ConfigError, Result};
use super::parser::parse_settings;
use super::registry::Registry;
use super::types::Config;
use super::value::Value;

impl Config {
    pub fn builder(registry: &Registry) -> ConfigBuilder {
        ConfigBuilder::new(registry)
    }

    /// First `search_paths[i]/file_name` that exists as a file. Not
    /// finding one is not an error.
    pub fn locate<P: AsRef<Path>>(file_name: &str, search_paths: &[P]) -> Option<PathBuf> {
        search_paths
            .iter()
            .map(|dir| dir.as_ref().join(file_name))
            .find(|candidate| candidate.is_file())
            .map(|found| fs::canonicalize(&found).unwrap_or(found))
    }

    /// Load a single file or merge a directory of `.conf` files.
    pub fn load(registry: &Registry, path: impl AsRef<Path>) -> Result<Self> {
        Config::builder(registry).with_path(path).build()
    }

    /// Like [`Config::load`] with instance defaults. `None` yields a
    /// configuration built purely from `defaults`.
    pub fn load_with_defaults(
        registry: &Registry,
        path: Option<&Path>,
        defaults: BTreeMap<String, Value>,
    ) -> Result<Self> {
        let builder = Config::builder(registry).with_defaults(defaults);
        match path {
            Some(path) => builder.with_path(path).build(),
            None => builder.build(),
        }
    }

    /// Re-read the recorded source, applying its values over the current
    /// explicit ones. No-op for configurations that were not loaded.
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = self.source.clone() else {
            return Ok(());
        };
        debug!(path = %path.display(), "reloading configuration");
        self.load_from(&path)
    }

    /// Registry keys the source at `path` does not set, with the default
    /// that will be used instead. Aliases in the file count for their
    /// canonical key.
    pub fn verify(registry: &Registry, path: Option<&Path>) -> Result<Vec<(String, Value)>> {
        let Some(path) = path else {
            return Ok(Vec::new());
        };
        ensure_exists(path)?;

        let mut present = HashSet::new();
        for (name, _) in read_settings(path)? {
            let key = registry.redirect(&name).unwrap_or(name);
            present.insert(key);
        }

        Ok(registry
            .defaults()
            .into_iter()
            .filter(|(key, _)| !present.contains(key))
            .collect())
    }

    pub(super) fn load_from(&mut self, path: &Path) -> Result<()> {
        ensure_exists(path)?;
        for (name, value) in read_settings(path)? {
            self.set_value(name, value);
        }
        self.source = Some(path.to_path_buf());
        Ok(())
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Settings of a file, or of every `.conf` file in a directory in sorted
/// file name order (later files override earlier ones).
fn read_settings(path: &Path) -> Result<Vec<(String, Value)>> {
    if !path.is_dir() {
        return read_file(path);
    }

    let mut names = fs::read_dir(path)
        .map_err(|e| ConfigError::io(path, e))?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| ConfigError::io(path, e))?;
    names.sort();

    let mut settings = Vec::new();
    for name in names {
        if !name.to_string_lossy().ends_with(CONF_SUFFIX) {
            continue;
        }
        settings.extend(read_settings(&path.join(&name))?);
    }

    debug!(path = %path.display(), count = settings.len(), "merged configuration directory");
    Ok(settings)
}

fn read_file(path: &Path) -> Result<Vec<(String, Value)>> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let settings = parse_settings(&contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        line: err.line,
        message: err.message,
    })?;

    debug!(path = %path.display(), count = settings.len(), "loaded configuration file");
    Ok(settings)
}
