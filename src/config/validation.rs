use super::error::{ConfigError, Result};
use super::types::Config;

impl Config {
    /// Fail fast with the first of `names` that has no value anywhere.
    pub fn require_present(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_value(name)) {
            Some(missing) => Err(ConfigError::MissingRequired {
                key: missing.to_string(),
            }),
            None => Ok(()),
        }
    }
}
