use std::env;

use super::error::{ConfigError, Result};
use super::value::Value;

/// Raw environment value for `key`, if set. No type coercion is applied.
pub fn env_string(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::EnvVar {
            var: key.to_string(),
            message: "contains invalid UTF-8".to_string(),
        }),
    }
}

/// Environment override for a setting: the variable named exactly like
/// the setting, served as a string.
pub fn env_value(key: &str) -> Result<Option<Value>> {
    Ok(env_string(key)?.map(Value::Str))
}
