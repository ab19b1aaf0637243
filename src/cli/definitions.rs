use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::config::{DEFAULT_GROUP, Registry, Value};

/// One entry of a definitions file.
#[derive(Debug, Deserialize)]
pub(crate) struct Definition {
    pub key: String,
    #[serde(default)]
    pub default: serde_json::Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

pub(crate) fn load_registry(path: &Path) -> Result<Registry> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed reading definitions at {}", path.display()))?;
    parse_registry(&contents)
        .with_context(|| format!("Failed parsing definitions at {}", path.display()))
}

pub(crate) fn parse_registry(contents: &str) -> Result<Registry> {
    let definitions: Vec<Definition> = serde_json::from_str(contents)?;
    let registry = Registry::new();

    for definition in definitions {
        let default = json_to_value(definition.default)
            .with_context(|| format!("Invalid default for {}", definition.key))?;
        let group = definition.group.as_deref().unwrap_or(DEFAULT_GROUP);
        registry.define_in(&definition.key, default, definition.description, group);
        for alias in definition.aliases {
            registry.alias(alias, &definition.key);
        }
    }

    Ok(registry)
}

fn json_to_value(value: serde_json::Value) -> Result<Value> {
    Ok(match value {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(
                n.as_f64()
                    .ok_or_else(|| anyhow!("number {n} is out of range"))?,
            ),
        },
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => Value::List(
            items
                .into_iter()
                .map(json_to_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        serde_json::Value::Object(_) => {
            return Err(anyhow!("nested objects are not supported as defaults"));
        }
    })
}
