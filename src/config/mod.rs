//! Layered configuration loading.
//!
//! This module provides:
//! - A shared [`Registry`] of defaults, descriptions, groups and aliases
//! - [`Config`] instances resolved lazily against it
//! - Loading from a file, a directory of `.conf` files or a search path
//! - Optional environment variable overrides
//! - Generated, commented template documentation

mod builder;
mod constants;
mod docs;
mod environment;
mod error;
mod loader;
mod parser;
mod registry;
mod resolve;
mod types;
mod validation;
mod value;

pub use builder::ConfigBuilder;
pub use constants::{CONF_SUFFIX, DEFAULT_GROUP};
pub use error::{ConfigError, Result};
pub use parser::{ParseError, is_setting_name, parse_settings};
pub use registry::{Entry, Registry};
pub use types::Config;
pub use value::Value;

#[cfg(test)]
mod tests;
