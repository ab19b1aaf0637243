//! Key/value configuration with class-wide defaults, deprecation aliases,
//! environment overrides and generated templates.

pub mod cli;
pub mod config;

pub use config::{Config, ConfigError, Registry, Value};
