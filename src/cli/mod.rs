mod args;
mod commands;
mod definitions;

pub use args::{Cli, Command, GenerateArgs, VerifyArgs};
pub use commands::{default_search_paths, generate_config, verify_config};
