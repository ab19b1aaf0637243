use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use super::commands;

/// Entry point for the `layerconf` command-line tool.
#[derive(Debug, Parser)]
#[command(
    name = "layerconf",
    about = "Verify configuration files and generate annotated templates",
    version,
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging of loads and merges
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report settings a configuration file does not set.
    Verify(VerifyArgs),
    /// Print a commented template with every known setting.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Configuration file or directory to check.
    pub path: Option<PathBuf>,

    /// File name to look up in the search paths when no path is given.
    #[arg(long)]
    pub name: Option<String>,

    /// Directory to search for --name (repeatable; defaults to ., ~ and /etc).
    #[arg(long = "search")]
    pub search: Vec<PathBuf>,

    /// JSON file declaring the known settings.
    #[arg(short = 'd', long)]
    pub definitions: PathBuf,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// JSON file declaring the known settings.
    #[arg(short = 'd', long)]
    pub definitions: PathBuf,

    /// Write the template here instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        commands::run(self)
    }
}
