use anyhow::{Context, Result, bail};
use colored::Colorize;
use dirs::home_dir;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::config::{Config, Registry};

use super::args::{Cli, Command, GenerateArgs, VerifyArgs};
use super::definitions::load_registry;

pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Verify(args) => run_verify(args),
        Command::Generate(args) => run_generate(args),
    }
}

fn run_verify(args: VerifyArgs) -> Result<()> {
    let registry = load_registry(&args.definitions)?;
    let path = match (args.path, args.name) {
        (Some(path), _) => path,
        (None, Some(name)) => {
            let search = if args.search.is_empty() {
                default_search_paths()
            } else {
                args.search
            };
            match Config::locate(&name, &search) {
                Some(found) => found,
                None => bail!("Could not find {name} in any search path"),
            }
        }
        (None, None) => bail!("You need to specify a path to verify."),
    };

    let stdout = io::stdout();
    let missing = verify_config(&registry, &path, &mut stdout.lock())?;
    tracing::debug!(path = %path.display(), missing, "verification finished");
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let registry = load_registry(&args.definitions)?;

    match args.output {
        Some(output) => {
            let mut file = fs::File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            generate_config(&registry, &mut file)
                .with_context(|| format!("Failed to write template to {}", output.display()))
        }
        None => generate_config(&registry, &mut io::stdout().lock()),
    }
}

/// Current directory, home directory, then `/etc`.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".")];
    if let Some(home) = home_dir() {
        paths.push(home);
    }
    paths.push(PathBuf::from("/etc"));
    paths
}

/// Write one line per registry setting missing from `path`; returns how
/// many were missing.
pub fn verify_config<W: Write>(registry: &Registry, path: &Path, out: &mut W) -> Result<usize> {
    let missing = Config::verify(registry, Some(path))?;

    for (key, default) in &missing {
        writeln!(
            out,
            "Configuration \"{}\" not found in file {}. Using \"{}\" instead.",
            key.blue(),
            path.display(),
            default.to_string().green()
        )?;
    }

    Ok(missing.len())
}

/// Write the annotated template for every setting in `registry`.
pub fn generate_config<W: Write>(registry: &Registry, out: &mut W) -> Result<()> {
    writeln!(out, "{}", registry.render_documentation())?;
    Ok(())
}
