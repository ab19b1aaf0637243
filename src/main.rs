use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use layerconf::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.run()
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "layerconf=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
