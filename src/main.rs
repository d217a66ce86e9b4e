use std::fs;
use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use earl_rollup::{CliArgs, EarlRollup, HttpFetcher, RollupConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = RollupConfig::from_args(CliArgs::parse())?;
    let fetcher = HttpFetcher::new()?;

    let rollup = EarlRollup::run(&config, &fetcher)?;
    let output = rollup.generate(config.format, config.template.as_deref())?;

    match &config.output {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("cannot write output to {}", path.display()))?,
        None => std::io::stdout().write_all(output.as_bytes())?,
    }
    Ok(())
}
