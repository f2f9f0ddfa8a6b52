//! Packlet CLI - bundle a JavaScript module graph into a single file.

use std::{env, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use packlet::{config::Config, orchestrator};

#[derive(Parser, Debug)]
#[command(name = "packlet")]
#[command(author, version, about = "Bundle a JavaScript module graph into a single file")]
struct Cli {
    /// Path to the configuration file (defaults to packlet.toml in the
    /// current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Entry module (overrides the configuration file)
    #[arg(short, long)]
    entry: Option<PathBuf>,

    /// Output file (overrides the configuration file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let invocation_dir =
        env::current_dir().context("failed to determine the current directory")?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(&invocation_dir)?,
    };
    let bundle_config = config.into_bundle_config(cli.entry, cli.output)?;

    orchestrator::run(&bundle_config, &invocation_dir)?;
    Ok(())
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}
