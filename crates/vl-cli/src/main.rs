//! viewlineage CLI - column-level lineage for SQL view definitions

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;

use cli::Cli;
use commands::common::ExitCode;
use commands::{analyze, inspect};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(err) = run(&cli).await {
        if let Some(code) = err.downcast_ref::<ExitCode>() {
            std::process::exit(code.0);
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Analyze(args) => analyze::execute(args, &cli.global).await,
        cli::Commands::Inspect(args) => inspect::execute(args, &cli.global).await,
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug and the default is warn
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
