//! capgains - capital gains calculator
//!
//! A command line tool that keeps a ledger of securities transactions,
//! books them against an inventory of tax lots, and reports cost-basis
//! positions and realized capital gains.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod csvio;
mod error;
mod inventory;
mod ledger;
mod models;
mod report;
mod utils;
mod workflow;

use cli::{Cli, Commands};

fn init_tracing(verbose: bool) {
    // RUST_LOG wins; --verbose lowers the default floor to debug
    let fallback = if verbose { "capgains=debug" } else { "capgains=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Import(args) => commands::import::run(cli.ledger, args),
        Commands::Lots(args) => commands::lots::run(cli.ledger, args),
        Commands::Gains(args) => commands::gains::run(cli.ledger, args),
        Commands::Dev(args) => commands::dev::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
