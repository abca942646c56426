//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument
//! types:
//! - import: Import command arguments
//! - lots: Lots report command arguments
//! - gains: Gains report command arguments
//! - dev: Dev workflow arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod dev;
pub mod gains;
pub mod import;
pub mod lots;

pub use completions::CompletionsArgs;
pub use dev::{DevArgs, DevTask};
pub use gains::GainsArgs;
pub use import::ImportArgs;
pub use lots::LotsArgs;

/// capgains - capital gains calculator
///
/// Import securities transaction history and report cost-basis positions and
/// realized gains.
#[derive(Parser, Debug)]
#[command(
    name = "capgains",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Compute realized capital gains and cost basis from transaction history",
    long_about = "capgains keeps a ledger of securities transactions imported from CSV data \
                  files, books them against an inventory of tax lots, and writes position \
                  and realized-gain reports.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  capgains import trades.csv rates.csv  \x1b[90m# Merge data files into the ledger\x1b[0m\n   \
                  capgains lots positions.csv           \x1b[90m# Report open tax lots\x1b[0m\n   \
                  capgains gains 2024.csv -s 2024-01-01 -e 2024-12-31\n   \
                  capgains dev test                     \x1b[90m# Run the test suite with coverage\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Ledger file (defaults to the configured or platform data path)
    #[arg(long, short = 'l', global = true, env = "CAPGAINS_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import transaction/rate CSV files into the ledger
    Import(ImportArgs),

    /// Report open tax lots as CSV
    Lots(LotsArgs),

    /// Report realized gains as CSV
    Gains(GainsArgs),

    /// Run development workflow tasks
    Dev(DevArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_import() {
        let cli = Cli::try_parse_from(["capgains", "import", "trades.csv"]).unwrap();
        match cli.command {
            Commands::Import(args) => {
                assert_eq!(args.files, vec![PathBuf::from("trades.csv")]);
            }
            _ => panic!("Expected Import command"),
        }
    }

    #[test]
    fn test_cli_parsing_import_requires_files() {
        assert!(Cli::try_parse_from(["capgains", "import"]).is_err());
    }

    #[test]
    fn test_cli_parsing_lots_with_range() {
        let cli = Cli::try_parse_from([
            "capgains", "lots", "out.csv", "-s", "2024-01-01", "-e", "2024-12-31", "-c",
        ])
        .unwrap();
        match cli.command {
            Commands::Lots(args) => {
                assert_eq!(args.file, PathBuf::from("out.csv"));
                assert!(args.dtstart.is_some());
                assert!(args.dtend.is_some());
                assert!(args.consolidate);
            }
            _ => panic!("Expected Lots command"),
        }
    }

    #[test]
    fn test_cli_parsing_bad_date() {
        assert!(Cli::try_parse_from(["capgains", "gains", "out.csv", "-s", "01/01/2024"]).is_err());
    }

    #[test]
    fn test_cli_parsing_dev_tasks() {
        for (raw, expected) in [
            ("test", DevTask::Test),
            ("clean", DevTask::Clean),
            ("install", DevTask::Install),
            ("uninstall", DevTask::Uninstall),
            ("lint", DevTask::Lint),
            ("lint-tests", DevTask::LintTests),
        ] {
            let cli = Cli::try_parse_from(["capgains", "dev", raw]).unwrap();
            match cli.command {
                Commands::Dev(args) => assert_eq!(args.task, expected),
                _ => panic!("Expected Dev command"),
            }
        }
    }

    #[test]
    fn test_cli_parsing_dev_dry_run() {
        let cli = Cli::try_parse_from(["capgains", "dev", "--dry-run", "install"]).unwrap();
        match cli.command {
            Commands::Dev(args) => assert!(args.dry_run),
            _ => panic!("Expected Dev command"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli =
            Cli::try_parse_from(["capgains", "-v", "-l", "/tmp/ledger.json", "lots", "out.csv"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.ledger, Some(PathBuf::from("/tmp/ledger.json")));
    }

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["capgains", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::try_parse_from(["capgains", "completions", "bash"]).unwrap();
        match cli.command {
            Commands::Completions(args) => assert_eq!(args.shell, "bash"),
            _ => panic!("Expected Completions command"),
        }
    }
}
