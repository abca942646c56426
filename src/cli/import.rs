use clap::Parser;
use std::path::PathBuf;

/// Arguments for import command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Import broker transaction data:\n    capgains import trades.csv\n\n\
                  Import several files at once:\n    capgains import 2023.csv 2024.csv rates.csv")]
pub struct ImportArgs {
    /// Transaction or currency-rate CSV file(s)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}
