use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Arguments for gains command
#[derive(Parser, Debug)]
pub struct GainsArgs {
    /// Output CSV file
    pub file: PathBuf,

    /// Start date for transactions processed for the report (YYYY-MM-DD)
    #[arg(long, short = 's')]
    pub dtstart: Option<NaiveDate>,

    /// End date (inclusive) for transactions processed for the report
    #[arg(long, short = 'e')]
    pub dtend: Option<NaiveDate>,

    /// Lots CSV file to load as baseline positions
    #[arg(long, short = 'L', value_name = "FILE")]
    pub loadcsv: Option<PathBuf>,

    /// Sum gains per security into a single row
    #[arg(long, short = 'c')]
    pub consolidate: bool,
}
