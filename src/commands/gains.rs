//! Gains report command implementation

use std::path::PathBuf;

use crate::cli::GainsArgs;
use crate::config::Config;
use crate::csvio;
use crate::error::Result;
use crate::report;

use super::helpers;

/// Run gains command
pub fn run(ledger_path: Option<PathBuf>, args: GainsArgs) -> Result<()> {
    let config = Config::load()?;
    let mut ledger = helpers::open_ledger(ledger_path, &config)?;

    let (dtstart, dtend) = helpers::day_bounds(args.dtstart, args.dtend);
    let (_portfolio, gains) =
        helpers::process_transactions(&mut ledger, dtstart, dtend, args.loadcsv.as_deref())?;

    let rows = report::flatten_gains(
        &ledger,
        &gains,
        config.functional_currency,
        args.consolidate,
    )?;
    csvio::write_gains(&args.file, &rows)?;

    println!("Wrote {} gain row(s) to {}", rows.len(), args.file.display());
    Ok(())
}
