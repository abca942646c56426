//! Lots report command implementation

use std::path::PathBuf;

use crate::cli::LotsArgs;
use crate::config::Config;
use crate::csvio;
use crate::error::Result;
use crate::report;

use super::helpers;

/// Run lots command
pub fn run(ledger_path: Option<PathBuf>, args: LotsArgs) -> Result<()> {
    let config = Config::load()?;
    let mut ledger = helpers::open_ledger(ledger_path, &config)?;

    let (dtstart, dtend) = helpers::day_bounds(args.dtstart, args.dtend);
    let (portfolio, _gains) =
        helpers::process_transactions(&mut ledger, dtstart, dtend, args.loadcsv.as_deref())?;

    let rows = report::flatten_portfolio(&ledger, &portfolio, args.consolidate)?;
    csvio::write_lots(&args.file, &rows, args.consolidate)?;

    println!("Wrote {} lot row(s) to {}", rows.len(), args.file.display());
    Ok(())
}
