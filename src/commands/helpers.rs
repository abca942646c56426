//! Shared plumbing for the report commands

use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::csvio;
use crate::error::Result;
use crate::inventory::{Gain, Portfolio, Transaction};
use crate::ledger::Ledger;

/// Open the ledger named on the command line, falling back to the configured
/// path
pub fn open_ledger(cli_ledger: Option<PathBuf>, config: &Config) -> Result<Ledger> {
    let path = cli_ledger.unwrap_or_else(|| config.ledger_path());
    Ledger::open(&path)
}

/// Expand a report date range to datetime bounds; the end date is inclusive
pub fn day_bounds(
    dtstart: Option<NaiveDate>,
    dtend: Option<NaiveDate>,
) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    (
        dtstart.and_then(|d| d.and_hms_opt(0, 0, 0)),
        dtend.and_then(|d| d.and_hms_opt(23, 59, 59)),
    )
}

/// Book the ledger's transactions in range against a portfolio, optionally
/// seeded with baseline positions from a lots CSV.
///
/// Returns the portfolio's final state and the realized gains, in booking
/// order.
pub fn process_transactions(
    ledger: &mut Ledger,
    dtstart: Option<NaiveDateTime>,
    dtend: Option<NaiveDateTime>,
    loadcsv: Option<&Path>,
) -> Result<(Portfolio, Vec<Gain>)> {
    let mut portfolio = Portfolio::new();

    if let Some(path) = loadcsv {
        for (fiaccount, security, lot) in csvio::read_lots(ledger, path)? {
            portfolio.push_lot(fiaccount, security, lot);
        }
    }

    let mut gains = Vec::new();
    for record in ledger.transactions_between(dtstart, dtend) {
        let typed = Arc::new(Transaction::from_record(&record)?);
        gains.extend(portfolio.book(&typed, record.sort)?);
    }

    Ok((portfolio, gains))
}
