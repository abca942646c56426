//! CSV serialization: transaction/rate imports, lot and gain reports
//!
//! Import dispatch mirrors the reader-chain approach: a file's header row
//! decides whether it holds transactions or currency rates; anything else is
//! rejected as an unrecognized format.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, imports};
use crate::inventory::{Lot, LotSort, Opening, Transaction as InventoryTransaction};
use crate::ledger::Ledger;
use crate::models::{Currency, Transaction, TransactionKind};
use crate::report::{FlatGain, FlatLot};
use crate::utils::round_decimal;

/// Counts of what an import merged
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Transactions newly inserted
    pub transactions: usize,
    /// Transactions already present (deduplicated by account + uniqueid)
    pub skipped: usize,
    /// Currency rates merged
    pub rates: usize,
}

/// Import a CSV data file into the ledger, dispatching on its header row
pub fn import_file(ledger: &mut Ledger, path: &Path) -> Result<ImportStats> {
    let mut reader = open_reader(path)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| imports::read_failed(path, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let has = |name: &str| headers.iter().any(|h| h == name);
    if ["kind", "uniqueid", "datetime", "brokerid", "acctid"]
        .iter()
        .all(|h| has(h))
    {
        import_transactions(ledger, reader, path)
    } else if ["date", "fromcurrency", "tocurrency", "rate"]
        .iter()
        .all(|h| has(h))
    {
        import_rates(ledger, reader, path)
    } else {
        Err(imports::unsupported_format(path))
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| imports::read_failed(path, e.to_string()))
}

#[derive(Debug, Deserialize)]
struct TransactionRow {
    kind: String,
    uniqueid: String,
    datetime: String,
    #[serde(default)]
    dtsettle: Option<String>,
    brokerid: String,
    acctid: String,
    uniqueidtype: String,
    secid: String,
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    secname: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    cash: Option<String>,
    #[serde(default)]
    units: Option<String>,
    #[serde(default)]
    securityprice: Option<String>,
    #[serde(default)]
    fromacctid: Option<String>,
    #[serde(default)]
    fromuniqueidtype: Option<String>,
    #[serde(default)]
    fromsecid: Option<String>,
    #[serde(default)]
    fromunits: Option<String>,
    #[serde(default)]
    fromsecurityprice: Option<String>,
    #[serde(default)]
    numerator: Option<String>,
    #[serde(default)]
    denominator: Option<String>,
    #[serde(default)]
    sort: Option<String>,
    #[serde(default)]
    memo: Option<String>,
}

fn import_transactions(
    ledger: &mut Ledger,
    mut reader: csv::Reader<std::fs::File>,
    path: &Path,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    for (index, row) in reader.deserialize::<TransactionRow>().enumerate() {
        // Header occupies line 1
        let line = (index + 2) as u64;
        let row = row.map_err(|e| imports::read_failed(path, e.to_string()))?;
        let record = row_to_record(ledger, row, path, line)?;
        let (_, inserted) = ledger.merge_transaction(record)?;
        if inserted {
            stats.transactions += 1;
        } else {
            stats.skipped += 1;
        }
    }
    info!(
        path = %path.display(),
        inserted = stats.transactions,
        skipped = stats.skipped,
        "imported transactions"
    );
    Ok(stats)
}

fn row_to_record(
    ledger: &mut Ledger,
    row: TransactionRow,
    path: &Path,
    line: u64,
) -> Result<Transaction> {
    let kind: TransactionKind = row
        .kind
        .parse()
        .map_err(|e: String| imports::field_invalid(path, line, "kind", e))?;
    let datetime = parse_datetime(&row.datetime)
        .map_err(|e| imports::field_invalid(path, line, "datetime", e))?;
    let dtsettle = match nonempty(row.dtsettle) {
        Some(raw) => Some(
            parse_datetime(&raw).map_err(|e| imports::field_invalid(path, line, "dtsettle", e))?,
        ),
        None => None,
    };

    let fiaccount = ledger.merge_account(&row.brokerid, &row.acctid, None);
    let security = ledger.merge_security(
        &row.uniqueidtype,
        &row.secid,
        nonempty(row.ticker).as_deref(),
        nonempty(row.secname).as_deref(),
    );

    let fromfiaccount = nonempty(row.fromacctid)
        .map(|acctid| ledger.merge_account(&row.brokerid, &acctid, None));
    let fromsecurity = match (nonempty(row.fromuniqueidtype), nonempty(row.fromsecid)) {
        (Some(idtype), Some(id)) => Some(ledger.merge_security(&idtype, &id, None, None)),
        _ => None,
    };

    let currency = match nonempty(row.currency) {
        Some(raw) => Some(
            Currency::from_str(&raw).map_err(|e| imports::field_invalid(path, line, "currency", e))?,
        ),
        None => None,
    };
    let sort = match nonempty(row.sort) {
        Some(raw) => Some(
            LotSort::from_str(&raw).map_err(|e| imports::field_invalid(path, line, "sort", e))?,
        ),
        None => None,
    };

    Ok(Transaction {
        id: 0,
        uniqueid: row.uniqueid,
        datetime,
        dtsettle,
        kind,
        memo: nonempty(row.memo),
        currency,
        cash: parse_decimal_opt(row.cash, path, line, "cash")?,
        fiaccount,
        security,
        units: parse_decimal_opt(row.units, path, line, "units")?,
        securityprice: parse_decimal_opt(row.securityprice, path, line, "securityprice")?,
        fromfiaccount,
        fromsecurity,
        fromunits: parse_decimal_opt(row.fromunits, path, line, "fromunits")?,
        fromsecurityprice: parse_decimal_opt(row.fromsecurityprice, path, line, "fromsecurityprice")?,
        numerator: parse_decimal_opt(row.numerator, path, line, "numerator")?,
        denominator: parse_decimal_opt(row.denominator, path, line, "denominator")?,
        sort,
    })
}

#[derive(Debug, Deserialize)]
struct RateRow {
    date: String,
    fromcurrency: String,
    tocurrency: String,
    rate: String,
}

fn import_rates(
    ledger: &mut Ledger,
    mut reader: csv::Reader<std::fs::File>,
    path: &Path,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    for (index, row) in reader.deserialize::<RateRow>().enumerate() {
        let line = (index + 2) as u64;
        let row = row.map_err(|e| imports::read_failed(path, e.to_string()))?;
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| imports::field_invalid(path, line, "date", e.to_string()))?;
        let fromcurrency = Currency::from_str(&row.fromcurrency)
            .map_err(|e| imports::field_invalid(path, line, "fromcurrency", e))?;
        let tocurrency = Currency::from_str(&row.tocurrency)
            .map_err(|e| imports::field_invalid(path, line, "tocurrency", e))?;
        let rate = Decimal::from_str(&row.rate)
            .map_err(|e| imports::field_invalid(path, line, "rate", e.to_string()))?;
        ledger.merge_rate(date, fromcurrency, tocurrency, rate);
        stats.rates += 1;
    }
    info!(path = %path.display(), rates = stats.rates, "imported currency rates");
    Ok(stats)
}

#[derive(Debug, Deserialize)]
struct LotRow {
    brokerid: String,
    acctid: String,
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    secname: Option<String>,
    opendt: String,
    opentxid: String,
    units: String,
    cost: String,
    currency: String,
    #[serde(default, rename = "CUSIP")]
    cusip: Option<String>,
    #[serde(default, rename = "ISIN")]
    isin: Option<String>,
    #[serde(default, rename = "CONID")]
    conid: Option<String>,
    #[serde(default, rename = "TICKER")]
    ticker_id: Option<String>,
}

/// Read baseline positions from a lots CSV previously written by
/// [`write_lots`].
///
/// Each row merges its account/security into the ledger and yields a Lot
/// whose opening transaction is a placeholder carrying the row's
/// opendt/opentxid.
pub fn read_lots(ledger: &mut Ledger, path: &Path) -> Result<Vec<(i64, i64, Lot)>> {
    let mut reader = open_reader(path)?;
    let mut lots = Vec::new();
    for (index, row) in reader.deserialize::<LotRow>().enumerate() {
        let line = (index + 2) as u64;
        let row = row.map_err(|e| imports::read_failed(path, e.to_string()))?;

        let fiaccount = ledger.merge_account(&row.brokerid, &row.acctid, None);

        let ticker = nonempty(row.ticker);
        let secname = nonempty(row.secname);
        let alt_ids = [
            ("CUSIP", nonempty(row.cusip)),
            ("ISIN", nonempty(row.isin)),
            ("CONID", nonempty(row.conid)),
            ("TICKER", nonempty(row.ticker_id)),
        ];
        let mut security = None;
        for (uniqueidtype, uniqueid) in alt_ids {
            if let Some(uniqueid) = uniqueid {
                security = Some(ledger.merge_security(
                    uniqueidtype,
                    &uniqueid,
                    ticker.as_deref(),
                    secname.as_deref(),
                ));
            }
        }
        let security = security.ok_or_else(|| {
            imports::field_invalid(path, line, "CUSIP", "row carries no security identifier")
        })?;

        let opendt = parse_datetime(&row.opendt)
            .map_err(|e| imports::field_invalid(path, line, "opendt", e))?;
        let units = Decimal::from_str(&row.units)
            .map_err(|e| imports::field_invalid(path, line, "units", e.to_string()))?;
        if units == Decimal::ZERO {
            return Err(imports::field_invalid(path, line, "units", "must be nonzero"));
        }
        let cost = Decimal::from_str(&row.cost)
            .map_err(|e| imports::field_invalid(path, line, "cost", e.to_string()))?;
        let currency = Currency::from_str(&row.currency)
            .map_err(|e| imports::field_invalid(path, line, "currency", e))?;

        let opentransaction = Arc::new(InventoryTransaction::Opening(Opening {
            uniqueid: row.opentxid,
            datetime: opendt,
        }));
        lots.push((
            fiaccount,
            security,
            Lot {
                opentransaction: Arc::clone(&opentransaction),
                createtransaction: opentransaction,
                units,
                price: cost / units,
                currency,
            },
        ));
    }
    Ok(lots)
}

/// Write a lots report.
///
/// Consolidated reports drop the per-lot opendt/opentxid columns.
pub fn write_lots(path: &Path, rows: &[FlatLot], consolidate: bool) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| imports::write_failed(path, e.to_string()))?;

    let mut headers = vec!["brokerid", "acctid", "ticker", "secname"];
    if !consolidate {
        headers.extend(["opendt", "opentxid"]);
    }
    headers.extend(["units", "cost", "currency", "CUSIP", "ISIN", "CONID", "TICKER"]);
    writer
        .write_record(&headers)
        .map_err(|e| imports::write_failed(path, e.to_string()))?;

    for row in rows {
        let mut record = vec![
            row.brokerid.clone(),
            row.acctid.clone(),
            row.ticker.clone(),
            row.secname.clone(),
        ];
        if !consolidate {
            record.push(row.opendt.map(format_datetime).unwrap_or_default());
            record.push(row.opentxid.clone().unwrap_or_default());
        }
        record.extend([
            round_decimal(row.units, 4).to_string(),
            round_decimal(row.cost, 2).to_string(),
            row.currency.to_string(),
            row.cusip.clone().unwrap_or_default(),
            row.isin.clone().unwrap_or_default(),
            row.conid.clone().unwrap_or_default(),
            row.ticker_id.clone().unwrap_or_default(),
        ]);
        writer
            .write_record(&record)
            .map_err(|e| imports::write_failed(path, e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| imports::write_failed(path, e.to_string()))
}

/// Write a gains report
pub fn write_gains(path: &Path, rows: &[FlatGain]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| imports::write_failed(path, e.to_string()))?;

    writer
        .write_record([
            "brokerid", "acctid", "ticker", "secname", "opendt", "opentxid", "gaindt", "gaintxid",
            "units", "proceeds", "cost", "currency", "longterm", "disallowed",
        ])
        .map_err(|e| imports::write_failed(path, e.to_string()))?;

    for row in rows {
        writer
            .write_record([
                row.brokerid.clone().unwrap_or_default(),
                row.acctid.clone().unwrap_or_default(),
                row.ticker.clone(),
                row.secname.clone(),
                row.opendt.map(format_datetime).unwrap_or_default(),
                row.opentxid.clone().unwrap_or_default(),
                row.gaindt.map(format_datetime).unwrap_or_default(),
                row.gaintxid.clone().unwrap_or_default(),
                row.units.to_string(),
                row.proceeds.to_string(),
                row.cost.to_string(),
                row.currency.to_string(),
                row.longterm.map(|b| b.to_string()).unwrap_or_default(),
                row.disallowed.map(|b| b.to_string()).unwrap_or_default(),
            ])
            .map_err(|e| imports::write_failed(path, e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| imports::write_failed(path, e.to_string()))
}

fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parse a datetime, accepting a bare date as midnight
fn parse_datetime(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(format!("cannot parse datetime '{raw}'"))
}

fn nonempty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn parse_decimal_opt(
    value: Option<String>,
    path: &Path,
    line: u64,
    column: &str,
) -> Result<Option<Decimal>> {
    match nonempty(value) {
        Some(raw) => Decimal::from_str(&raw)
            .map(Some)
            .map_err(|e| imports::field_invalid(path, line, column, e.to_string())),
        None => Ok(None),
    }
}
