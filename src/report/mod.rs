//! Flattening inventory Lots and Gains for serialization
//!
//! Each Lot or Gain (nested, with references to opening/realizing
//! transactions) is "flattened" into an un-nested row ([`FlatLot`],
//! [`FlatGain`]) holding everything needed to report it: account and
//! security columns resolved through the ledger, money amounts, holding
//! period character.  The CSV writers in [`crate::csvio`] handle the actual
//! serialization of these rows.
//!
//! Gains denominated in a currency other than the functional currency are
//! translated at the spot rate on the settlement date, per
//! 26 CFR 1.988-2(a)(2)(iv): amount realized and basis for securities traded
//! in nonfunctional currency are both computed at the settlement-date spot
//! rate.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{CapgainsError, Result};
use crate::inventory::{Gain, Lot, Portfolio, Transaction};
use crate::ledger::Ledger;
use crate::models::Currency;
use crate::utils::round_decimal;

/// Un-nested row for a position Lot
#[derive(Clone, Debug, PartialEq)]
pub struct FlatLot {
    pub brokerid: String,
    pub acctid: String,
    pub ticker: String,
    pub secname: String,
    /// None for consolidated rows
    pub opendt: Option<NaiveDateTime>,
    pub opentxid: Option<String>,
    pub units: Decimal,
    /// Total cost basis (units * price)
    pub cost: Decimal,
    pub currency: Currency,
    pub cusip: Option<String>,
    pub isin: Option<String>,
    pub conid: Option<String>,
    pub ticker_id: Option<String>,
}

/// Un-nested row for a realized Gain.
///
/// `proceeds` is technically cost (not proceeds) for short positions, and
/// vice versa for `cost`.  `disallowed` is reserved for wash sale treatment
/// and is never populated.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatGain {
    /// None for consolidated rows
    pub brokerid: Option<String>,
    pub acctid: Option<String>,
    pub ticker: String,
    pub secname: String,
    pub opendt: Option<NaiveDateTime>,
    pub opentxid: Option<String>,
    pub gaindt: Option<NaiveDateTime>,
    pub gaintxid: Option<String>,
    pub units: Decimal,
    pub proceeds: Decimal,
    pub cost: Decimal,
    pub currency: Currency,
    pub longterm: Option<bool>,
    pub disallowed: Option<bool>,
}

/// Long-term capital gain treatment: held for at least 366 days.
///
/// Short sales never get long-term treatment.
pub fn long_term(units: Decimal, opendt: NaiveDateTime, gaindt: NaiveDateTime) -> bool {
    units > Decimal::ZERO && gaindt - opendt >= Duration::days(366)
}

/// Convert a Portfolio into FlatLot rows.
///
/// Lots fully closed out (zero units) are omitted.  With `consolidate`, all
/// lots of each (account, security) position sum into a single row without
/// per-lot dates/ids.
pub fn flatten_portfolio(
    ledger: &Ledger,
    portfolio: &Portfolio,
    consolidate: bool,
) -> Result<Vec<FlatLot>> {
    let mut rows = Vec::new();
    for (&(fiaccount, security), position) in portfolio.positions() {
        if position.is_empty() {
            continue;
        }
        if consolidate {
            rows.extend(consolidate_lots(ledger, fiaccount, security, position)?);
        } else {
            for lot in position {
                if lot.units == Decimal::ZERO {
                    continue;
                }
                rows.push(flatten_lot(ledger, fiaccount, security, lot)?);
            }
        }
    }
    Ok(rows)
}

/// Condense a position into a single-row FlatLot sequence.
///
/// This is a lossy transform; per-lot open dates and ids are dropped.
pub fn consolidate_lots(
    ledger: &Ledger,
    fiaccount: i64,
    security: i64,
    position: &[Lot],
) -> Result<Vec<FlatLot>> {
    let currencies: Vec<Currency> = position.iter().map(|lot| lot.currency).collect();
    if !crate::utils::all_equal(&currencies) {
        return Err(CapgainsError::ReportInvalid {
            message: format!("position in security {security} mixes currencies"),
        });
    }

    let units: Decimal = position.iter().map(|lot| lot.units).sum();
    let cost: Decimal = position.iter().map(|lot| lot.units * lot.price).sum();
    if units == Decimal::ZERO {
        return Ok(Vec::new());
    }

    let mut flatlot = account_security_row(ledger, fiaccount, security)?;
    flatlot.units = units;
    flatlot.cost = cost;
    flatlot.currency = currencies[0];
    Ok(vec![flatlot])
}

/// Convert one Lot into a FlatLot row
pub fn flatten_lot(ledger: &Ledger, fiaccount: i64, security: i64, lot: &Lot) -> Result<FlatLot> {
    let mut flatlot = account_security_row(ledger, fiaccount, security)?;
    flatlot.opendt = Some(lot.opentransaction.datetime());
    flatlot.opentxid = Some(lot.opentransaction.uniqueid().to_string());
    flatlot.units = lot.units;
    flatlot.cost = lot.units * lot.price;
    flatlot.currency = lot.currency;
    Ok(flatlot)
}

fn account_security_row(ledger: &Ledger, fiaccount: i64, security: i64) -> Result<FlatLot> {
    let account = ledger.account(fiaccount)?;
    let fi = ledger.fi(account.fi)?;
    let sec = ledger.security(security)?;
    Ok(FlatLot {
        brokerid: fi.brokerid.clone(),
        acctid: account.number.clone(),
        ticker: sec.ticker.clone().unwrap_or_default(),
        secname: sec.name.clone().unwrap_or_default(),
        opendt: None,
        opentxid: None,
        units: Decimal::ZERO,
        cost: Decimal::ZERO,
        currency: Currency::USD,
        cusip: ledger.alt_id(security, "CUSIP")?.map(str::to_string),
        isin: ledger.alt_id(security, "ISIN")?.map(str::to_string),
        conid: ledger.alt_id(security, "CONID")?.map(str::to_string),
        ticker_id: ledger.alt_id(security, "TICKER")?.map(str::to_string),
    })
}

/// Convert a sequence of Gains into FlatGain rows.
///
/// With `consolidate`, gains sum per security; a consolidated row for more
/// than one gain drops account, date and id columns.
pub fn flatten_gains(
    ledger: &Ledger,
    gains: &[Gain],
    functional_currency: Currency,
    consolidate: bool,
) -> Result<Vec<FlatGain>> {
    if !consolidate {
        return gains
            .iter()
            .map(|gain| flatten_gain(ledger, gain, functional_currency))
            .collect();
    }

    // Group by the realizing transaction's security, preserving security
    // order
    let mut groups: BTreeMap<i64, Vec<FlatGain>> = BTreeMap::new();
    for gain in gains {
        let security = gain
            .transaction
            .security()
            .ok_or_else(|| CapgainsError::ReportInvalid {
                message: format!(
                    "realizing transaction '{}' has no security",
                    gain.transaction.uniqueid()
                ),
            })?;
        groups
            .entry(security)
            .or_default()
            .push(flatten_gain(ledger, gain, functional_currency)?);
    }

    let mut rows = Vec::new();
    for (_security, flats) in groups {
        let mut total: Option<FlatGain> = None;
        for flat in flats {
            total = Some(match total {
                None => flat,
                Some(acc) => accumulate_gains(acc, flat)?,
            });
        }
        if let Some(total) = total {
            rows.push(total);
        }
    }
    Ok(rows)
}

fn accumulate_gains(a: FlatGain, b: FlatGain) -> Result<FlatGain> {
    if a.ticker != b.ticker || a.secname != b.secname || a.currency != b.currency {
        return Err(CapgainsError::ReportInvalid {
            message: format!("gains for '{}' and '{}' don't consolidate", a.ticker, b.ticker),
        });
    }
    Ok(FlatGain {
        brokerid: None,
        acctid: None,
        ticker: a.ticker,
        secname: a.secname,
        opendt: None,
        opentxid: None,
        gaindt: None,
        gaintxid: None,
        units: a.units + b.units,
        proceeds: a.proceeds + b.proceeds,
        cost: a.cost + b.cost,
        currency: a.currency,
        longterm: None,
        disallowed: None,
    })
}

/// Construct a FlatGain from a Gain, translating currency as needed
pub fn flatten_gain(ledger: &Ledger, gain: &Gain, functional_currency: Currency) -> Result<FlatGain> {
    let gain = translate_gain(ledger, gain, functional_currency)?;
    let gaintx = &gain.transaction;
    let lot = &gain.lot;
    let units = lot.units;

    let fiaccount = gaintx
        .fiaccount()
        .ok_or_else(|| CapgainsError::ReportInvalid {
            message: format!("realizing transaction '{}' has no account", gaintx.uniqueid()),
        })?;
    let security = gaintx
        .security()
        .ok_or_else(|| CapgainsError::ReportInvalid {
            message: format!("realizing transaction '{}' has no security", gaintx.uniqueid()),
        })?;
    let account = ledger.account(fiaccount)?;
    let fi = ledger.fi(account.fi)?;
    let sec = ledger.security(security)?;

    let opentx = &lot.opentransaction;
    let gaindt = gaintx.datetime();
    let opendt = opentx.datetime();

    Ok(FlatGain {
        brokerid: Some(fi.brokerid.clone()),
        acctid: Some(account.number.clone()),
        ticker: sec.ticker.clone().unwrap_or_default(),
        secname: sec.name.clone().unwrap_or_default(),
        opendt: Some(opendt),
        opentxid: Some(opentx.uniqueid().to_string()),
        gaindt: Some(gaindt),
        gaintxid: Some(gaintx.uniqueid().to_string()),
        units: round_decimal(units, 2),
        proceeds: round_decimal(units * gain.price, 2),
        cost: round_decimal(units * lot.price, 2),
        currency: lot.currency,
        longterm: Some(long_term(units, opendt, gaindt)),
        disallowed: None,
    })
}

/// Translate a Gain's lot and realizing transaction to the functional
/// currency at settlement-date spot rates
pub fn translate_gain(ledger: &Ledger, gain: &Gain, functional_currency: Currency) -> Result<Gain> {
    let mut lot = gain.lot.clone();
    let mut gaintx = Arc::clone(&gain.transaction);
    let mut gainprice = gain.price;

    if lot.currency != functional_currency {
        let opentx = &lot.opentransaction;
        let dtsettle = opentx.dtsettle().unwrap_or_else(|| opentx.datetime());
        let rate = ledger.get_rate(lot.currency, functional_currency, dtsettle.date())?;
        let translated = Arc::new(translate_transaction(opentx, functional_currency, rate));
        lot = Lot {
            opentransaction: translated,
            price: lot.price * rate,
            currency: functional_currency,
            ..lot
        };
    }

    let gaintx_currency = gaintx.currency().unwrap_or(lot.currency);
    if gaintx_currency != functional_currency {
        let dtsettle = gaintx.dtsettle().unwrap_or_else(|| gaintx.datetime());
        let rate = ledger.get_rate(gaintx_currency, functional_currency, dtsettle.date())?;
        gaintx = Arc::new(translate_transaction(&gaintx, functional_currency, rate));
        gainprice *= rate;
    }

    Ok(Gain {
        lot,
        transaction: gaintx,
        price: gainprice,
    })
}

/// Translate a transaction into a different currency for reporting.
///
/// Cash-bearing kinds scale their cash amount; spinoffs scale their security
/// pricing; everything else passes through unmodified.  `rate`'s numerator
/// is the destination currency, denominator the source currency.
pub fn translate_transaction(
    transaction: &Transaction,
    currency: Currency,
    rate: Decimal,
) -> Transaction {
    match transaction {
        Transaction::Trade(t) => {
            let mut t = t.clone();
            t.cash *= rate;
            t.currency = currency;
            Transaction::Trade(t)
        }
        Transaction::ReturnOfCapital(t) => {
            let mut t = t.clone();
            t.cash *= rate;
            t.currency = currency;
            Transaction::ReturnOfCapital(t)
        }
        Transaction::Exercise(t) => {
            let mut t = t.clone();
            t.cash *= rate;
            t.currency = currency;
            Transaction::Exercise(t)
        }
        Transaction::Spinoff(t) => {
            let mut t = t.clone();
            t.securityprice = t.securityprice.map(|p| p * rate);
            t.fromsecurityprice = t.fromsecurityprice.map(|p| p * rate);
            Transaction::Spinoff(t)
        }
        other => other.clone(),
    }
}
