//! Data structures for tracking units/cost history of financial assets

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::error::{Result, inventory::booking_invalid};
use crate::models::{self, Currency, TransactionKind};

/// Buy/sell a security, creating basis (if opening) or realizing gain
/// (if closing)
#[derive(Clone, Debug, PartialEq)]
pub struct Trade {
    pub uniqueid: String,
    pub datetime: NaiveDateTime,
    pub fiaccount: i64,
    pub security: i64,
    pub units: Decimal,
    pub currency: Currency,
    pub cash: Decimal,
    pub memo: Option<String>,
    pub dtsettle: Option<NaiveDateTime>,
}

/// Cash distribution that reduces cost basis.
///
/// `datetime` is the ex-date; `dtsettle` is the pay date.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnOfCapital {
    pub uniqueid: String,
    pub datetime: NaiveDateTime,
    pub fiaccount: i64,
    pub security: i64,
    pub currency: Currency,
    pub cash: Decimal,
    pub memo: Option<String>,
    pub dtsettle: Option<NaiveDateTime>,
}

/// Move assets between (account, security) pockets, retaining basis and open
/// date.  Units can change in transit, so this type also covers corporate
/// reorganizations (mergers, etc.).
#[derive(Clone, Debug, PartialEq)]
pub struct Transfer {
    pub uniqueid: String,
    pub datetime: NaiveDateTime,
    pub fiaccount: i64,
    pub security: i64,
    pub units: Decimal,
    pub fromfiaccount: i64,
    pub fromsecurity: i64,
    pub fromunits: Decimal,
    pub memo: Option<String>,
}

/// Change position units without affecting cost basis or holding period.
///
/// Splits are declared in terms of new units : old units, normalized as
/// `numerator`:`denominator`.
#[derive(Clone, Debug, PartialEq)]
pub struct Split {
    pub uniqueid: String,
    pub datetime: NaiveDateTime,
    pub fiaccount: i64,
    pub security: i64,
    pub units: Decimal,
    pub numerator: Decimal,
    pub denominator: Decimal,
    pub memo: Option<String>,
}

/// Turn one security into two, partitioning cost basis between them.
///
/// Per the US tax code, cost basis must be divided between the two positions
/// in proportion to their fair market value.  Post-spin market pricing
/// (`securityprice` for the spun-off security, `fromsecurityprice` for the
/// spinning security) isn't generally known at the time of the spinoff and
/// must be edited in once market data becomes available; until then all
/// basis stays with the source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Spinoff {
    pub uniqueid: String,
    pub datetime: NaiveDateTime,
    pub fiaccount: i64,
    pub security: i64,
    pub units: Decimal,
    pub numerator: Decimal,
    pub denominator: Decimal,
    pub fromsecurity: i64,
    pub memo: Option<String>,
    pub securityprice: Option<Decimal>,
    pub fromsecurityprice: Option<Decimal>,
}

/// Exercise a securities option, buying/selling the underlying.
///
/// Exercising removes the option units from the account and rolls their cost
/// basis into the underlying.  For tax purposes the underlying's holding
/// period begins at exercise, not at purchase of the option.  `cash` is the
/// net exercise payment (+ for long put/short call, - for long call/short
/// put).
#[derive(Clone, Debug, PartialEq)]
pub struct Exercise {
    pub uniqueid: String,
    pub datetime: NaiveDateTime,
    pub fiaccount: i64,
    pub security: i64,
    pub units: Decimal,
    pub currency: Currency,
    pub cash: Decimal,
    pub fromsecurity: i64,
    pub fromunits: Decimal,
    pub memo: Option<String>,
}

/// Placeholder for a lot's opening transaction recovered from a serialized
/// report.  Never dispatched by [`crate::inventory::Portfolio::book`].
#[derive(Clone, Debug, PartialEq)]
pub struct Opening {
    pub uniqueid: String,
    pub datetime: NaiveDateTime,
}

/// A validated, typed view of a securities transaction, ready for booking
#[derive(Clone, Debug, PartialEq)]
pub enum Transaction {
    Trade(Trade),
    ReturnOfCapital(ReturnOfCapital),
    Transfer(Transfer),
    Split(Split),
    Spinoff(Spinoff),
    Exercise(Exercise),
    Opening(Opening),
}

impl Transaction {
    pub fn uniqueid(&self) -> &str {
        match self {
            Transaction::Trade(t) => &t.uniqueid,
            Transaction::ReturnOfCapital(t) => &t.uniqueid,
            Transaction::Transfer(t) => &t.uniqueid,
            Transaction::Split(t) => &t.uniqueid,
            Transaction::Spinoff(t) => &t.uniqueid,
            Transaction::Exercise(t) => &t.uniqueid,
            Transaction::Opening(t) => &t.uniqueid,
        }
    }

    pub fn datetime(&self) -> NaiveDateTime {
        match self {
            Transaction::Trade(t) => t.datetime,
            Transaction::ReturnOfCapital(t) => t.datetime,
            Transaction::Transfer(t) => t.datetime,
            Transaction::Split(t) => t.datetime,
            Transaction::Spinoff(t) => t.datetime,
            Transaction::Exercise(t) => t.datetime,
            Transaction::Opening(t) => t.datetime,
        }
    }

    /// Settlement date/time, where the transaction kind records one
    pub fn dtsettle(&self) -> Option<NaiveDateTime> {
        match self {
            Transaction::Trade(t) => t.dtsettle,
            Transaction::ReturnOfCapital(t) => t.dtsettle,
            _ => None,
        }
    }

    /// Currency of the transaction's cash amount, where it has one
    pub fn currency(&self) -> Option<Currency> {
        match self {
            Transaction::Trade(t) => Some(t.currency),
            Transaction::ReturnOfCapital(t) => Some(t.currency),
            Transaction::Exercise(t) => Some(t.currency),
            _ => None,
        }
    }

    /// Destination FI account (the account where security/cash changes)
    pub fn fiaccount(&self) -> Option<i64> {
        match self {
            Transaction::Trade(t) => Some(t.fiaccount),
            Transaction::ReturnOfCapital(t) => Some(t.fiaccount),
            Transaction::Transfer(t) => Some(t.fiaccount),
            Transaction::Split(t) => Some(t.fiaccount),
            Transaction::Spinoff(t) => Some(t.fiaccount),
            Transaction::Exercise(t) => Some(t.fiaccount),
            Transaction::Opening(_) => None,
        }
    }

    /// Destination security (the asset that changes)
    pub fn security(&self) -> Option<i64> {
        match self {
            Transaction::Trade(t) => Some(t.security),
            Transaction::ReturnOfCapital(t) => Some(t.security),
            Transaction::Transfer(t) => Some(t.security),
            Transaction::Split(t) => Some(t.security),
            Transaction::Spinoff(t) => Some(t.security),
            Transaction::Exercise(t) => Some(t.security),
            Transaction::Opening(_) => None,
        }
    }

    pub fn memo(&self) -> Option<&str> {
        match self {
            Transaction::Trade(t) => t.memo.as_deref(),
            Transaction::ReturnOfCapital(t) => t.memo.as_deref(),
            Transaction::Transfer(t) => t.memo.as_deref(),
            Transaction::Split(t) => t.memo.as_deref(),
            Transaction::Spinoff(t) => t.memo.as_deref(),
            Transaction::Exercise(t) => t.memo.as_deref(),
            Transaction::Opening(_) => None,
        }
    }

    /// Build a typed transaction from a stored ledger record.
    ///
    /// Runs the record's per-kind field validation first, so the extracted
    /// fields are known present.
    pub fn from_record(record: &models::Transaction) -> Result<Transaction> {
        record.validate()?;
        let uniqueid = &record.uniqueid;
        let tx = match record.kind {
            TransactionKind::Trade => Transaction::Trade(Trade {
                uniqueid: record.uniqueid.clone(),
                datetime: record.datetime,
                fiaccount: record.fiaccount,
                security: record.security,
                units: req(record.units, uniqueid, "units")?,
                currency: req(record.currency, uniqueid, "currency")?,
                cash: req(record.cash, uniqueid, "cash")?,
                memo: record.memo.clone(),
                dtsettle: record.dtsettle,
            }),
            TransactionKind::ReturnCap => Transaction::ReturnOfCapital(ReturnOfCapital {
                uniqueid: record.uniqueid.clone(),
                datetime: record.datetime,
                fiaccount: record.fiaccount,
                security: record.security,
                currency: req(record.currency, uniqueid, "currency")?,
                cash: req(record.cash, uniqueid, "cash")?,
                memo: record.memo.clone(),
                dtsettle: record.dtsettle,
            }),
            TransactionKind::Transfer => Transaction::Transfer(Transfer {
                uniqueid: record.uniqueid.clone(),
                datetime: record.datetime,
                fiaccount: record.fiaccount,
                security: record.security,
                units: req(record.units, uniqueid, "units")?,
                fromfiaccount: req(record.fromfiaccount, uniqueid, "fromfiaccount")?,
                fromsecurity: req(record.fromsecurity, uniqueid, "fromsecurity")?,
                fromunits: req(record.fromunits, uniqueid, "fromunits")?,
                memo: record.memo.clone(),
            }),
            TransactionKind::Split => Transaction::Split(Split {
                uniqueid: record.uniqueid.clone(),
                datetime: record.datetime,
                fiaccount: record.fiaccount,
                security: record.security,
                units: req(record.units, uniqueid, "units")?,
                numerator: req(record.numerator, uniqueid, "numerator")?,
                denominator: req(record.denominator, uniqueid, "denominator")?,
                memo: record.memo.clone(),
            }),
            TransactionKind::Spinoff => Transaction::Spinoff(Spinoff {
                uniqueid: record.uniqueid.clone(),
                datetime: record.datetime,
                fiaccount: record.fiaccount,
                security: record.security,
                units: req(record.units, uniqueid, "units")?,
                numerator: req(record.numerator, uniqueid, "numerator")?,
                denominator: req(record.denominator, uniqueid, "denominator")?,
                fromsecurity: req(record.fromsecurity, uniqueid, "fromsecurity")?,
                memo: record.memo.clone(),
                securityprice: record.securityprice,
                fromsecurityprice: record.fromsecurityprice,
            }),
            TransactionKind::Exercise => Transaction::Exercise(Exercise {
                uniqueid: record.uniqueid.clone(),
                datetime: record.datetime,
                fiaccount: record.fiaccount,
                security: record.security,
                units: req(record.units, uniqueid, "units")?,
                currency: req(record.currency, uniqueid, "currency")?,
                cash: req(record.cash, uniqueid, "cash")?,
                fromsecurity: req(record.fromsecurity, uniqueid, "fromsecurity")?,
                fromunits: req(record.fromunits, uniqueid, "fromunits")?,
                memo: record.memo.clone(),
            }),
        };
        Ok(tx)
    }
}

fn req<T>(value: Option<T>, uniqueid: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| booking_invalid(uniqueid, format!("missing '{field}'")))
}

/// Cost basis/holding data container for a securities position.
///
/// `units` must be nonzero; `price` must be positive or zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Lot {
    /// Transaction creating basis, which began the tax holding period
    pub opentransaction: Arc<Transaction>,
    /// Transaction booking the Lot into its current (account, security)
    pub createtransaction: Arc<Transaction>,
    pub units: Decimal,
    /// Per-unit cost basis
    pub price: Decimal,
    /// Currency denomination of `price`
    pub currency: Currency,
}

impl Lot {
    /// Copy of the lot with different units
    pub fn with_units(&self, units: Decimal) -> Lot {
        Lot {
            units,
            ..self.clone()
        }
    }

    /// Copy of the lot with a different per-unit price
    pub fn with_price(&self, price: Decimal) -> Lot {
        Lot {
            price,
            ..self.clone()
        }
    }
}

/// Binds a realizing transaction to a Lot (and indirectly to the Lot's
/// opening transaction).
///
/// Realizing transactions are usually closing transactions, but return of
/// capital distributions that exceed cost basis also realize gains; those
/// don't carry per-share distribution information, so the per-unit realizing
/// `price` is kept here.
#[derive(Clone, Debug, PartialEq)]
pub struct Gain {
    pub lot: Lot,
    pub transaction: Arc<Transaction>,
    /// Per-unit cash amount of the realizing transaction
    pub price: Decimal,
}

impl Gain {
    pub fn proceeds(&self) -> Decimal {
        self.lot.units * self.price
    }

    pub fn basis(&self) -> Decimal {
        self.lot.units * self.lot.price
    }
}
