//! Stored records for the capgains ledger
//!
//! Financial institutions, their accounts, securities (with alternate
//! identifiers), securities transactions, and currency exchange rates.
//! These are the serialized types; the booking engine in [`crate::inventory`]
//! works on validated per-kind transaction views built from [`Transaction`].

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CapgainsError, Result};
use crate::inventory::LotSort;

macro_rules! currencies {
    ($($code:ident),+ $(,)?) => {
        /// ISO 4217 currency code (practical subset)
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Currency {
            $($code,)+
        }

        impl fmt::Display for Currency {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let code = match self {
                    $(Currency::$code => stringify!($code),)+
                };
                f.write_str(code)
            }
        }

        impl FromStr for Currency {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let code = s.to_ascii_uppercase();
                $(
                    if code == stringify!($code) {
                        return Ok(Currency::$code);
                    }
                )+
                Err(format!("unknown currency code '{code}'"))
            }
        }
    };
}

currencies!(
    USD, EUR, GBP, JPY, CHF, CAD, AUD, NZD, SEK, NOK, DKK, HKD, SGD, TWD, KRW, CNY, INR, MXN,
    BRL, ZAR, PLN, CZK, HUF, ILS, TRY, THB, MYR, IDR, PHP,
);

/// Securities transaction kind.
///
/// Declaration order is the processing order for same-timestamp transactions:
/// corporate actions (return of capital, split, spinoff) are applied before
/// transfers, trades and exercises so reorgs land on the pre-trade position.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    ReturnCap,
    Split,
    Spinoff,
    Transfer,
    Trade,
    Exercise,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::ReturnCap => "returncap",
            TransactionKind::Split => "split",
            TransactionKind::Spinoff => "spinoff",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Trade => "trade",
            TransactionKind::Exercise => "exercise",
        };
        f.write_str(name)
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "returncap" | "returnofcapital" => Ok(TransactionKind::ReturnCap),
            "split" => Ok(TransactionKind::Split),
            "spinoff" => Ok(TransactionKind::Spinoff),
            "transfer" => Ok(TransactionKind::Transfer),
            "trade" => Ok(TransactionKind::Trade),
            "exercise" => Ok(TransactionKind::Exercise),
            other => Err(format!("unknown transaction kind '{other}'")),
        }
    }
}

/// A financial institution (e.g. brokerage); unique by `brokerid`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fi {
    pub id: i64,
    /// OFX <INVACCTFROM><BROKERID> value
    pub brokerid: String,
    pub name: Option<String>,
}

/// A financial institution account; unique by `(fi, number)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiAccount {
    pub id: i64,
    pub fi: i64,
    /// account# (OFX <INVACCTFROM><ACCTID> value)
    pub number: String,
    pub name: Option<String>,
}

/// Market-traded security
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    pub id: i64,
    pub name: Option<String>,
    pub ticker: Option<String>,
}

/// Alternate unique identifier for a security (CUSIP, ISIN, CONID, TICKER);
/// unique by `(uniqueidtype, uniqueid)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityId {
    pub id: i64,
    pub security: i64,
    pub uniqueidtype: String,
    pub uniqueid: String,
}

/// A securities transaction, as stored in the ledger.
///
/// One record type covers all kinds; which optional fields must be present
/// (and which must be absent) depends on `kind`.  [`Transaction::validate`]
/// enforces that, mirroring the subtype-null checks the kinds require.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// FI transaction unique identifier; unique per account
    pub uniqueid: String,
    /// Transaction date/time, accrual basis (ex-date for distributions)
    pub datetime: NaiveDateTime,
    /// Transaction date/time, cash basis (pay date for distributions)
    pub dtsettle: Option<NaiveDateTime>,
    pub kind: TransactionKind,
    pub memo: Option<String>,
    /// Currency denomination of `cash`
    pub currency: Option<Currency>,
    /// Change in money amount (+ increases cash, - decreases cash)
    pub cash: Option<Decimal>,
    pub fiaccount: i64,
    pub security: i64,
    /// Change in security amount (destination security for transfers)
    pub units: Option<Decimal>,
    /// For spinoffs: FMV of destination security post-spin
    pub securityprice: Option<Decimal>,
    /// For transfers: source FI account
    pub fromfiaccount: Option<i64>,
    /// For transfers, spinoffs, exercise: source security
    pub fromsecurity: Option<i64>,
    /// For transfers, exercise: change in source security amount
    pub fromunits: Option<Decimal>,
    /// For spinoffs: FMV of source security post-spin
    pub fromsecurityprice: Option<Decimal>,
    /// For splits, spinoffs: normalized units of destination security
    pub numerator: Option<Decimal>,
    /// For splits, spinoffs: normalized units of source security
    pub denominator: Option<Decimal>,
    /// Lot selection override for gain recognition
    pub sort: Option<LotSort>,
}

impl Transaction {
    /// Check the per-kind field constraints.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            TransactionKind::Trade => {
                self.require("currency", self.currency.is_some())?;
                self.require("cash", self.cash.is_some())?;
                self.require("units", self.units.is_some())?;
                if self.units == Some(Decimal::ZERO) {
                    return Err(self.invalid("units must be nonzero for a trade"));
                }
                self.forbid("securityprice", self.securityprice.is_none())?;
                self.forbid("fromfiaccount", self.fromfiaccount.is_none())?;
                self.forbid("fromsecurity", self.fromsecurity.is_none())?;
                self.forbid("fromunits", self.fromunits.is_none())?;
                self.forbid("fromsecurityprice", self.fromsecurityprice.is_none())?;
                self.forbid("numerator", self.numerator.is_none())?;
                self.forbid("denominator", self.denominator.is_none())?;
            }
            TransactionKind::ReturnCap => {
                self.require("currency", self.currency.is_some())?;
                self.require("cash", self.cash.is_some())?;
                self.forbid("units", self.units.is_none())?;
                self.forbid("securityprice", self.securityprice.is_none())?;
                self.forbid("fromfiaccount", self.fromfiaccount.is_none())?;
                self.forbid("fromsecurity", self.fromsecurity.is_none())?;
                self.forbid("fromunits", self.fromunits.is_none())?;
                self.forbid("fromsecurityprice", self.fromsecurityprice.is_none())?;
                self.forbid("numerator", self.numerator.is_none())?;
                self.forbid("denominator", self.denominator.is_none())?;
            }
            TransactionKind::Split => {
                self.require("units", self.units.is_some())?;
                self.require("numerator", self.numerator.is_some())?;
                self.require("denominator", self.denominator.is_some())?;
                self.forbid("currency", self.currency.is_none())?;
                self.forbid("cash", self.cash.is_none())?;
                self.forbid("securityprice", self.securityprice.is_none())?;
                self.forbid("fromfiaccount", self.fromfiaccount.is_none())?;
                self.forbid("fromsecurity", self.fromsecurity.is_none())?;
                self.forbid("fromunits", self.fromunits.is_none())?;
                self.forbid("fromsecurityprice", self.fromsecurityprice.is_none())?;
            }
            TransactionKind::Transfer => {
                self.require("units", self.units.is_some())?;
                self.require("fromfiaccount", self.fromfiaccount.is_some())?;
                self.require("fromsecurity", self.fromsecurity.is_some())?;
                self.require("fromunits", self.fromunits.is_some())?;
                self.forbid("currency", self.currency.is_none())?;
                self.forbid("cash", self.cash.is_none())?;
                self.forbid("securityprice", self.securityprice.is_none())?;
                self.forbid("fromsecurityprice", self.fromsecurityprice.is_none())?;
                self.forbid("numerator", self.numerator.is_none())?;
                self.forbid("denominator", self.denominator.is_none())?;
            }
            TransactionKind::Spinoff => {
                self.require("units", self.units.is_some())?;
                self.require("fromsecurity", self.fromsecurity.is_some())?;
                self.require("numerator", self.numerator.is_some())?;
                self.require("denominator", self.denominator.is_some())?;
                if self.numerator <= Some(Decimal::ZERO) || self.denominator <= Some(Decimal::ZERO)
                {
                    return Err(self.invalid("numerator and denominator must be positive"));
                }
                self.forbid("currency", self.currency.is_none())?;
                self.forbid("cash", self.cash.is_none())?;
                self.forbid("fromfiaccount", self.fromfiaccount.is_none())?;
                self.forbid("fromunits", self.fromunits.is_none())?;
            }
            TransactionKind::Exercise => {
                self.require("currency", self.currency.is_some())?;
                self.require("cash", self.cash.is_some())?;
                self.require("units", self.units.is_some())?;
                self.require("fromsecurity", self.fromsecurity.is_some())?;
                self.require("fromunits", self.fromunits.is_some())?;
                self.forbid("securityprice", self.securityprice.is_none())?;
                self.forbid("fromsecurityprice", self.fromsecurityprice.is_none())?;
                self.forbid("fromfiaccount", self.fromfiaccount.is_none())?;
                self.forbid("numerator", self.numerator.is_none())?;
                self.forbid("denominator", self.denominator.is_none())?;
            }
        }
        Ok(())
    }

    fn require(&self, field: &str, present: bool) -> Result<()> {
        if present {
            Ok(())
        } else {
            Err(self.invalid(format!("{} requires '{field}'", self.kind)))
        }
    }

    fn forbid(&self, field: &str, absent: bool) -> Result<()> {
        if absent {
            Ok(())
        } else {
            Err(self.invalid(format!("{} forbids '{field}'", self.kind)))
        }
    }

    fn invalid(&self, message: impl Into<String>) -> CapgainsError {
        CapgainsError::InvalidTransaction {
            uniqueid: self.uniqueid.clone(),
            message: message.into(),
        }
    }
}

/// Exchange rate for a currency pair on a date; unique by `(date, from, to)`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub id: i64,
    pub date: NaiveDate,
    /// Currency of the rate denominator
    pub fromcurrency: Currency,
    /// Currency of the rate numerator
    pub tocurrency: Currency,
    /// Multiply by a `fromcurrency` amount to yield a `tocurrency` amount
    pub rate: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade_record() -> Transaction {
        Transaction {
            id: 1,
            uniqueid: "tx-1".to_string(),
            datetime: NaiveDate::from_ymd_opt(2016, 1, 4)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid datetime"),
            dtsettle: None,
            kind: TransactionKind::Trade,
            memo: None,
            currency: Some(Currency::USD),
            cash: Some(dec!(-1000)),
            fiaccount: 1,
            security: 1,
            units: Some(dec!(100)),
            securityprice: None,
            fromfiaccount: None,
            fromsecurity: None,
            fromunits: None,
            fromsecurityprice: None,
            numerator: None,
            denominator: None,
            sort: None,
        }
    }

    #[test]
    fn test_currency_roundtrip() {
        assert_eq!("USD".parse::<Currency>(), Ok(Currency::USD));
        assert_eq!("eur".parse::<Currency>(), Ok(Currency::EUR));
        assert_eq!(Currency::CAD.to_string(), "CAD");
        assert!("XXX".parse::<Currency>().is_err());
    }

    #[test]
    fn test_kind_processing_order() {
        // Reorgs must sort before trades & transfers of the same timestamp
        let mut kinds = vec![
            TransactionKind::Trade,
            TransactionKind::Spinoff,
            TransactionKind::Exercise,
            TransactionKind::ReturnCap,
            TransactionKind::Transfer,
            TransactionKind::Split,
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::ReturnCap,
                TransactionKind::Split,
                TransactionKind::Spinoff,
                TransactionKind::Transfer,
                TransactionKind::Trade,
                TransactionKind::Exercise,
            ]
        );
    }

    #[test]
    fn test_kind_parse_aliases() {
        assert_eq!(
            "returnofcapital".parse::<TransactionKind>(),
            Ok(TransactionKind::ReturnCap)
        );
        assert_eq!("TRADE".parse::<TransactionKind>(), Ok(TransactionKind::Trade));
    }

    #[test]
    fn test_validate_trade_ok() {
        assert!(trade_record().validate().is_ok());
    }

    #[test]
    fn test_validate_trade_zero_units() {
        let mut tx = trade_record();
        tx.units = Some(Decimal::ZERO);
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_validate_trade_forbids_numerator() {
        let mut tx = trade_record();
        tx.numerator = Some(dec!(2));
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_validate_returncap_forbids_units() {
        let mut tx = trade_record();
        tx.kind = TransactionKind::ReturnCap;
        assert!(tx.validate().is_err());
        tx.units = None;
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_validate_split_requires_ratio() {
        let mut tx = trade_record();
        tx.kind = TransactionKind::Split;
        tx.currency = None;
        tx.cash = None;
        assert!(tx.validate().is_err());
        tx.numerator = Some(dec!(2));
        tx.denominator = Some(dec!(1));
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_validate_spinoff_positive_ratio() {
        let mut tx = trade_record();
        tx.kind = TransactionKind::Spinoff;
        tx.currency = None;
        tx.cash = None;
        tx.fromsecurity = Some(2);
        tx.numerator = Some(dec!(0));
        tx.denominator = Some(dec!(1));
        assert!(tx.validate().is_err());
        tx.numerator = Some(dec!(1));
        assert!(tx.validate().is_ok());
    }
}
