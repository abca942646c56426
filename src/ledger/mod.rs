//! Persistent ledger of imported transaction data
//!
//! The ledger is a single JSON document on disk holding financial
//! institutions, accounts, securities (with their alternate identifiers),
//! transactions and currency rates.  Imports go through `merge_*` methods
//! that deduplicate by each record's natural signature: query for a match,
//! insert when absent.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CapgainsError, Result, ledger};
use crate::models::{Currency, CurrencyRate, Fi, FiAccount, Security, SecurityId, Transaction};

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDoc {
    #[serde(default)]
    fis: Vec<Fi>,
    #[serde(default)]
    accounts: Vec<FiAccount>,
    #[serde(default)]
    securities: Vec<Security>,
    #[serde(default)]
    securityids: Vec<SecurityId>,
    #[serde(default)]
    transactions: Vec<Transaction>,
    #[serde(default)]
    rates: Vec<CurrencyRate>,
}

/// On-disk transaction store
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    doc: LedgerDoc,
}

impl Ledger {
    /// Open a ledger file, starting empty if the file doesn't exist yet
    pub fn open(path: &Path) -> Result<Self> {
        let doc = if path.exists() {
            let raw = fs::read_to_string(path)
                .map_err(|e| ledger::read_failed(path, e.to_string()))?;
            serde_json::from_str(&raw).map_err(|e| ledger::parse_failed(path, e.to_string()))?
        } else {
            LedgerDoc::default()
        };
        Ok(Ledger {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the ledger back to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ledger::write_failed(&self.path, e.to_string()))?;
            }
        }
        let raw = serde_json::to_string_pretty(&self.doc)
            .map_err(|e| ledger::write_failed(&self.path, e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| ledger::write_failed(&self.path, e.to_string()))
    }

    /// Find-or-insert a financial institution by brokerid
    pub fn merge_fi(&mut self, brokerid: &str, name: Option<&str>) -> i64 {
        if let Some(fi) = self.doc.fis.iter().find(|fi| fi.brokerid == brokerid) {
            debug!(brokerid, id = fi.id, "existing FI loaded from ledger");
            return fi.id;
        }
        let id = next_id(self.doc.fis.iter().map(|fi| fi.id));
        debug!(brokerid, id, "created FI");
        self.doc.fis.push(Fi {
            id,
            brokerid: brokerid.to_string(),
            name: name.map(str::to_string),
        });
        id
    }

    /// Find-or-insert an account by (FI, account number)
    pub fn merge_account(&mut self, brokerid: &str, number: &str, name: Option<&str>) -> i64 {
        let fi = self.merge_fi(brokerid, None);
        if let Some(account) = self
            .doc
            .accounts
            .iter()
            .find(|acct| acct.fi == fi && acct.number == number)
        {
            debug!(brokerid, number, id = account.id, "existing account loaded from ledger");
            return account.id;
        }
        let id = next_id(self.doc.accounts.iter().map(|acct| acct.id));
        debug!(brokerid, number, id, "created account");
        self.doc.accounts.push(FiAccount {
            id,
            fi,
            number: number.to_string(),
            name: name.map(str::to_string),
        });
        id
    }

    /// Find-or-insert a security.
    ///
    /// Resolution order: exact alternate id match; then (ticker, name) match;
    /// then ticker match.  A ticker/name match with a new alternate id is
    /// probably the same security known under another identifier, so the new
    /// id is attached to it.  Otherwise a new security is inserted.
    pub fn merge_security(
        &mut self,
        uniqueidtype: &str,
        uniqueid: &str,
        ticker: Option<&str>,
        name: Option<&str>,
    ) -> i64 {
        if let Some(secid) = self
            .doc
            .securityids
            .iter()
            .find(|sid| sid.uniqueidtype == uniqueidtype && sid.uniqueid == uniqueid)
        {
            debug!(uniqueidtype, uniqueid, id = secid.security, "existing security loaded from ledger");
            return secid.security;
        }

        let matched = ticker.and_then(|tk| {
            let by_ticker_name = self
                .doc
                .securities
                .iter()
                .find(|sec| sec.ticker.as_deref() == Some(tk) && sec.name.as_deref() == name);
            by_ticker_name
                .or_else(|| {
                    self.doc
                        .securities
                        .iter()
                        .find(|sec| sec.ticker.as_deref() == Some(tk))
                })
                .map(|sec| sec.id)
        });

        let security = match matched {
            Some(security) => {
                // Matching ticker, different uniqueid: probably the same
                // security under an alternate id
                debug!(uniqueidtype, uniqueid, id = security, "attached alternate id to security");
                security
            }
            None => {
                let id = next_id(self.doc.securities.iter().map(|sec| sec.id));
                debug!(uniqueidtype, uniqueid, id, "created security");
                self.doc.securities.push(Security {
                    id,
                    name: name.map(str::to_string),
                    ticker: ticker.map(str::to_string),
                });
                id
            }
        };

        let secid_id = next_id(self.doc.securityids.iter().map(|sid| sid.id));
        self.doc.securityids.push(SecurityId {
            id: secid_id,
            security,
            uniqueidtype: uniqueidtype.to_string(),
            uniqueid: uniqueid.to_string(),
        });
        security
    }

    /// Insert a validated transaction, deduplicating by (account, uniqueid).
    ///
    /// Returns the record id and whether a new record was inserted.
    pub fn merge_transaction(&mut self, mut tx: Transaction) -> Result<(i64, bool)> {
        tx.validate()?;
        if let Some(existing) = self
            .doc
            .transactions
            .iter()
            .find(|t| t.fiaccount == tx.fiaccount && t.uniqueid == tx.uniqueid)
        {
            debug!(uniqueid = %tx.uniqueid, id = existing.id, "existing transaction loaded from ledger");
            return Ok((existing.id, false));
        }
        let id = next_id(self.doc.transactions.iter().map(|t| t.id));
        debug!(uniqueid = %tx.uniqueid, id, "created transaction");
        tx.id = id;
        self.doc.transactions.push(tx);
        Ok((id, true))
    }

    /// Find-or-insert an exchange rate by (date, from, to)
    pub fn merge_rate(
        &mut self,
        date: NaiveDate,
        fromcurrency: Currency,
        tocurrency: Currency,
        rate: Decimal,
    ) -> i64 {
        if let Some(existing) = self.doc.rates.iter().find(|r| {
            r.date == date && r.fromcurrency == fromcurrency && r.tocurrency == tocurrency
        }) {
            return existing.id;
        }
        let id = next_id(self.doc.rates.iter().map(|r| r.id));
        self.doc.rates.push(CurrencyRate {
            id,
            date,
            fromcurrency,
            tocurrency,
            rate,
        });
        id
    }

    /// Exchange rate as `tocurrency`/`fromcurrency` on a date, falling back
    /// to the reciprocal of the reversed pair
    pub fn get_rate(
        &self,
        fromcurrency: Currency,
        tocurrency: Currency,
        date: NaiveDate,
    ) -> Result<Decimal> {
        let direct = self.doc.rates.iter().find(|r| {
            r.date == date && r.fromcurrency == fromcurrency && r.tocurrency == tocurrency
        });
        if let Some(rate) = direct {
            return Ok(rate.rate);
        }
        let reversed = self.doc.rates.iter().find(|r| {
            r.date == date && r.fromcurrency == tocurrency && r.tocurrency == fromcurrency
        });
        match reversed {
            Some(rate) => Ok(Decimal::ONE / rate.rate),
            None => Err(ledger::no_currency_rate(fromcurrency, tocurrency, date)),
        }
    }

    /// Transactions within [dtstart, dtend], ordered for booking:
    /// by datetime, then kind (reorgs before trades), then uniqueid
    pub fn transactions_between(
        &self,
        dtstart: Option<NaiveDateTime>,
        dtend: Option<NaiveDateTime>,
    ) -> Vec<Transaction> {
        let mut selected: Vec<Transaction> = self
            .doc
            .transactions
            .iter()
            .filter(|tx| {
                dtstart.is_none_or(|start| tx.datetime >= start)
                    && dtend.is_none_or(|end| tx.datetime <= end)
            })
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            (a.datetime, a.kind, &a.uniqueid).cmp(&(b.datetime, b.kind, &b.uniqueid))
        });
        selected
    }

    pub fn transaction_count(&self) -> usize {
        self.doc.transactions.len()
    }

    pub fn fi(&self, id: i64) -> Result<&Fi> {
        self.doc
            .fis
            .iter()
            .find(|fi| fi.id == id)
            .ok_or(CapgainsError::UnknownFi { id })
    }

    pub fn account(&self, id: i64) -> Result<&FiAccount> {
        self.doc
            .accounts
            .iter()
            .find(|acct| acct.id == id)
            .ok_or(CapgainsError::UnknownAccount { id })
    }

    pub fn security(&self, id: i64) -> Result<&Security> {
        self.doc
            .securities
            .iter()
            .find(|sec| sec.id == id)
            .ok_or(CapgainsError::UnknownSecurity { id })
    }

    /// All alternate identifiers attached to a security
    pub fn security_alt_ids(&self, security: i64) -> Vec<&SecurityId> {
        self.doc
            .securityids
            .iter()
            .filter(|sid| sid.security == security)
            .collect()
    }

    /// The security's alternate id of the given type, if it has exactly one
    pub fn alt_id(&self, security: i64, uniqueidtype: &str) -> Result<Option<&str>> {
        let ids: Vec<&SecurityId> = self
            .doc
            .securityids
            .iter()
            .filter(|sid| sid.security == security && sid.uniqueidtype == uniqueidtype)
            .collect();
        match ids.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(&only.uniqueid)),
            _ => Err(CapgainsError::DuplicateSecurityId {
                security,
                uniqueidtype: uniqueidtype.to_string(),
            }),
        }
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}
