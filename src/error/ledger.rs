//! Ledger persistence and lookup errors

use super::CapgainsError;
use chrono::NaiveDate;
use std::path::Path;

pub fn read_failed(path: &Path, reason: impl Into<String>) -> CapgainsError {
    CapgainsError::LedgerReadFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

pub fn parse_failed(path: &Path, reason: impl Into<String>) -> CapgainsError {
    CapgainsError::LedgerParseFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

pub fn write_failed(path: &Path, reason: impl Into<String>) -> CapgainsError {
    CapgainsError::LedgerWriteFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

pub fn no_currency_rate(
    fromcurrency: impl ToString,
    tocurrency: impl ToString,
    date: NaiveDate,
) -> CapgainsError {
    CapgainsError::NoCurrencyRate {
        fromcurrency: fromcurrency.to_string(),
        tocurrency: tocurrency.to_string(),
        date: date.to_string(),
    }
}
