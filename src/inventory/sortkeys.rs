//! Sort orders for positions (i.e. lists of Lots)
//!
//! The order a position is sorted in before closing lots determines which
//! lots get matched, and therefore the amount and character of recognized
//! gain.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::types::Lot;

/// Lot selection order for gain recognition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LotSort {
    /// Oldest holding period first
    Fifo,
    /// Newest holding period first
    Lifo,
    /// Highest cost basis first (minimizes recognized gain)
    MinGain,
    /// Lowest cost basis first (maximizes recognized gain)
    MaxGain,
}

impl LotSort {
    /// Sort a position in place.
    ///
    /// Ties break on the opening transaction's uniqueid so the order is
    /// deterministic across runs.
    pub fn sort(self, position: &mut [Lot]) {
        match self {
            LotSort::Fifo => position.sort_by(compare_oldest),
            LotSort::Lifo => position.sort_by(|a, b| compare_oldest(a, b).reverse()),
            LotSort::MinGain => position.sort_by(|a, b| {
                b.price
                    .cmp(&a.price)
                    .then_with(|| compare_open_uniqueid(a, b))
            }),
            LotSort::MaxGain => position.sort_by(|a, b| {
                a.price
                    .cmp(&b.price)
                    .then_with(|| compare_open_uniqueid(a, b))
            }),
        }
    }
}

fn compare_oldest(a: &Lot, b: &Lot) -> Ordering {
    a.opentransaction
        .datetime()
        .cmp(&b.opentransaction.datetime())
        .then_with(|| compare_open_uniqueid(a, b))
}

fn compare_open_uniqueid(a: &Lot, b: &Lot) -> Ordering {
    a.opentransaction
        .uniqueid()
        .cmp(b.opentransaction.uniqueid())
}

impl fmt::Display for LotSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LotSort::Fifo => "FIFO",
            LotSort::Lifo => "LIFO",
            LotSort::MinGain => "MINGAIN",
            LotSort::MaxGain => "MAXGAIN",
        };
        f.write_str(name)
    }
}

impl FromStr for LotSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(LotSort::Fifo),
            "LIFO" => Ok(LotSort::Lifo),
            "MINGAIN" => Ok(LotSort::MinGain),
            "MAXGAIN" => Ok(LotSort::MaxGain),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}
