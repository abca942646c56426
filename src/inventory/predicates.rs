//! Filter predicates selecting Lots from positions

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::types::Lot;

/// Select open Lots created on or before `datetime`.
///
/// Matches both long and short lots.
pub fn open_as_of(datetime: NaiveDateTime) -> impl Fn(&Lot) -> bool {
    move |lot| lot.createtransaction.datetime() <= datetime
}

/// Select open long Lots (units > 0) created on or before `datetime`.
pub fn long_as_of(datetime: NaiveDateTime) -> impl Fn(&Lot) -> bool {
    move |lot| lot.createtransaction.datetime() <= datetime && lot.units > Decimal::ZERO
}

/// Select Lots that can be closed by a transaction's units: open as of
/// `datetime`, with sign opposite to `units`.
pub fn closable_by(units: Decimal, datetime: NaiveDateTime) -> impl Fn(&Lot) -> bool {
    move |lot| lot.createtransaction.datetime() <= datetime && lot.units * units < Decimal::ZERO
}
