//! Booking: applying transactions to portfolio positions
//!
//! [`Portfolio::book`] dispatches on transaction kind to a handler that
//! updates the affected position(s) and returns the [`Gain`]s realized by
//! the transaction.  Handlers never mutate a lot in place; changed lots are
//! rebuilt and the old ones dropped from the position.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{
    Result,
    inventory::{booking_invalid, inconsistent},
};

use super::functions::{part_basis, part_units};
use super::predicates::{closable_by, long_as_of, open_as_of};
use super::sortkeys::LotSort;
use super::types::{Exercise, Gain, Lot, ReturnOfCapital, Spinoff, Split, Trade, Transaction, Transfer};

/// Significance threshold for the difference between predicted and reported
/// units.
///
/// For transactions that scale units by a ratio (split, spinoff) and for
/// transfers/exercises that drain a source position, if the predicted unit
/// change differs from the reported units by more than this, booking raises
/// an inconsistency error instead of silently absorbing the difference.
pub const UNITS_RESOLUTION: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// An (FI account, security) pair locating a position
pub type Pocket = (i64, i64);

/// Mapping container for securities positions (i.e. lists of [`Lot`]s),
/// keyed by pocket
#[derive(Clone, Debug, Default)]
pub struct Portfolio {
    positions: BTreeMap<Pocket, Vec<Lot>>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lots currently held in a pocket
    pub fn position(&self, fiaccount: i64, security: i64) -> &[Lot] {
        self.positions
            .get(&(fiaccount, security))
            .map_or(&[], Vec::as_slice)
    }

    /// Seed a pocket with a lot (e.g. a baseline position loaded from CSV)
    pub fn push_lot(&mut self, fiaccount: i64, security: i64, lot: Lot) {
        self.positions
            .entry((fiaccount, security))
            .or_default()
            .push(lot);
    }

    /// Iterate (pocket, position) pairs in pocket order
    pub fn positions(&self) -> impl Iterator<Item = (&Pocket, &Vec<Lot>)> {
        self.positions.iter()
    }

    /// Apply a transaction to the appropriate position(s).
    ///
    /// `sort` chooses the lot selection order for gain recognition; handlers
    /// that don't recognize gains ignore it.  Defaults to FIFO.
    ///
    /// Returns the gains realized by the transaction, i.e. one [`Gain`] per
    /// closed lot.
    pub fn book(&mut self, transaction: &Arc<Transaction>, sort: Option<LotSort>) -> Result<Vec<Gain>> {
        match transaction.as_ref() {
            Transaction::Trade(t) => {
                book_trade(self, transaction, t.clone(), sort, None, None)
            }
            Transaction::ReturnOfCapital(t) => book_returnofcapital(self, transaction, t),
            Transaction::Split(t) => book_split(self, t),
            Transaction::Transfer(t) => book_transfer(self, transaction, t, sort),
            Transaction::Spinoff(t) => book_spinoff(self, transaction, t, sort),
            Transaction::Exercise(t) => book_exercise(self, transaction, t, sort),
            Transaction::Opening(t) => Err(booking_invalid(
                &t.uniqueid,
                "opening placeholders cannot be booked",
            )),
        }
    }

    // Handlers work on a copy and assign back only on success, so a failed
    // booking leaves the portfolio untouched
    fn get_position(&self, pocket: Pocket) -> Vec<Lot> {
        self.positions.get(&pocket).cloned().unwrap_or_default()
    }

    fn set_position(&mut self, pocket: Pocket, position: Vec<Lot>) {
        self.positions.insert(pocket, position);
    }
}

fn units_of(lots: &[Lot]) -> Decimal {
    lots.iter().map(|lot| lot.units).sum()
}

/// Apply a trade: close opposite-signed lots up to the trade's units, then
/// open a new lot with any residue.
///
/// `opentransaction`/`createtransaction` overrides are hooks for
/// [`transfer_basis`] (to preserve holding periods and record the booking
/// transaction) and should not normally be used.
fn book_trade(
    portfolio: &mut Portfolio,
    transaction: &Arc<Transaction>,
    trade: Trade,
    sort: Option<LotSort>,
    opentransaction: Option<Arc<Transaction>>,
    createtransaction: Option<Arc<Transaction>>,
) -> Result<Vec<Gain>> {
    if trade.units == Decimal::ZERO {
        return Err(booking_invalid(&trade.uniqueid, "units can't be zero"));
    }

    let pocket = (trade.fiaccount, trade.security);
    let mut position = portfolio.get_position(pocket);
    sort.unwrap_or(LotSort::Fifo).sort(&mut position);

    // Remove closed lots from the position
    let (lots_closed, mut position) = part_units(
        position,
        closable_by(trade.units, trade.datetime),
        Some(-trade.units),
    );

    let units = trade.units + units_of(&lots_closed);
    let price = (trade.cash / trade.units).abs();
    if units != Decimal::ZERO {
        position.push(Lot {
            opentransaction: opentransaction.unwrap_or_else(|| Arc::clone(transaction)),
            createtransaction: createtransaction
                .clone()
                .unwrap_or_else(|| Arc::clone(transaction)),
            units,
            price,
            currency: trade.currency,
        });
    }

    portfolio.set_position(pocket, position);

    let realizing = createtransaction.unwrap_or_else(|| Arc::clone(transaction));
    Ok(lots_closed
        .into_iter()
        .map(|lot| Gain {
            lot,
            transaction: Arc::clone(&realizing),
            price,
        })
        .collect())
}

/// Distribute cash pro rata over the open long position, reducing per-unit
/// basis; distribution in excess of basis realizes gain.
fn book_returnofcapital(
    portfolio: &mut Portfolio,
    transaction: &Arc<Transaction>,
    roc: &ReturnOfCapital,
) -> Result<Vec<Gain>> {
    let pocket = (roc.fiaccount, roc.security);
    let position = portfolio.get_position(pocket);

    // Total the shares receiving the distribution to get return of capital
    // per share
    let (unaffected, affected) = crate::utils::partition(long_as_of(roc.datetime), position);
    if affected.is_empty() {
        return Err(inconsistent(
            &roc.uniqueid,
            format!(
                "FI account {} has no long position in security {} as of {}",
                roc.fiaccount, roc.security, roc.datetime
            ),
        ));
    }

    let unit_roc = roc.cash / units_of(&affected);

    let mut gains = Vec::new();
    let mut reduced = Vec::with_capacity(affected.len());
    for lot in affected {
        let new_basis = lot.price - unit_roc;
        if new_basis < Decimal::ZERO {
            gains.push(Gain {
                lot: lot.clone(),
                transaction: Arc::clone(transaction),
                price: unit_roc,
            });
            reduced.push(lot.with_price(Decimal::ZERO));
        } else {
            reduced.push(lot.with_price(new_basis));
        }
    }

    reduced.extend(unaffected);
    portfolio.set_position(pocket, reduced);
    Ok(gains)
}

/// Scale affected lot units by the split ratio and price by its inverse,
/// preserving basis and holding period.  Splits realize nothing.
fn book_split(portfolio: &mut Portfolio, split: &Split) -> Result<Vec<Gain>> {
    if split.numerator <= Decimal::ZERO || split.denominator <= Decimal::ZERO {
        return Err(booking_invalid(
            &split.uniqueid,
            "numerator and denominator must be positive",
        ));
    }
    let ratio = split.numerator / split.denominator;

    let pocket = (split.fiaccount, split.security);
    let position = portfolio.get_position(pocket);

    if position.is_empty() {
        return Err(inconsistent(
            &split.uniqueid,
            format!(
                "split {}:{} of security {} on {}: no position in FI account {}",
                split.numerator, split.denominator, split.security, split.datetime, split.fiaccount
            ),
        ));
    }

    let (unaffected, affected) = crate::utils::partition(open_as_of(split.datetime), position);

    let orig_units = units_of(&affected);
    let mut adjusted: Vec<Lot> = affected
        .into_iter()
        .map(|lot| {
            let units = lot.units * ratio;
            let price = lot.price / ratio;
            Lot {
                units,
                price,
                ..lot
            }
        })
        .collect();

    let new_units = units_of(&adjusted) - orig_units;
    if (new_units - split.units).abs() > UNITS_RESOLUTION {
        return Err(inconsistent(
            &split.uniqueid,
            format!(
                "split {}:{} of security {}: receiving {} units requires a position of {} units \
                 in FI account {} on {}, not {}",
                split.numerator,
                split.denominator,
                split.security,
                split.units,
                split.units / ratio,
                split.fiaccount,
                split.datetime,
                orig_units
            ),
        ));
    }

    adjusted.extend(unaffected);
    portfolio.set_position(pocket, adjusted);

    // Stock splits don't realize gains
    Ok(Vec::new())
}

/// Move lots between pockets, retaining basis and open date
fn book_transfer(
    portfolio: &mut Portfolio,
    transaction: &Arc<Transaction>,
    transfer: &Transfer,
    sort: Option<LotSort>,
) -> Result<Vec<Gain>> {
    if transfer.units * transfer.fromunits >= Decimal::ZERO {
        return Err(booking_invalid(
            &transfer.uniqueid,
            "units and fromunits aren't oppositely signed",
        ));
    }

    let pocket_from = (transfer.fromfiaccount, transfer.fromsecurity);
    let mut position_from = portfolio.get_position(pocket_from);
    if position_from.is_empty() {
        return Err(inconsistent(
            &transfer.uniqueid,
            format!("no position in pocket {pocket_from:?}"),
        ));
    }
    sort.unwrap_or(LotSort::Fifo).sort(&mut position_from);

    // Remove the lots from the source position
    let (lots_from, position_from) = part_units(
        position_from,
        open_as_of(transfer.datetime),
        Some(-transfer.fromunits),
    );

    let open_units = units_of(&lots_from);
    if (open_units + transfer.fromunits).abs() > UNITS_RESOLUTION {
        return Err(inconsistent(
            &transfer.uniqueid,
            format!(
                "position in security {} for FI account {} on {} is only {} units; \
                 can't transfer out {} units",
                transfer.fromsecurity,
                transfer.fromfiaccount,
                transfer.datetime,
                open_units,
                transfer.fromunits
            ),
        ));
    }

    portfolio.set_position(pocket_from, position_from);

    let ratio = -transfer.units / transfer.fromunits;

    let mut gains = Vec::new();
    for lot in lots_from {
        gains.extend(transfer_basis(
            portfolio,
            lot,
            transaction,
            ratio,
            sort,
            None,
            true,
        )?);
    }
    Ok(gains)
}

/// Partition cost basis out of the source position in proportion to fair
/// market value, and book it into the spun-off security
fn book_spinoff(
    portfolio: &mut Portfolio,
    transaction: &Arc<Transaction>,
    spinoff: &Spinoff,
    sort: Option<LotSort>,
) -> Result<Vec<Gain>> {
    if spinoff.numerator <= Decimal::ZERO || spinoff.denominator <= Decimal::ZERO {
        return Err(booking_invalid(
            &spinoff.uniqueid,
            "numerator and denominator must be positive",
        ));
    }

    let pocket_from = (spinoff.fiaccount, spinoff.fromsecurity);
    let mut position_from = portfolio.get_position(pocket_from);
    if position_from.is_empty() {
        return Err(inconsistent(
            &spinoff.uniqueid,
            format!("no position in pocket {pocket_from:?}"),
        ));
    }
    sort.unwrap_or(LotSort::Fifo).sort(&mut position_from);

    let spin_ratio = spinoff.numerator / spinoff.denominator;

    // cost_fraction is the fraction of original cost allocated to the
    // spinoff, with the balance staying on the source position.  Without
    // post-spin pricing no basis moves.
    let cost_fraction = match (spinoff.securityprice, spinoff.fromsecurityprice) {
        (Some(securityprice), Some(fromsecurityprice)) => {
            let spinoff_fmv = securityprice * spinoff.units;
            let spunoff_fmv = fromsecurityprice * spinoff.units / spin_ratio;
            let total_fmv = spinoff_fmv + spunoff_fmv;
            if total_fmv == Decimal::ZERO {
                Decimal::ZERO
            } else {
                spinoff_fmv / total_fmv
            }
        }
        _ => Decimal::ZERO,
    };

    // Take the basis from the source position
    let (lots_from, position_from) =
        part_basis(position_from, open_as_of(spinoff.datetime), cost_fraction)?;

    let open_units = units_of(&lots_from);
    if (open_units * spin_ratio - spinoff.units).abs() > UNITS_RESOLUTION {
        return Err(inconsistent(
            &spinoff.uniqueid,
            format!(
                "spinoff {} units of security {} for {} units of security {}: receiving {} units \
                 requires a position of {} units in FI account {} on {}, not {}",
                spinoff.numerator,
                spinoff.security,
                spinoff.denominator,
                spinoff.fromsecurity,
                spinoff.units,
                spinoff.units / spin_ratio,
                spinoff.fiaccount,
                spinoff.datetime,
                open_units
            ),
        ));
    }

    portfolio.set_position(pocket_from, position_from);

    let mut gains = Vec::new();
    for lot in lots_from {
        gains.extend(transfer_basis(
            portfolio,
            lot,
            transaction,
            spin_ratio,
            sort,
            None,
            true,
        )?);
    }
    Ok(gains)
}

/// Remove option units from the source pocket and roll their basis, plus the
/// strike payment, into the underlying.  The underlying's holding period
/// begins at exercise.
fn book_exercise(
    portfolio: &mut Portfolio,
    transaction: &Arc<Transaction>,
    exercise: &Exercise,
    sort: Option<LotSort>,
) -> Result<Vec<Gain>> {
    if exercise.units == Decimal::ZERO || exercise.fromunits == Decimal::ZERO {
        return Err(booking_invalid(
            &exercise.uniqueid,
            "units and fromunits must be nonzero",
        ));
    }

    let pocket_from = (exercise.fiaccount, exercise.fromsecurity);
    let position_from = portfolio.get_position(pocket_from);

    // Remove lots from the source position
    let (lots_taken, position_remaining) = part_units(
        position_from,
        open_as_of(exercise.datetime),
        Some(-exercise.fromunits),
    );

    let taken_units = units_of(&lots_taken);
    if (taken_units.abs() - exercise.fromunits.abs()).abs() > UNITS_RESOLUTION {
        return Err(inconsistent(
            &exercise.uniqueid,
            format!(
                "position in security {} covers {} units, not the {} being exercised",
                exercise.fromsecurity, taken_units, exercise.fromunits
            ),
        ));
    }

    portfolio.set_position(pocket_from, position_remaining);

    let multiplier = (exercise.units / exercise.fromunits).abs();
    let strike_price = (exercise.cash / exercise.units).abs();

    let mut gains = Vec::new();
    for lot in lots_taken {
        let extra_basis = lot.units * multiplier * strike_price;
        gains.extend(transfer_basis(
            portfolio,
            lot,
            transaction,
            multiplier,
            sort,
            Some(extra_basis),
            false,
        )?);
    }
    Ok(gains)
}

/// Apply cost basis removed from one position to new units of another.
///
/// Books a synthetic trade into the destination pocket, closing lots there as
/// needed.  `opentransaction` is carried over from the source lot when
/// `preserve_holding_period` is set, so the destination lot keeps the source
/// holding period.
///
/// `extra_basis` is a total money amount added to the basis transferred from
/// the source lot, e.g. payment of the strike price on options exercise.
fn transfer_basis(
    portfolio: &mut Portfolio,
    lot: Lot,
    transaction: &Arc<Transaction>,
    ratio: Decimal,
    sort: Option<LotSort>,
    extra_basis: Option<Decimal>,
    preserve_holding_period: bool,
) -> Result<Vec<Gain>> {
    let cost_basis = lot.price * lot.units + extra_basis.unwrap_or(Decimal::ZERO);

    let opentransaction = if preserve_holding_period {
        Arc::clone(&lot.opentransaction)
    } else {
        Arc::clone(transaction)
    };

    let fiaccount = transaction
        .fiaccount()
        .ok_or_else(|| booking_invalid(transaction.uniqueid(), "missing destination account"))?;
    let security = transaction
        .security()
        .ok_or_else(|| booking_invalid(transaction.uniqueid(), "missing destination security"))?;

    let trade = Trade {
        uniqueid: transaction.uniqueid().to_string(),
        datetime: transaction.datetime(),
        fiaccount,
        security,
        units: lot.units * ratio,
        currency: lot.currency,
        cash: -cost_basis,
        memo: transaction.memo().map(str::to_string),
        dtsettle: None,
    };
    let synthetic = Arc::new(Transaction::Trade(trade.clone()));
    book_trade(
        portfolio,
        &synthetic,
        trade,
        sort,
        Some(opentransaction),
        Some(Arc::clone(transaction)),
    )
}
