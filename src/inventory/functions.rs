//! Partition functions operating on positions

use rust_decimal::Decimal;

use crate::error::{CapgainsError, Result};

use super::types::Lot;

/// Partition a position according to a predicate, up to a unit budget.
///
/// Takes lots matching `predicate` until `max_units` is filled, splitting the
/// marginal lot as necessary.  `max_units` uses the SAME sign convention as
/// the position (positive for long, negative for short); `None` takes every
/// matching lot.  The predicate must match only lots whose units are signed
/// like `max_units`.
///
/// The position must be presorted by the caller.
///
/// Returns (matching lots, nonmatching lots).
pub fn part_units(
    position: Vec<Lot>,
    predicate: impl Fn(&Lot) -> bool,
    max_units: Option<Decimal>,
) -> (Vec<Lot>, Vec<Lot>) {
    let mut taken = Vec::new();
    let mut left = Vec::new();
    let mut units_remain = max_units;

    for lot in position {
        // Failing the predicate trumps any consideration of max_units
        if !predicate(&lot) {
            left.push(lot);
            continue;
        }
        match units_remain {
            // No unit budget: take everything that matches
            None => taken.push(lot),
            // Budget already filled
            Some(remain) if remain == Decimal::ZERO => left.push(lot),
            Some(remain) => {
                debug_assert!(lot.units * remain > Decimal::ZERO);
                if lot.units / remain <= Decimal::ONE {
                    // Taking the whole lot won't exceed the budget
                    // (but might reach it)
                    units_remain = Some(remain - lot.units);
                    taken.push(lot);
                } else {
                    // The lot more than suffices: split it
                    taken.push(lot.with_units(remain));
                    left.push(lot.with_units(lot.units - remain));
                    units_remain = Some(Decimal::ZERO);
                }
            }
        }
    }

    (taken, left)
}

/// Remove a fraction of the cost from each matching Lot in a position.
///
/// Returns (copies of matching lots carrying the removed basis, original
/// position with that basis subtracted).  `fraction` must lie in [0, 1].
pub fn part_basis(
    position: Vec<Lot>,
    predicate: impl Fn(&Lot) -> bool,
    fraction: Decimal,
) -> Result<(Vec<Lot>, Vec<Lot>)> {
    if fraction < Decimal::ZERO || fraction > Decimal::ONE {
        return Err(CapgainsError::InvalidBasisFraction {
            fraction: fraction.to_string(),
        });
    }

    let mut taken = Vec::new();
    let mut left = Vec::new();
    for lot in position {
        if !predicate(&lot) {
            left.push(lot);
            continue;
        }
        let takenprice = lot.price * fraction;
        taken.push(lot.with_price(takenprice));
        left.push(lot.with_price(lot.price - takenprice));
    }
    Ok((taken, left))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::predicates::open_as_of;
    use crate::inventory::types::{Trade, Transaction};
    use crate::models::Currency;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn datetime(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 1, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid datetime")
    }

    fn lot(uniqueid: &str, day: u32, units: Decimal, price: Decimal) -> Lot {
        let tx = Arc::new(Transaction::Trade(Trade {
            uniqueid: uniqueid.to_string(),
            datetime: datetime(day),
            fiaccount: 1,
            security: 1,
            units,
            currency: Currency::USD,
            cash: -units * price,
            memo: None,
            dtsettle: None,
        }));
        Lot {
            opentransaction: Arc::clone(&tx),
            createtransaction: tx,
            units,
            price,
            currency: Currency::USD,
        }
    }

    fn units(lots: &[Lot]) -> Decimal {
        lots.iter().map(|l| l.units).sum()
    }

    #[test]
    fn test_part_units_empty_position() {
        let (taken, left) = part_units(Vec::new(), |_| true, Some(dec!(10)));
        assert!(taken.is_empty());
        assert!(left.is_empty());
    }

    #[test]
    fn test_part_units_no_budget_takes_all_matching() {
        let position = vec![lot("a", 1, dec!(10), dec!(1)), lot("b", 5, dec!(20), dec!(1))];
        let (taken, left) = part_units(position, open_as_of(datetime(1)), None);
        assert_eq!(units(&taken), dec!(10));
        assert_eq!(units(&left), dec!(20));
    }

    #[test]
    fn test_part_units_whole_lots() {
        let position = vec![lot("a", 1, dec!(10), dec!(1)), lot("b", 2, dec!(20), dec!(1))];
        let (taken, left) = part_units(position, |_| true, Some(dec!(30)));
        assert_eq!(taken.len(), 2);
        assert!(left.is_empty());
    }

    #[test]
    fn test_part_units_splits_marginal_lot() {
        let position = vec![lot("a", 1, dec!(10), dec!(1)), lot("b", 2, dec!(20), dec!(2))];
        let (taken, left) = part_units(position, |_| true, Some(dec!(15)));
        assert_eq!(units(&taken), dec!(15));
        assert_eq!(units(&left), dec!(15));
        // The split halves share price and opening transaction
        assert_eq!(taken[1].price, dec!(2));
        assert_eq!(left[0].price, dec!(2));
        assert_eq!(
            taken[1].opentransaction.uniqueid(),
            left[0].opentransaction.uniqueid()
        );
    }

    #[test]
    fn test_part_units_short_position() {
        let position = vec![lot("a", 1, dec!(-10), dec!(1)), lot("b", 2, dec!(-20), dec!(1))];
        let (taken, left) = part_units(position, |_| true, Some(dec!(-25)));
        assert_eq!(units(&taken), dec!(-25));
        assert_eq!(units(&left), dec!(-5));
    }

    #[test]
    fn test_part_units_predicate_filters() {
        // Lot "b" was created after the cutoff; budget can't touch it
        let position = vec![lot("a", 1, dec!(10), dec!(1)), lot("b", 5, dec!(20), dec!(1))];
        let (taken, left) = part_units(position, open_as_of(datetime(2)), Some(dec!(30)));
        assert_eq!(units(&taken), dec!(10));
        assert_eq!(units(&left), dec!(20));
    }

    #[test]
    fn test_part_basis_partitions_cost() {
        let position = vec![lot("a", 1, dec!(10), dec!(8))];
        let (taken, left) = part_basis(position, |_| true, dec!(0.25)).expect("valid fraction");
        assert_eq!(taken[0].price, dec!(2.00));
        assert_eq!(left[0].price, dec!(6.00));
        // Units are untouched; only basis moves
        assert_eq!(taken[0].units, dec!(10));
        assert_eq!(left[0].units, dec!(10));
    }

    #[test]
    fn test_part_basis_zero_fraction() {
        let position = vec![lot("a", 1, dec!(10), dec!(8))];
        let (taken, left) = part_basis(position, |_| true, Decimal::ZERO).expect("valid fraction");
        assert_eq!(taken[0].price, Decimal::ZERO);
        assert_eq!(left[0].price, dec!(8));
    }

    #[test]
    fn test_part_basis_rejects_bad_fraction() {
        assert!(part_basis(Vec::new(), |_| true, dec!(1.1)).is_err());
        assert!(part_basis(Vec::new(), |_| true, dec!(-0.1)).is_err());
    }

    #[test]
    fn test_part_basis_predicate_filters() {
        let position = vec![lot("a", 1, dec!(10), dec!(8)), lot("b", 5, dec!(10), dec!(8))];
        let (taken, left) =
            part_basis(position, open_as_of(datetime(2)), dec!(0.5)).expect("valid fraction");
        assert_eq!(taken.len(), 1);
        assert_eq!(left.len(), 2);
        assert_eq!(left[1].price, dec!(8));
    }
}
