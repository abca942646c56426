//! Small helpers shared across capgains modules

use rust_decimal::{Decimal, RoundingStrategy};

/// Split items into (nonmatching, matching) according to a predicate,
/// preserving order within each half.
pub fn partition<T>(pred: impl Fn(&T) -> bool, items: Vec<T>) -> (Vec<T>, Vec<T>) {
    let mut nonmatching = Vec::new();
    let mut matching = Vec::new();
    for item in items {
        if pred(&item) {
            matching.push(item);
        } else {
            nonmatching.push(item);
        }
    }
    (nonmatching, matching)
}

/// Round half-up to `dp` decimal places.
pub fn round_decimal(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// True if every element equals the first (vacuously true for empty slices).
pub fn all_equal<T: PartialEq>(items: &[T]) -> bool {
    items.windows(2).all(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_partition() {
        let (evens, odds) = partition(|n: &i32| n % 2 == 1, (0..10).collect());
        assert_eq!(evens, vec![0, 2, 4, 6, 8]);
        assert_eq!(odds, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_partition_empty() {
        let (no, yes) = partition(|_: &i32| true, Vec::new());
        assert!(no.is_empty());
        assert!(yes.is_empty());
    }

    #[test]
    fn test_round_decimal_half_up() {
        assert_eq!(round_decimal(dec!(1.005), 2), dec!(1.01));
        assert_eq!(round_decimal(dec!(-1.005), 2), dec!(-1.01));
        assert_eq!(round_decimal(dec!(1.004), 2), dec!(1.00));
    }

    #[test]
    fn test_all_equal() {
        assert!(all_equal::<i32>(&[]));
        assert!(all_equal(&[1]));
        assert!(all_equal(&[1, 1, 1]));
        assert!(!all_equal(&[1, 2, 1]));
    }
}
