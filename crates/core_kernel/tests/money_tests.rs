//! Tests for whole-unit money amounts

use core_kernel::{Money, MoneyError};
use proptest::prelude::*;
use rust_decimal_macros::dec;

mod conversion {
    use super::*;

    #[test]
    fn test_from_decimal_whole_amount() {
        assert_eq!(Money::from_decimal(dec!(250000)).unwrap(), Money::new(250000));
    }

    #[test]
    fn test_from_decimal_out_of_range() {
        let huge = rust_decimal::Decimal::MAX;
        assert_eq!(Money::from_decimal(huge), Err(MoneyError::Unrepresentable(huge)));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_overflow() {
        let result = Money::new(i64::MAX).checked_add(Money::new(1));
        assert_eq!(result, Err(MoneyError::Overflow));
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::new(-500).clamp_non_negative(), Money::ZERO);
        assert_eq!(Money::new(500).clamp_non_negative(), Money::new(500));
    }

    #[test]
    fn test_times_saturates() {
        assert_eq!(Money::new(i64::MAX).times(2), Money::new(i64::MAX));
        assert_eq!(Money::new(20000).times(0), Money::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(60000).to_string(), "IDR 60000");
    }

    #[test]
    fn test_serde_is_bare_integer() {
        let json = serde_json::to_string(&Money::new(75000)).unwrap();
        assert_eq!(json, "75000");
    }
}

proptest! {
    #[test]
    fn prop_sum_matches_integer_sum(amounts in prop::collection::vec(0i64..10_000_000, 0..50)) {
        let expected: i64 = amounts.iter().sum();
        let total: Money = amounts.into_iter().map(Money::new).sum();
        prop_assert_eq!(total.amount(), expected);
    }

    #[test]
    fn prop_times_is_repeated_addition(base in 0i64..1_000_000, count in 0u64..24) {
        let repeated: Money = (0..count).map(|_| Money::new(base)).sum();
        prop_assert_eq!(Money::new(base).times(count), repeated);
    }
}
