//! Tests for admin fee pricing

use chrono::Utc;
use proptest::prelude::*;

use core_kernel::{BillingPeriod, Money, PricingConfigId};
use domain_billing::{admin_fee, PayerContact, PaymentPricingConfig, DEFAULT_DISCOUNT_THRESHOLD};
use test_utils::{fee_strategy, periods_strategy, pricing_config_strategy};

fn config(base: i64, fixed: bool, threshold: Option<u32>, cap: Option<i64>) -> PaymentPricingConfig {
    PaymentPricingConfig {
        id: PricingConfigId::new(1),
        base_fee: Money::new(base),
        fixed_fee: fixed,
        discount_threshold: threshold,
        capped_fee: cap.map(Money::new),
        admin_contact: PayerContact::default(),
        published_at: Some(Utc::now()),
    }
}

fn months(year: i32, count: u32) -> Vec<BillingPeriod> {
    (1..=count).map(|m| BillingPeriod::new(m, year).unwrap()).collect()
}

// ============================================================================
// Tiers
// ============================================================================

mod tier_tests {
    use super::*;

    #[test]
    fn test_below_threshold_charges_per_month() {
        let cfg = config(20000, false, Some(6), Some(20000));
        assert_eq!(admin_fee(months(2025, 3), Some(&cfg)), Money::new(60000));
    }

    #[test]
    fn test_at_threshold_charges_cap() {
        let cfg = config(20000, false, Some(6), Some(20000));
        assert_eq!(admin_fee(months(2025, 6), Some(&cfg)), Money::new(20000));
    }

    #[test]
    fn test_above_threshold_charges_cap() {
        let cfg = config(20000, false, Some(6), Some(20000));
        assert_eq!(admin_fee(months(2025, 8), Some(&cfg)), Money::new(20000));
    }

    #[test]
    fn test_above_threshold_without_cap_charges_per_month() {
        let cfg = config(5000, false, Some(6), None);
        assert_eq!(admin_fee(months(2025, 8), Some(&cfg)), Money::new(40000));
    }

    #[test]
    fn test_fixed_fee_ignores_month_count() {
        let cfg = config(7500, true, Some(6), Some(1000));
        assert_eq!(admin_fee(months(2025, 1), Some(&cfg)), Money::new(7500));
        assert_eq!(admin_fee(months(2025, 12), Some(&cfg)), Money::new(7500));
    }

    #[test]
    fn test_default_threshold_applies_when_unset() {
        let cfg = config(1000, false, None, Some(2500));
        let below = months(2025, DEFAULT_DISCOUNT_THRESHOLD - 1);
        assert_eq!(admin_fee(below, Some(&cfg)), Money::new(5000));
        assert_eq!(admin_fee(months(2025, DEFAULT_DISCOUNT_THRESHOLD), Some(&cfg)), Money::new(2500));
    }
}

// ============================================================================
// Period collapsing and edge cases
// ============================================================================

mod period_tests {
    use super::*;

    #[test]
    fn test_same_month_counts_once() {
        let cfg = config(20000, false, Some(6), None);
        let jan = BillingPeriod::new(1, 2025).unwrap();
        assert_eq!(admin_fee(vec![jan, jan, jan], Some(&cfg)), Money::new(20000));
    }

    #[test]
    fn test_same_month_different_year_counts_twice() {
        let cfg = config(20000, false, Some(6), None);
        let periods = vec![BillingPeriod::new(1, 2024).unwrap(), BillingPeriod::new(1, 2025).unwrap()];
        assert_eq!(admin_fee(periods, Some(&cfg)), Money::new(40000));
    }

    #[test]
    fn test_absent_config_is_zero() {
        assert_eq!(admin_fee(months(2025, 4), None), Money::ZERO);
    }

    #[test]
    fn test_no_periods_is_zero_unless_fixed() {
        assert_eq!(admin_fee(Vec::new(), Some(&config(20000, false, None, None))), Money::ZERO);
        assert_eq!(admin_fee(Vec::new(), Some(&config(20000, true, None, None))), Money::new(20000));
    }
}

proptest! {
    #[test]
    fn prop_below_threshold_is_n_times_base(
        base in 0i64..1_000_000,
        threshold in 2u32..13,
        n_seed in 0u32..12,
    ) {
        let n = n_seed % threshold;
        let cfg = config(base, false, Some(threshold), Some(1));
        let periods = (0..n).map(|i| BillingPeriod::new(i % 12 + 1, 2020 + (i / 12) as i32).unwrap());
        prop_assert_eq!(admin_fee(periods, Some(&cfg)), Money::new(base * i64::from(n)));
    }

    #[test]
    fn prop_at_or_above_threshold_with_cap_is_cap(
        base in 0i64..1_000_000,
        cap in 0i64..1_000_000,
        threshold in 1u32..13,
        extra in 0u32..24,
    ) {
        let n = threshold + extra;
        let cfg = config(base, false, Some(threshold), Some(cap));
        let periods = (0..n).map(|i| BillingPeriod::new(i % 12 + 1, 2020 + (i / 12) as i32).unwrap());
        prop_assert_eq!(admin_fee(periods, Some(&cfg)), Money::new(cap));
    }

    #[test]
    fn prop_fee_is_never_negative(
        base in -1_000_000i64..1_000_000,
        cap in prop::option::of(-1_000_000i64..1_000_000),
        fixed in any::<bool>(),
        n in 0u32..24,
    ) {
        let cfg = config(base, fixed, None, cap);
        let periods = (0..n).map(|i| BillingPeriod::new(i % 12 + 1, 2020 + (i / 12) as i32).unwrap());
        prop_assert!(!admin_fee(periods, Some(&cfg)).is_negative());
    }

    #[test]
    fn prop_repeated_and_reordered_periods_do_not_change_fee(
        periods in periods_strategy(12),
        cfg in pricing_config_strategy(),
    ) {
        let once = admin_fee(periods.clone(), Some(&cfg));

        let mut doubled = periods.clone();
        doubled.extend(periods.iter().rev().copied());
        prop_assert_eq!(admin_fee(doubled, Some(&cfg)), once);
    }

    #[test]
    fn prop_fixed_fee_ignores_periods(
        periods in periods_strategy(24),
        base in fee_strategy(),
    ) {
        let mut cfg = config(0, true, None, None);
        cfg.base_fee = base;
        prop_assert_eq!(admin_fee(periods, Some(&cfg)), base);
    }
}
