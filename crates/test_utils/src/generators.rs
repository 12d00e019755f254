//! Property-Based Test Generators
//!
//! Proptest strategies for billing domain values that respect the domain's
//! invariants.

use proptest::prelude::*;

use core_kernel::{BillingId, BillingPeriod, Money, PricingConfigId};
use domain_billing::{PayerContact, PaymentPricingConfig};

/// Strategy for valid billing periods between 2020 and 2100
pub fn period_strategy() -> impl Strategy<Value = BillingPeriod> {
    (1u32..=12u32, 2020i32..=2100i32)
        .prop_map(|(month, year)| BillingPeriod::new(month, year).expect("generated valid period"))
}

/// Strategy for lists of periods that may repeat
pub fn periods_strategy(max_len: usize) -> impl Strategy<Value = Vec<BillingPeriod>> {
    proptest::collection::vec(period_strategy(), 0..=max_len)
}

/// Strategy for non-negative fee amounts
pub fn fee_strategy() -> impl Strategy<Value = Money> {
    (0i64..1_000_000i64).prop_map(Money::new)
}

/// Strategy for positive billing ids
pub fn billing_id_strategy() -> impl Strategy<Value = BillingId> {
    (1i64..i64::MAX).prop_map(BillingId::new)
}

/// Strategy for non-empty billing id lists
pub fn billing_ids_strategy(max_len: usize) -> impl Strategy<Value = Vec<BillingId>> {
    proptest::collection::vec(billing_id_strategy(), 1..=max_len.max(1))
}

/// Strategy for pricing configurations of every shape
pub fn pricing_config_strategy() -> impl Strategy<Value = PaymentPricingConfig> {
    (
        fee_strategy(),
        any::<bool>(),
        proptest::option::of(0u32..24u32),
        proptest::option::of(fee_strategy()),
    )
        .prop_map(|(base_fee, fixed_fee, discount_threshold, capped_fee)| PaymentPricingConfig {
            id: PricingConfigId::new(1),
            base_fee,
            fixed_fee,
            discount_threshold,
            capped_fee,
            admin_contact: PayerContact::default(),
            published_at: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_periods_format_as_mm_yyyy(period in period_strategy()) {
            let text = period.to_string();
            prop_assert_eq!(text.len(), 7);
            prop_assert_eq!(&text[2..3], "/");
        }
    }
}
