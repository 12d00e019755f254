//! Admin fee pricing
//!
//! A payment transaction covering several billings pays a single service fee
//! on top of the billed amounts. The fee depends only on how many distinct
//! months are being settled:
//!
//! - fixed-fee configurations charge the base fee once
//! - below the discount threshold, the base fee is charged per month
//! - at or above the threshold, the capped fee applies (or per-month pricing
//!   when no cap is configured)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use core_kernel::{BillingPeriod, Money, PricingConfigId};

/// Month count at which tiered pricing starts when none is configured
pub const DEFAULT_DISCOUNT_THRESHOLD: u32 = 6;

/// Contact shown to the payment provider as the payer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PayerContact {
    /// Fills every missing field from `fallback`
    pub fn or(self, fallback: &PayerContact) -> PayerContact {
        PayerContact {
            name: self.name.or_else(|| fallback.name.clone()),
            email: self.email.or_else(|| fallback.email.clone()),
            phone: self.phone.or_else(|| fallback.phone.clone()),
        }
    }
}

/// The most recently published pricing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPricingConfig {
    pub id: PricingConfigId,
    /// Fee per billed month
    pub base_fee: Money,
    /// Charge `base_fee` once regardless of month count
    pub fixed_fee: bool,
    /// Month count from which the capped fee applies
    pub discount_threshold: Option<u32>,
    /// Fee charged once the threshold is reached
    pub capped_fee: Option<Money>,
    /// Payer shown on provider invoices
    pub admin_contact: PayerContact,
    pub published_at: Option<DateTime<Utc>>,
}

impl PaymentPricingConfig {
    /// Threshold in effect; unset or non-positive values use the default
    pub fn effective_threshold(&self) -> u32 {
        match self.discount_threshold {
            Some(threshold) if threshold > 0 => threshold,
            _ => DEFAULT_DISCOUNT_THRESHOLD,
        }
    }

    /// Fee for settling `months` distinct periods in one transaction
    pub fn fee_for_months(&self, months: usize) -> Money {
        let months = months as u64;
        let fee = if self.fixed_fee {
            self.base_fee
        } else if months < u64::from(self.effective_threshold()) {
            self.base_fee.times(months)
        } else {
            self.capped_fee.unwrap_or_else(|| self.base_fee.times(months))
        };
        fee.clamp_non_negative()
    }
}

/// Computes the admin fee for the periods of the billings being paid
///
/// Periods are collapsed to distinct (month, year) pairs first, so paying two
/// billings from the same month counts as one month. An absent configuration
/// yields no fee.
pub fn admin_fee<I>(periods: I, config: Option<&PaymentPricingConfig>) -> Money
where
    I: IntoIterator<Item = BillingPeriod>,
{
    let Some(config) = config else {
        return Money::ZERO;
    };

    let distinct: BTreeSet<BillingPeriod> = periods.into_iter().collect();
    config.fee_for_months(distinct.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: i64, fixed: bool, threshold: Option<u32>, cap: Option<i64>) -> PaymentPricingConfig {
        PaymentPricingConfig {
            id: PricingConfigId::new(1),
            base_fee: Money::new(base),
            fixed_fee: fixed,
            discount_threshold: threshold,
            capped_fee: cap.map(Money::new),
            admin_contact: PayerContact::default(),
            published_at: None,
        }
    }

    #[test]
    fn test_zero_threshold_uses_default() {
        let cfg = config(1000, false, Some(0), Some(3000));
        assert_eq!(cfg.effective_threshold(), DEFAULT_DISCOUNT_THRESHOLD);
        assert_eq!(cfg.fee_for_months(5), Money::new(5000));
        assert_eq!(cfg.fee_for_months(6), Money::new(3000));
    }

    #[test]
    fn test_negative_base_fee_is_clamped() {
        let cfg = config(-1000, false, None, None);
        assert_eq!(cfg.fee_for_months(2), Money::ZERO);
    }

    #[test]
    fn test_payer_contact_fallback() {
        let primary = PayerContact {
            name: Some("Pengelola".into()),
            email: None,
            phone: None,
        };
        let fallback = PayerContact {
            name: Some("Admin".into()),
            email: Some("admin@example.com".into()),
            phone: Some("0800".into()),
        };
        let merged = primary.or(&fallback);
        assert_eq!(merged.name.as_deref(), Some("Pengelola"));
        assert_eq!(merged.email.as_deref(), Some("admin@example.com"));
        assert_eq!(merged.phone.as_deref(), Some("0800"));
    }
}
