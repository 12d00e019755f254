//! Pre-built Test Fixtures
//!
//! Ready-to-use data for the billing domain. Values are fixed so assertions
//! can compare against literals.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{
    ActorId, BillingPeriod, CategoryId, DefinitionId, Money, PricingConfigId, ResidentId, StatusId,
};
use domain_billing::{
    BillingDefaults, BillingDefinition, DefinitionKind, PayerContact, PaymentPricingConfig, Resident,
};

/// Fixture for billing periods
pub struct PeriodFixtures;

impl PeriodFixtures {
    pub fn may_2025() -> BillingPeriod {
        BillingPeriod::new(5, 2025).expect("valid period")
    }

    pub fn june_2025() -> BillingPeriod {
        BillingPeriod::new(6, 2025).expect("valid period")
    }

    /// Six consecutive months, January to June 2025
    pub fn first_half_2025() -> Vec<BillingPeriod> {
        (1..=6)
            .map(|month| BillingPeriod::new(month, 2025).expect("valid period"))
            .collect()
    }
}

/// Fixture for timestamps
pub struct TimeFixtures;

impl TimeFixtures {
    /// 2025-05-01 00:00 in Jakarta, which is still April in UTC
    pub fn monthly_run() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 30, 17, 0, 0).unwrap()
    }

    pub fn mid_may() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 15, 3, 0, 0).unwrap()
    }
}

/// Fixture for reference rows resolved at startup
pub struct DefaultsFixtures;

impl DefaultsFixtures {
    pub const UNPAID: StatusId = StatusId::new(1);
    pub const PAID: StatusId = StatusId::new(2);
    pub const CATEGORY: CategoryId = CategoryId::new(1);
    pub const SYSTEM_ACTOR: ActorId = ActorId::new(1);

    pub fn defaults() -> BillingDefaults {
        BillingDefaults {
            unpaid_status: Self::UNPAID,
            paid_status: Self::PAID,
            default_category: Self::CATEGORY,
        }
    }

    /// Status rows as a status directory would list them
    pub fn statuses() -> Vec<(StatusId, &'static str)> {
        vec![(Self::UNPAID, "Belum Dibayar"), (Self::PAID, "Sudah Dibayar")]
    }
}

/// Fixture for residents
pub struct ResidentFixtures;

impl ResidentFixtures {
    pub fn budi() -> Resident {
        Resident {
            id: ResidentId::new(11),
            username: "budi".to_string(),
            email: Some("budi@estate.test".to_string()),
            full_name: Some("Budi Santoso".to_string()),
            phone: Some("081211112222".to_string()),
        }
    }

    pub fn sari() -> Resident {
        Resident {
            id: ResidentId::new(12),
            username: "sari".to_string(),
            email: Some("sari@estate.test".to_string()),
            full_name: Some("Sari Wulandari".to_string()),
            phone: None,
        }
    }
}

/// Fixture for billing definitions
pub struct DefinitionFixtures;

impl DefinitionFixtures {
    /// Monthly IPL dues of IDR 150,000
    pub fn monthly_ipl() -> BillingDefinition {
        BillingDefinition {
            id: DefinitionId::new(1),
            name: "Iuran IPL".to_string(),
            kind: DefinitionKind::Monthly,
            unit_amount: dec!(150000),
            note: Some("Keamanan dan kebersihan".to_string()),
            is_active: true,
            published_at: Some(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()),
        }
    }

    /// Monthly waste collection fee of IDR 25,000
    pub fn monthly_waste() -> BillingDefinition {
        BillingDefinition {
            id: DefinitionId::new(2),
            name: "Iuran Sampah".to_string(),
            unit_amount: dec!(25000),
            note: None,
            ..Self::monthly_ipl()
        }
    }

    /// One-off road repair levy
    pub fn custom_road_repair() -> BillingDefinition {
        BillingDefinition {
            id: DefinitionId::new(3),
            name: "Perbaikan Jalan".to_string(),
            kind: DefinitionKind::Custom,
            unit_amount: dec!(500000),
            note: None,
            ..Self::monthly_ipl()
        }
    }
}

/// Fixture for payment pricing configurations
pub struct PricingFixtures;

impl PricingFixtures {
    pub fn admin_contact() -> PayerContact {
        PayerContact {
            name: Some("Pengurus Perumahan".to_string()),
            email: Some("admin@estate.test".to_string()),
            phone: Some("0210000000".to_string()),
        }
    }

    /// IDR 2,500 per month, capped at IDR 10,000 from six months
    pub fn tiered() -> PaymentPricingConfig {
        PaymentPricingConfig {
            id: PricingConfigId::new(1),
            base_fee: Money::new(2_500),
            fixed_fee: false,
            discount_threshold: Some(6),
            capped_fee: Some(Money::new(10_000)),
            admin_contact: Self::admin_contact(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()),
        }
    }

    /// IDR 4,000 per transaction regardless of month count
    pub fn fixed() -> PaymentPricingConfig {
        PaymentPricingConfig {
            base_fee: Money::new(4_000),
            fixed_fee: true,
            capped_fee: None,
            ..Self::tiered()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_run_falls_in_may_locally() {
        let period = BillingPeriod::containing(TimeFixtures::monthly_run(), Default::default());
        assert_eq!(period, PeriodFixtures::may_2025());
    }

    #[test]
    fn test_definition_fixtures_are_published() {
        assert!(DefinitionFixtures::monthly_ipl().is_published());
        assert_eq!(DefinitionFixtures::custom_road_repair().kind, DefinitionKind::Custom);
    }
}
