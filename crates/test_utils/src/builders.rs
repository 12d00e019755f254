//! Test Data Builders
//!
//! Builders for billing domain values. Tests set only the fields they care
//! about; everything else comes from the fixtures or from `fake`.

use chrono::{DateTime, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rust_decimal::Decimal;

use core_kernel::{
    ActorId, BillingId, BillingPeriod, DefinitionId, DocumentId, Money, ResidentId,
};
use domain_billing::{Billing, BillingDefinition, DefinitionKind, PaymentPricingConfig, Resident};

use crate::fixtures::{DefinitionFixtures, PeriodFixtures, PricingFixtures, TimeFixtures};

/// Builder for residents with generated contact details
pub struct ResidentBuilder {
    id: ResidentId,
    username: Option<String>,
    with_profile: bool,
}

impl ResidentBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id: ResidentId::new(id),
            username: None,
            with_profile: true,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Leaves the name and phone empty, as for a resident without a profile
    pub fn without_profile(mut self) -> Self {
        self.with_profile = false;
        self
    }

    pub fn build(self) -> Resident {
        let username = self
            .username
            .unwrap_or_else(|| format!("resident{}", self.id));

        Resident {
            id: self.id,
            username,
            email: Some(SafeEmail().fake()),
            full_name: self.with_profile.then(|| Name().fake()),
            phone: self.with_profile.then(|| PhoneNumber().fake()),
        }
    }

    /// Builds `count` residents with consecutive ids starting at `first_id`
    pub fn many(first_id: i64, count: usize) -> Vec<Resident> {
        (0..count as i64)
            .map(|offset| ResidentBuilder::new(first_id + offset).build())
            .collect()
    }
}

/// Builder for billing definitions
pub struct BillingDefinitionBuilder {
    definition: BillingDefinition,
}

impl Default for BillingDefinitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingDefinitionBuilder {
    /// Starts from the monthly IPL fixture
    pub fn new() -> Self {
        Self {
            definition: DefinitionFixtures::monthly_ipl(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.definition.id = DefinitionId::new(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.definition.name = name.into();
        self
    }

    pub fn with_kind(mut self, kind: DefinitionKind) -> Self {
        self.definition.kind = kind;
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.definition.unit_amount = amount;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.definition.is_active = false;
        self
    }

    pub fn unpublished(mut self) -> Self {
        self.definition.published_at = None;
        self
    }

    pub fn build(self) -> BillingDefinition {
        self.definition
    }
}

/// Builder for pricing configurations
pub struct PricingConfigBuilder {
    config: PaymentPricingConfig,
}

impl Default for PricingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingConfigBuilder {
    /// Starts from the tiered pricing fixture
    pub fn new() -> Self {
        Self {
            config: PricingFixtures::tiered(),
        }
    }

    pub fn with_base_fee(mut self, fee: i64) -> Self {
        self.config.base_fee = Money::new(fee);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.config.fixed_fee = true;
        self
    }

    pub fn with_threshold(mut self, threshold: Option<u32>) -> Self {
        self.config.discount_threshold = threshold;
        self
    }

    pub fn with_capped_fee(mut self, fee: Option<i64>) -> Self {
        self.config.capped_fee = fee.map(Money::new);
        self
    }

    pub fn build(self) -> PaymentPricingConfig {
        self.config
    }
}

/// Builder for already persisted billings, used to seed in-memory stores
pub struct BillingBuilder {
    id: BillingId,
    name: String,
    period: BillingPeriod,
    amount: Money,
    document_id: Option<DocumentId>,
    created_at: DateTime<Utc>,
}

impl BillingBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id: BillingId::new(id),
            name: DefinitionFixtures::monthly_ipl().name,
            period: PeriodFixtures::may_2025(),
            amount: Money::new(150_000),
            document_id: Some(DocumentId::generate(DefinitionKind::Monthly.document_prefix())),
            created_at: TimeFixtures::monthly_run(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_period(mut self, period: BillingPeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Money::new(amount);
        self
    }

    /// Drops the document id, as on rows imported from older systems
    pub fn without_document_id(mut self) -> Self {
        self.document_id = None;
        self
    }

    pub fn build(self) -> Billing {
        Billing {
            id: self.id,
            document_id: self.document_id,
            name: self.name,
            note: None,
            period: self.period,
            amount: self.amount,
            created_at: self.created_at,
            updated_at: self.created_at,
            published_at: Some(self.created_at),
            created_by: Some(ActorId::new(1)),
            updated_by: Some(ActorId::new(1)),
        }
    }
}
