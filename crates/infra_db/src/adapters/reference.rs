//! PostgreSQL Reference Data Adapter
//!
//! One adapter serves the three read-only reference ports: billing
//! definitions, billing statuses, and the payment pricing configuration.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DefinitionId, DomainPort, Money, PortError, PricingConfigId, StatusId};
use domain_billing::ports::{DefinitionRepository, PricingConfigRepository, StatusDirectory};
use domain_billing::{BillingDefinition, DefinitionKind, PayerContact, PaymentPricingConfig};

use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::{DefinitionRow, PricingConfigRow, ReferenceRepository};

/// PostgreSQL-backed reference data lookups
#[derive(Debug, Clone)]
pub struct PostgresReferenceData {
    repository: ReferenceRepository,
}

impl PostgresReferenceData {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ReferenceRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresReferenceData {}

#[async_trait]
impl DefinitionRepository for PostgresReferenceData {
    #[instrument(skip(self))]
    async fn active_monthly_definitions(&self) -> Result<Vec<BillingDefinition>, PortError> {
        debug!("Fetching active monthly definitions");

        let rows = self
            .repository
            .active_definitions(DefinitionKind::Monthly.as_str())
            .await
            .map_err(db_to_port_error)?;

        rows.into_iter()
            .map(row_to_definition)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self), fields(definition_id = %id))]
    async fn definition_by_id(&self, id: DefinitionId) -> Result<BillingDefinition, PortError> {
        debug!("Fetching definition by id");

        let row = self
            .repository
            .definition(id.value())
            .await
            .map_err(db_to_port_error)?;

        row_to_definition(row).map_err(db_to_port_error)
    }
}

#[async_trait]
impl StatusDirectory for PostgresReferenceData {
    #[instrument(skip(self))]
    async fn status_by_name(&self, name: &str) -> Result<Option<StatusId>, PortError> {
        let id = self
            .repository
            .status_id_by_name(name)
            .await
            .map_err(db_to_port_error)?;
        Ok(id.map(StatusId::new))
    }

    #[instrument(skip(self))]
    async fn first_published_status(&self) -> Result<Option<StatusId>, PortError> {
        let id = self
            .repository
            .first_published_status_id()
            .await
            .map_err(db_to_port_error)?;
        Ok(id.map(StatusId::new))
    }
}

#[async_trait]
impl PricingConfigRepository for PostgresReferenceData {
    #[instrument(skip(self))]
    async fn active_pricing_config(&self) -> Result<Option<PaymentPricingConfig>, PortError> {
        debug!("Fetching latest pricing configuration");

        let row = self
            .repository
            .latest_pricing_config()
            .await
            .map_err(db_to_port_error)?;

        Ok(row.map(row_to_pricing_config))
    }
}

fn row_to_definition(row: DefinitionRow) -> Result<BillingDefinition, DatabaseError> {
    let kind = row
        .kind
        .parse::<DefinitionKind>()
        .map_err(|e| DatabaseError::InvalidData(format!("definition {}: {}", row.id, e)))?;

    Ok(BillingDefinition {
        id: DefinitionId::new(row.id),
        name: row.name,
        kind,
        unit_amount: row.unit_amount,
        note: row.note,
        is_active: row.is_active,
        published_at: row.published_at,
    })
}

fn row_to_pricing_config(row: PricingConfigRow) -> PaymentPricingConfig {
    PaymentPricingConfig {
        id: PricingConfigId::new(row.id),
        base_fee: Money::new(row.payment_fee),
        fixed_fee: row.is_fixed_fee,
        // Negative thresholds fall back to the default like an unset one.
        discount_threshold: row.min_month_discount.and_then(|v| u32::try_from(v).ok()),
        capped_fee: row.max_fee.map(Money::new),
        admin_contact: PayerContact {
            name: row.admin_name,
            email: row.admin_email,
            phone: row.admin_phone,
        },
        published_at: row.published_at,
    }
}
