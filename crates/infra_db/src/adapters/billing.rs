//! PostgreSQL Billing Store Adapter
//!
//! Implements [`BillingStore`] on top of [`BillingRepository`].
//!
//! # Error Handling
//!
//! Database errors are translated to `PortError` variants:
//! - `DatabaseError::NotFound` -> `PortError::NotFound`
//! - connection and pool errors -> `PortError::Connection`
//! - everything else, including constraint violations -> `PortError::Internal`

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    ActorId, BillingId, BillingPeriod, DocumentId, DomainPort, HealthCheckResult,
    HealthCheckable, Money, PortError, StatusId,
};
use domain_billing::ports::BillingStore;
use domain_billing::{Billing, BillingBatch};

use crate::error::{db_to_port_error, DatabaseError};
use crate::repositories::{BillingRepository, BillingRow};

const ADAPTER_ID: &str = "postgres-billing-store";

/// PostgreSQL-backed implementation of the BillingStore port
#[derive(Debug, Clone)]
pub struct PostgresBillingStore {
    repository: BillingRepository,
    pool: PgPool,
}

impl PostgresBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillingRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BillingRepository {
        &self.repository
    }
}

impl DomainPort for PostgresBillingStore {}

#[async_trait]
impl HealthCheckable for PostgresBillingStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(ADAPTER_ID, latency_ms, format!("Database error: {e}")),
        }
    }
}

#[async_trait]
impl BillingStore for PostgresBillingStore {
    #[instrument(skip(self, batch), fields(count = batch.len()))]
    async fn persist_batch(&self, batch: BillingBatch) -> Result<Vec<BillingId>, PortError> {
        debug!("Persisting billing batch");

        self.repository
            .insert_batch(batch)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn billings_by_ids(&self, ids: &[BillingId]) -> Result<Vec<Billing>, PortError> {
        debug!("Fetching billings by id");

        let raw: Vec<i64> = ids.iter().map(BillingId::value).collect();
        let rows = self
            .repository
            .find_by_ids(&raw)
            .await
            .map_err(db_to_port_error)?;

        rows.into_iter()
            .map(row_to_billing)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, ids), fields(count = ids.len(), paid_status = %paid_status))]
    async fn mark_paid(&self, ids: &[BillingId], paid_status: StatusId) -> Result<Vec<u64>, PortError> {
        debug!("Marking billings paid");

        let raw: Vec<i64> = ids.iter().map(BillingId::value).collect();
        self.repository
            .set_status(&raw, paid_status)
            .await
            .map_err(db_to_port_error)
    }
}

/// Converts a stored billing row to the domain model
fn row_to_billing(row: BillingRow) -> Result<Billing, DatabaseError> {
    let month = u32::try_from(row.month)
        .map_err(|_| DatabaseError::InvalidData(format!("billing {} has month {}", row.id, row.month)))?;
    let period = BillingPeriod::new(month, row.year)
        .map_err(|e| DatabaseError::InvalidData(format!("billing {}: {}", row.id, e)))?;

    Ok(Billing {
        id: BillingId::new(row.id),
        document_id: row.document_id.map(DocumentId::from_string),
        name: row.name,
        note: row.note,
        period,
        amount: Money::new(row.amount),
        created_at: row.created_at,
        updated_at: row.updated_at,
        published_at: row.published_at,
        created_by: row.created_by_id.map(ActorId::new),
        updated_by: row.updated_by_id.map(ActorId::new),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(month: i32, year: i32) -> BillingRow {
        BillingRow {
            id: 12,
            document_id: Some("monthly-abc".to_string()),
            name: "IPL".to_string(),
            note: None,
            month,
            year,
            amount: 150_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            published_at: None,
            created_by_id: Some(3),
            updated_by_id: None,
        }
    }

    #[test]
    fn test_row_to_billing_maps_columns() {
        let billing = row_to_billing(row(5, 2025)).unwrap();

        assert_eq!(billing.id, BillingId::new(12));
        assert_eq!(billing.period.to_string(), "05/2025");
        assert_eq!(billing.amount, Money::new(150_000));
        assert_eq!(billing.created_by, Some(ActorId::new(3)));
        assert_eq!(billing.document_id.as_ref().map(DocumentId::as_str), Some("monthly-abc"));
    }

    #[test]
    fn test_row_to_billing_rejects_bad_month() {
        assert!(matches!(row_to_billing(row(0, 2025)), Err(DatabaseError::InvalidData(_))));
        assert!(matches!(row_to_billing(row(-1, 2025)), Err(DatabaseError::InvalidData(_))));
    }
}
