//! PostgreSQL Resident Directory Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{BillingPeriod, DomainPort, PortError, ResidentId};
use domain_billing::ports::ResidentDirectory;
use domain_billing::Resident;

use crate::error::db_to_port_error;
use crate::repositories::{ResidentRepository, ResidentRow};

/// PostgreSQL-backed implementation of the ResidentDirectory port
#[derive(Debug, Clone)]
pub struct PostgresResidentDirectory {
    repository: ResidentRepository,
}

impl PostgresResidentDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ResidentRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresResidentDirectory {}

#[async_trait]
impl ResidentDirectory for PostgresResidentDirectory {
    #[instrument(skip(self))]
    async fn residents_with_role(&self, role: &str) -> Result<Vec<Resident>, PortError> {
        debug!("Fetching residents by role");

        let rows = self.repository.with_role(role).await.map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_resident).collect())
    }

    #[instrument(skip(self), fields(period = %period))]
    async fn residents_with_role_unbilled(
        &self,
        role: &str,
        period: BillingPeriod,
    ) -> Result<Vec<Resident>, PortError> {
        debug!("Fetching residents without a billing for the period");

        let rows = self
            .repository
            .with_role_unbilled(role, period.month() as i32, period.year())
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_resident).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn residents_by_ids(&self, ids: &[ResidentId]) -> Result<Vec<Resident>, PortError> {
        debug!("Fetching residents by id");

        let raw: Vec<i64> = ids.iter().map(ResidentId::value).collect();
        let rows = self
            .repository
            .with_profile_by_ids(&raw)
            .await
            .map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(row_to_resident).collect())
    }
}

fn row_to_resident(row: ResidentRow) -> Resident {
    Resident {
        id: ResidentId::new(row.id),
        username: row.username,
        email: row.email,
        full_name: row.full_name,
        phone: row.phone,
    }
}
