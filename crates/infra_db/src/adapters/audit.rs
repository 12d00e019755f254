//! PostgreSQL Scheduler Audit Log Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, PortError};
use domain_billing::ports::AuditLog;
use domain_billing::AuditLogEntry;

use crate::error::db_to_port_error;
use crate::repositories::{AuditRepository, NewSchedulerLog};

/// Writes scheduler audit entries to `scheduler_logs`
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    repository: AuditRepository,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AuditRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &AuditRepository {
        &self.repository
    }
}

impl DomainPort for PostgresAuditLog {}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    #[instrument(skip(self, entry), fields(document_id = %entry.document_id, state = %entry.state))]
    async fn append(&self, entry: AuditLogEntry) -> Result<(), PortError> {
        let id = self
            .repository
            .insert(NewSchedulerLog {
                document_id: entry.document_id,
                scheduler_code: entry.scheduler_code,
                message: entry.message,
                state: entry.state.as_str().to_string(),
                created_at: entry.created_at,
                created_by_id: entry.actor.value(),
            })
            .await
            .map_err(db_to_port_error)?;

        debug!(log_id = id, "Scheduler log appended");
        Ok(())
    }
}
