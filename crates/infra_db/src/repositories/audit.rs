//! Scheduler audit log repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::DatabaseError;

/// A scheduler log row
#[derive(Debug, Clone, FromRow)]
pub struct SchedulerLogRow {
    pub id: i64,
    pub document_id: String,
    pub scheduler_code: String,
    pub message: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub created_by_id: Option<i64>,
}

/// Data for a new scheduler log row
#[derive(Debug, Clone)]
pub struct NewSchedulerLog {
    pub document_id: String,
    pub scheduler_code: String,
    pub message: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub created_by_id: i64,
}

/// Append-only repository for scheduler runs
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends one row and returns its id
    pub async fn insert(&self, log: NewSchedulerLog) -> Result<i64, DatabaseError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO scheduler_logs (
                document_id, scheduler_code, message, state, created_at, created_by_id
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(log.document_id)
        .bind(log.scheduler_code)
        .bind(log.message)
        .bind(log.state)
        .bind(log.created_at)
        .bind(log.created_by_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// All rows of one run, in insertion order
    pub async fn for_document(&self, document_id: &str) -> Result<Vec<SchedulerLogRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, SchedulerLogRow>(
            r#"
            SELECT id, document_id, scheduler_code, message, state, created_at, created_by_id
            FROM scheduler_logs
            WHERE document_id = $1
            ORDER BY id
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
