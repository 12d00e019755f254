//! Billing repository implementation
//!
//! Database access for billings and their resident, status, and category
//! link rows.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use tracing::debug;

use core_kernel::{BillingId, StatusId};
use domain_billing::{BillingBatch, LinkRow};

use crate::error::DatabaseError;

/// Rows per INSERT statement when writing a batch
pub const INSERT_CHUNK_SIZE: usize = 100;

/// A persisted billing row
#[derive(Debug, Clone, FromRow)]
pub struct BillingRow {
    pub id: i64,
    pub document_id: Option<String>,
    pub name: String,
    pub note: Option<String>,
    pub month: i32,
    pub year: i32,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by_id: Option<i64>,
    pub updated_by_id: Option<i64>,
}

/// Repository for billings and their link tables
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    /// Creates a new BillingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Writes a batch of billings and all of their links in one transaction
    ///
    /// Billings are inserted in chunks of [`INSERT_CHUNK_SIZE`]. The ids
    /// generated for each chunk are matched back to the billings through
    /// their document ids, backfilled into the link rows, and then the
    /// three link sets are inserted in chunks as well.
    ///
    /// # Returns
    ///
    /// The generated ids, index-aligned with `batch.billings`
    ///
    /// # Errors
    ///
    /// Any failure rolls the whole transaction back; nothing from the batch
    /// is left behind.
    pub async fn insert_batch(&self, mut batch: BillingBatch) -> Result<Vec<BillingId>, DatabaseError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(batch.len());

        for chunk in batch.billings.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO billings (document_id, name, note, month, year, amount, \
                 created_at, updated_at, published_at, created_by_id, updated_by_id) ",
            );
            builder.push_values(chunk, |mut row, billing| {
                row.push_bind(billing.document_id.to_string())
                    .push_bind(billing.name.clone())
                    .push_bind(billing.note.clone())
                    .push_bind(billing.period.month() as i32)
                    .push_bind(billing.period.year())
                    .push_bind(billing.amount.amount())
                    .push_bind(billing.created_at)
                    .push_bind(billing.created_at)
                    .push_bind(billing.published_at)
                    .push_bind(billing.created_by.value())
                    .push_bind(billing.updated_by.value());
            });
            builder.push(" RETURNING id, document_id");

            let returned: Vec<(i64, Option<String>)> = builder
                .build_query_as()
                .fetch_all(&mut *tx)
                .await?;

            let by_document: HashMap<String, i64> = returned
                .into_iter()
                .filter_map(|(id, document_id)| document_id.map(|d| (d, id)))
                .collect();

            for billing in chunk {
                let id = by_document.get(billing.document_id.as_str()).ok_or_else(|| {
                    DatabaseError::TransactionFailed(format!(
                        "no id returned for billing {}",
                        billing.document_id
                    ))
                })?;
                ids.push(BillingId::new(*id));
            }
        }

        batch
            .attach_ids(&ids)
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        insert_links(&mut tx, "billing_resident_links", "resident_id", &batch.resident_links).await?;
        insert_links(&mut tx, "billing_status_links", "status_id", &batch.status_links).await?;
        insert_links(&mut tx, "billing_category_links", "category_id", &batch.category_links).await?;

        tx.commit().await?;
        debug!(count = ids.len(), "Billing batch committed");
        Ok(ids)
    }

    /// Fetches the billings among `ids` that exist
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<BillingRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BillingRow>(
            r#"
            SELECT id, document_id, name, note, month, year, amount,
                   created_at, updated_at, published_at, created_by_id, updated_by_id
            FROM billings
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Points the status link of each billing at `status`
    ///
    /// Runs one UPDATE per id inside a single transaction. Billings without a
    /// status link report zero rows.
    ///
    /// # Returns
    ///
    /// Rows affected per id, index-aligned with `ids`
    pub async fn set_status(&self, ids: &[i64], status: StatusId) -> Result<Vec<u64>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut touched = Vec::with_capacity(ids.len());

        for id in ids {
            let result = sqlx::query(
                r#"
                UPDATE billing_status_links
                SET status_id = $1
                WHERE billing_id = $2
                "#,
            )
            .bind(status.value())
            .bind(id)
            .execute(&mut *tx)
            .await?;

            touched.push(result.rows_affected());
        }

        tx.commit().await?;
        Ok(touched)
    }

    /// Returns the status currently linked to a billing
    pub async fn status_of(&self, id: i64) -> Result<Option<i64>, DatabaseError> {
        let status = sqlx::query_scalar::<_, i64>(
            "SELECT status_id FROM billing_status_links WHERE billing_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    /// Counts all billings
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM billings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Inserts one link set in chunks
///
/// `table` and `column` are fixed identifiers chosen by this module, never
/// caller input.
async fn insert_links<T>(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    column: &str,
    links: &[LinkRow<T>],
) -> Result<(), DatabaseError>
where
    T: Copy + Into<i64>,
{
    for chunk in links.chunks(INSERT_CHUNK_SIZE) {
        let rows = chunk
            .iter()
            .map(|link| {
                link.billing_id
                    .map(|billing_id| (billing_id.value(), link.target.into()))
                    .ok_or_else(|| {
                        DatabaseError::TransactionFailed(format!("{table} row without a billing id"))
                    })
            })
            .collect::<Result<Vec<(i64, i64)>, _>>()?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {table} (billing_id, {column}) "));
        builder.push_values(rows, |mut row, (billing_id, target)| {
            row.push_bind(billing_id).push_bind(target);
        });
        builder.build().execute(&mut **tx).await?;
    }
    Ok(())
}
