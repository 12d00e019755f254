//! Reference data repository
//!
//! Read access to billing definitions, billing statuses, and the payment
//! pricing configuration. These rows are maintained by the estate's admin
//! tooling; billing only reads them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::error::DatabaseError;

/// A billing definition row
#[derive(Debug, Clone, FromRow)]
pub struct DefinitionRow {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub unit_amount: Decimal,
    pub note: Option<String>,
    pub is_active: bool,
    pub published_at: Option<DateTime<Utc>>,
}

/// A payment pricing configuration row
#[derive(Debug, Clone, FromRow)]
pub struct PricingConfigRow {
    pub id: i64,
    pub payment_fee: i64,
    pub is_fixed_fee: bool,
    pub min_month_discount: Option<i32>,
    pub max_fee: Option<i64>,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_phone: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Repository for definitions, statuses, and pricing configurations
#[derive(Debug, Clone)]
pub struct ReferenceRepository {
    pool: PgPool,
}

impl ReferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active, published definitions of the given kind, oldest first
    pub async fn active_definitions(&self, kind: &str) -> Result<Vec<DefinitionRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, DefinitionRow>(
            r#"
            SELECT id, name, kind, unit_amount, note, is_active, published_at
            FROM billing_definitions
            WHERE kind = $1
              AND is_active = TRUE
              AND published_at IS NOT NULL
            ORDER BY id
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// A single definition regardless of state
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no definition has this id
    pub async fn definition(&self, id: i64) -> Result<DefinitionRow, DatabaseError> {
        sqlx::query_as::<_, DefinitionRow>(
            r#"
            SELECT id, name, kind, unit_amount, note, is_active, published_at
            FROM billing_definitions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("BillingDefinition", id))
    }

    /// The first published status with exactly this name
    pub async fn status_id_by_name(&self, name: &str) -> Result<Option<i64>, DatabaseError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM billing_statuses
            WHERE status_name = $1 AND published_at IS NOT NULL
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// The first published status of any name
    pub async fn first_published_status_id(&self) -> Result<Option<i64>, DatabaseError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM billing_statuses
            WHERE published_at IS NOT NULL
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// The most recently created published pricing configuration
    pub async fn latest_pricing_config(&self) -> Result<Option<PricingConfigRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PricingConfigRow>(
            r#"
            SELECT id, payment_fee, is_fixed_fee, min_month_discount, max_fee,
                   admin_name, admin_email, admin_phone, published_at
            FROM payment_pricing_configs
            WHERE published_at IS NOT NULL
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
