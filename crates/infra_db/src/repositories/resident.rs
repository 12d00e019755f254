//! Resident repository implementation
//!
//! Residents are user accounts holding an estate role. Profile columns are
//! joined in so payment links can show a name and phone number.

use sqlx::{FromRow, PgPool};

use crate::error::DatabaseError;

/// A resident with its optional profile columns
#[derive(Debug, Clone, FromRow)]
pub struct ResidentRow {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Repository for residents and their roles
#[derive(Debug, Clone)]
pub struct ResidentRepository {
    pool: PgPool,
}

impl ResidentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All unblocked residents holding the role type
    pub async fn with_role(&self, role: &str) -> Result<Vec<ResidentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ResidentRow>(
            r#"
            SELECT r.id, r.username, r.email, p.full_name, p.phone
            FROM residents r
            JOIN resident_roles rr ON rr.resident_id = r.id
            JOIN roles ro ON ro.id = rr.role_id
            LEFT JOIN resident_profiles p ON p.resident_id = r.id
            WHERE ro.type = $1
              AND r.blocked = FALSE
            ORDER BY r.id
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Residents holding the role with no billing for the given month yet
    pub async fn with_role_unbilled(
        &self,
        role: &str,
        month: i32,
        year: i32,
    ) -> Result<Vec<ResidentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ResidentRow>(
            r#"
            SELECT r.id, r.username, r.email, p.full_name, p.phone
            FROM residents r
            JOIN resident_roles rr ON rr.resident_id = r.id
            JOIN roles ro ON ro.id = rr.role_id
            LEFT JOIN resident_profiles p ON p.resident_id = r.id
            WHERE ro.type = $1
              AND r.blocked = FALSE
              AND NOT EXISTS (
                  SELECT 1
                  FROM billing_resident_links l
                  JOIN billings b ON b.id = l.billing_id
                  WHERE l.resident_id = r.id
                    AND b.month = $2
                    AND b.year = $3
              )
            ORDER BY r.id
            "#,
        )
        .bind(role)
        .bind(month)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Residents among `ids` that have a profile
    pub async fn with_profile_by_ids(&self, ids: &[i64]) -> Result<Vec<ResidentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ResidentRow>(
            r#"
            SELECT r.id, r.username, r.email, p.full_name, p.phone
            FROM residents r
            JOIN resident_profiles p ON p.resident_id = r.id
            WHERE r.id = ANY($1)
            ORDER BY r.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
