//! Database Test Utilities
//!
//! Provides a PostgreSQL testcontainer with the billing schema applied, plus
//! helpers that seed reference rows for integration tests.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use core_kernel::{CategoryId, DefinitionId, ResidentId, StatusId};
use domain_billing::{DefinitionKind, DEFAULT_RESIDENT_ROLE};

/// Default PostgreSQL image for testing
const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "estate_test";

type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    /// Creates the database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A wrapper around a PostgreSQL test container
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container with the schema applied
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or schema fails to initialize
    pub async fn new() -> TestResult<Self> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let port = container.get_host_port_ipv4(5432).await?;
        let host = container.get_host().await?.to_string();

        let config = TestDatabaseConfig {
            host,
            port,
            ..TestDatabaseConfig::default()
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;

        let test_db = Self {
            _container: container,
            config,
            pool,
        };

        test_db.init_schema().await?;

        Ok(test_db)
    }

    /// Initializes the database schema from the migrations file
    async fn init_schema(&self) -> TestResult<()> {
        let schema = include_str!("../../../migrations/20240101_000001_initial_schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clears all data from the database while preserving the schema
    pub async fn clear_data(&self) -> TestResult<()> {
        let tables = [
            "scheduler_logs",
            "billing_category_links",
            "billing_status_links",
            "billing_resident_links",
            "billings",
            "payment_pricing_configs",
            "billing_definitions",
            "transaction_categories",
            "billing_statuses",
            "resident_profiles",
            "resident_roles",
            "residents",
            "roles",
        ];

        for table in tables {
            sqlx::query(&format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table))
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// Inserts a published billing status
    pub async fn seed_status(&self, name: &str) -> TestResult<StatusId> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO billing_statuses (status_name, published_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(StatusId::new(id))
    }

    /// Inserts a published transaction category
    pub async fn seed_category(&self, name: &str) -> TestResult<CategoryId> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO transaction_categories (name, published_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(CategoryId::new(id))
    }

    /// Inserts a resident with the default role, optionally with a profile
    pub async fn seed_resident(&self, username: &str, with_profile: bool) -> TestResult<ResidentId> {
        let role_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO roles (name, type) VALUES ('Penghuni', $1)
            ON CONFLICT (type) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(DEFAULT_RESIDENT_ROLE)
        .fetch_one(&self.pool)
        .await?;

        let resident_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO residents (username, email) VALUES ($1, $2) RETURNING id",
        )
        .bind(username)
        .bind(format!("{username}@estate.test"))
        .fetch_one(&self.pool)
        .await?;

        sqlx::query("INSERT INTO resident_roles (resident_id, role_id) VALUES ($1, $2)")
            .bind(resident_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        if with_profile {
            sqlx::query(
                "INSERT INTO resident_profiles (resident_id, full_name, phone) VALUES ($1, $2, $3)",
            )
            .bind(resident_id)
            .bind(format!("Resident {username}"))
            .bind("081234567890")
            .execute(&self.pool)
            .await?;
        }

        Ok(ResidentId::new(resident_id))
    }

    /// Inserts an active, published billing definition
    pub async fn seed_definition(
        &self,
        name: &str,
        kind: DefinitionKind,
        unit_amount: Decimal,
    ) -> TestResult<DefinitionId> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO billing_definitions (name, kind, unit_amount, is_active, published_at)
            VALUES ($1, $2, $3, TRUE, $4)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(kind.as_str())
        .bind(unit_amount)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(DefinitionId::new(id))
    }

    /// Inserts a published pricing configuration
    pub async fn seed_pricing_config(
        &self,
        payment_fee: i64,
        fixed: bool,
        threshold: Option<i32>,
        max_fee: Option<i64>,
    ) -> TestResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO payment_pricing_configs (
                payment_fee, is_fixed_fee, min_month_discount, max_fee,
                admin_name, admin_email, admin_phone, published_at
            ) VALUES ($1, $2, $3, $4, 'Pengurus', 'admin@estate.test', '0210000000', $5)
            RETURNING id
            "#,
        )
        .bind(payment_fee)
        .bind(fixed)
        .bind(threshold)
        .bind(max_fee)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Counts rows in a table
    pub async fn count_rows(&self, table: &str) -> TestResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Creates an isolated test database for a single test
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::new().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_connection_url() {
        let config = TestDatabaseConfig::default();
        let url = config.connection_url();

        assert!(url.starts_with("postgres://"));
        assert!(url.contains(POSTGRES_USER));
        assert!(url.contains(POSTGRES_DB));
    }
}
