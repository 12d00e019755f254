//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the estate billing system, built on SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL and return plain row types. Adapters in
//! [`adapters`] wrap them, convert rows into `domain_billing` models, and
//! implement the domain ports.
//!
//! # Atomic batches
//!
//! [`repositories::BillingRepository::insert_batch`] writes billings and
//! their resident, status, and category links in one transaction, chunked
//! to keep bind-parameter counts bounded. Either every row of a batch is
//! committed or none is.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresBillingStore;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/estate")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresBillingStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use error::{db_to_port_error, DatabaseError};
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
