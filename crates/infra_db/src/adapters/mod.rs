//! Port Adapters
//!
//! PostgreSQL implementations of the `domain_billing` ports. Each adapter
//! wraps a repository, converts rows into domain models, and translates
//! `DatabaseError` into `PortError`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresBillingStore, PostgresResidentDirectory};
//! use domain_billing::ports::BillingStore;
//!
//! let store = PostgresBillingStore::new(pool.clone());
//! let ids = store.persist_batch(batch).await?;
//! ```

pub mod audit;
pub mod billing;
pub mod reference;
pub mod resident;

pub use audit::PostgresAuditLog;
pub use billing::PostgresBillingStore;
pub use reference::PostgresReferenceData;
pub use resident::PostgresResidentDirectory;
