//! Repository implementations
//!
//! Repositories own the SQL for one group of tables and return plain row
//! types. Multi-row writes run inside a single transaction.

pub mod audit;
pub mod billing;
pub mod reference;
pub mod resident;

pub use audit::{AuditRepository, NewSchedulerLog, SchedulerLogRow};
pub use billing::{BillingRepository, BillingRow, INSERT_CHUNK_SIZE};
pub use reference::{DefinitionRow, PricingConfigRow, ReferenceRepository};
pub use resident::{ResidentRepository, ResidentRow};
