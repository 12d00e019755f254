//! Core Kernel - Foundational types shared by the estate billing crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Whole-unit money amounts
//! - Billing periods and the estate timezone
//! - Strongly-typed row identifiers
//! - Port primitives for the ports and adapters layout

pub mod money;
pub mod period;
pub mod identifiers;
pub mod ports;

pub use money::{Money, MoneyError};
pub use period::{BillingPeriod, PeriodError, Timezone};
pub use identifiers::{
    ActorId, BillingId, CategoryId, DefinitionId, DocumentId, PricingConfigId, ResidentId,
    StatusId,
};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
