//! Adapters for external systems
//!
//! Database adapters live in `infra_db`; this module holds adapters for
//! third-party HTTP APIs.

pub mod mayar;

pub use mayar::{MayarConfig, MayarInvoiceAdapter};
