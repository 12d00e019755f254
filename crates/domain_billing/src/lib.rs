//! Billing Domain - Estate Fee Billing and Payment Reconciliation
//!
//! This crate generates IPL (housing-estate) fee billings for residents,
//! issues hosted payment links for them, and reconciles the payment
//! provider's callbacks against the billings they pay for.
//!
//! # Components
//!
//! - **Fee calculator** ([`fee`]): admin fee for a set of billed months
//! - **Record factory** ([`factory`]): a billing plus resident, status, and
//!   category links per (resident, definition)
//! - **Batch generation** ([`generation`]): cohort selection and atomic
//!   persistence through [`ports::BillingStore`]
//! - **Correlation codec** ([`correlation`]): billing ids carried through the
//!   provider's invoice description
//! - **Payment link issuer** ([`issuance`]) and **reconciler**
//!   ([`reconciliation`])
//! - **Scheduler** ([`scheduler`]): monthly runs with an audit trail
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BatchGenerator, BatchKind, GenerateBatchRequest};
//!
//! let generator = BatchGenerator::new(residents, definitions, store, &defaults);
//! let result = generator
//!     .generate_batch(
//!         GenerateBatchRequest {
//!             kind: BatchKind::Monthly,
//!             resident_ids: None,
//!             period: BillingPeriod::new(5, 2025)?,
//!         },
//!         actor,
//!     )
//!     .await?;
//! assert_eq!(result.failure_count, 0);
//! ```

pub mod adapters;
pub mod audit;
pub mod billing;
pub mod correlation;
pub mod defaults;
pub mod error;
pub mod factory;
pub mod fee;
pub mod generation;
pub mod invoice;
pub mod issuance;
pub mod ports;
pub mod reconciliation;
pub mod scheduler;

pub use audit::{AuditLogEntry, SchedulerState, MONTHLY_BILLING_JOB};
pub use billing::{Billing, BillingDefinition, DefinitionKind, NewBilling, Resident};
pub use correlation::{CorrelationCodec, CorrelationError, DescriptionCodec};
pub use defaults::{BillingDefaults, DefaultsSettings};
pub use error::BillingError;
pub use factory::{BillingBatch, BillingRecordFactory, LinkRow};
pub use fee::{admin_fee, PayerContact, PaymentPricingConfig, DEFAULT_DISCOUNT_THRESHOLD};
pub use generation::{BatchGenerator, BatchKind, BatchResult, GenerateBatchRequest, DEFAULT_RESIDENT_ROLE};
pub use invoice::{InvoiceItem, InvoicePayer, InvoiceRequest, IssuedInvoice};
pub use issuance::{IssuerSettings, PaymentLink, PaymentLinkIssuer};
pub use reconciliation::{PaymentReconciler, ReconciliationOutcome, ReconciliationState};
pub use scheduler::{BillingScheduler, RunReport, SchedulerSettings, DEFAULT_CRON_EXPRESSION};
