//! Billing domain errors

use core_kernel::{MoneyError, PeriodError, PortError};
use thiserror::Error;

use crate::correlation::CorrelationError;

/// Errors that can occur in the billing domain
///
/// Variants follow the failure classes callers react to differently:
/// validation and not-found are reported to the client as-is, parse errors
/// reject a webhook, upstream errors come from the payment provider, and
/// persistence errors mean a transaction was rolled back.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Bad amount, bad id, or an empty cohort where one was required
    #[error("Validation error: {0}")]
    Validation(String),

    /// Billing, definition, or resident missing
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Correlation text could not be decoded
    #[error("Correlation text rejected: {0}")]
    Parse(#[from] CorrelationError),

    /// Payment provider answered non-2xx, timed out, or sent garbage
    #[error("Payment provider error: {0}")]
    Upstream(String),

    /// A transaction failed and was rolled back
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Startup wiring problem (unknown status, bad cron expression)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        BillingError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BillingError::Configuration(message.into())
    }

    /// Maps an error from the payment gateway port
    ///
    /// Every gateway failure is an upstream failure from the caller's point
    /// of view, including timeouts and connection errors.
    pub fn from_gateway(error: PortError) -> Self {
        match error {
            PortError::Validation { message, .. } => BillingError::Validation(message),
            other => BillingError::Upstream(other.to_string()),
        }
    }
}

impl From<PortError> for BillingError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => BillingError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Validation { message, .. } => BillingError::Validation(message),
            PortError::Upstream { .. } => BillingError::Upstream(error.to_string()),
            other => BillingError::Persistence(other.to_string()),
        }
    }
}

impl From<MoneyError> for BillingError {
    fn from(error: MoneyError) -> Self {
        BillingError::Validation(error.to_string())
    }
}

impl From<PeriodError> for BillingError {
    fn from(error: PeriodError) -> Self {
        BillingError::Validation(error.to_string())
    }
}
