//! Reference rows every new billing points at
//!
//! New billings start in the estate's "unpaid" status and the default
//! transaction category; reconciliation moves them to "paid". The row ids are
//! resolved once when the service starts and then passed around by value.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::{CategoryId, StatusId};

use crate::error::BillingError;
use crate::ports::StatusDirectory;

/// How to find the default reference rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsSettings {
    /// Explicit unpaid status id; skips the name lookup
    pub unpaid_status_id: Option<StatusId>,
    /// Status name looked up when no id is configured
    pub unpaid_status_name: String,
    /// Explicit paid status id; skips the name lookup
    pub paid_status_id: Option<StatusId>,
    pub paid_status_name: String,
    pub default_category_id: CategoryId,
}

impl Default for DefaultsSettings {
    fn default() -> Self {
        Self {
            unpaid_status_id: None,
            unpaid_status_name: "Belum Dibayar".to_string(),
            paid_status_id: None,
            paid_status_name: "Sudah Dibayar".to_string(),
            default_category_id: CategoryId::new(1),
        }
    }
}

/// Resolved reference rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDefaults {
    pub unpaid_status: StatusId,
    pub paid_status: StatusId,
    pub default_category: CategoryId,
}

impl BillingDefaults {
    /// Resolves the reference rows against the status table
    ///
    /// The unpaid status falls back to the first published status when the
    /// named row is missing. A missing paid status is a configuration error,
    /// since reconciliation would have nothing to move billings to.
    pub async fn resolve(
        directory: &dyn StatusDirectory,
        settings: &DefaultsSettings,
    ) -> Result<Self, BillingError> {
        let unpaid_status = match settings.unpaid_status_id {
            Some(id) => id,
            None => match directory.status_by_name(&settings.unpaid_status_name).await? {
                Some(id) => id,
                None => {
                    warn!(
                        name = %settings.unpaid_status_name,
                        "Unpaid status not found by name, using first published status"
                    );
                    directory.first_published_status().await?.ok_or_else(|| {
                        BillingError::configuration("no published billing status exists")
                    })?
                }
            },
        };

        let paid_status = match settings.paid_status_id {
            Some(id) => id,
            None => directory
                .status_by_name(&settings.paid_status_name)
                .await?
                .ok_or_else(|| {
                    BillingError::configuration(format!(
                        "paid status {:?} not found",
                        settings.paid_status_name
                    ))
                })?,
        };

        let defaults = Self {
            unpaid_status,
            paid_status,
            default_category: settings.default_category_id,
        };
        info!(
            unpaid_status = %defaults.unpaid_status,
            paid_status = %defaults.paid_status,
            default_category = %defaults.default_category,
            "Resolved billing defaults"
        );
        Ok(defaults)
    }
}
