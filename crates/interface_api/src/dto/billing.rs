//! Billing DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BillingId, ResidentId};
use domain_billing::{BatchResult, ReconciliationOutcome};

#[derive(Debug, Deserialize, Validate)]
pub struct BulkMonthlyRequest {
    /// Restricts the run to these residents; absent means every unbilled resident
    pub user_ids: Option<Vec<ResidentId>>,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    #[validate(range(min = 2020, max = 2100))]
    pub year: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkCustomRequest {
    pub user_ids: Option<Vec<ResidentId>>,
    #[validate(range(min = 1))]
    pub billing_settings_id: i64,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    #[validate(range(min = 2020, max = 2100))]
    pub year: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmSingleRequest {
    #[validate(range(min = 1))]
    pub billing_id: i64,
}

#[derive(Debug, Serialize)]
pub struct BatchResultResponse {
    pub month: u32,
    pub year: i32,
    #[serde(flatten)]
    pub result: BatchResult,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub confirmed_ids: Vec<BillingId>,
    pub unmatched_ids: Vec<BillingId>,
}

impl From<ReconciliationOutcome> for ConfirmationResponse {
    fn from(outcome: ReconciliationOutcome) -> Self {
        Self {
            confirmed_ids: outcome.confirmed_ids,
            unmatched_ids: outcome.unmatched_ids,
        }
    }
}
