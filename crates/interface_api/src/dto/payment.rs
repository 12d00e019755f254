//! Payment link DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BillingId, Money};
use domain_billing::PaymentLink;

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentLinkRequest {
    #[validate(length(min = 1, message = "at least one billing id is required"))]
    pub billing_ids: Vec<BillingId>,
}

#[derive(Debug, Serialize)]
pub struct PaymentLinkResponse {
    pub billing_ids: Vec<BillingId>,
    /// Billed amounts plus the service fee
    pub amount: Money,
    pub fee: Money,
    pub payment_url: String,
    pub description: String,
    pub invoice_id: String,
    pub transaction_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<PaymentLink> for PaymentLinkResponse {
    fn from(link: PaymentLink) -> Self {
        Self {
            billing_ids: link.correlation_ids,
            amount: link.amount,
            fee: link.fee,
            payment_url: link.url,
            description: link.description,
            invoice_id: link.invoice_id,
            transaction_id: link.transaction_id,
            expires_at: link.expires_at,
        }
    }
}
