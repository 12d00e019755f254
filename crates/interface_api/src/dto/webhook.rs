//! Payment provider webhook payload
//!
//! Only `data.description` drives reconciliation. Fields not listed here
//! are ignored.

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentWebhook {
    pub event: Option<String>,
    pub data: PaymentWebhookData,
}

#[derive(Debug, Deserialize)]
pub struct PaymentWebhookData {
    /// Provider's invoice or transaction id
    pub id: Option<String>,
    pub status: Option<String>,
    pub description: String,
}
