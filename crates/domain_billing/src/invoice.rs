//! Hosted invoice requests
//!
//! Payment is collected through invoices hosted by an external provider.
//! These types describe what the issuer asks the provider for and what it
//! gets back, independent of the provider's wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::Money;

/// A line on a hosted invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    /// Price per unit
    pub rate: Money,
}

impl InvoiceItem {
    pub fn single(description: impl Into<String>, rate: Money) -> Self {
        Self {
            description: description.into(),
            quantity: 1,
            rate,
        }
    }

    pub fn subtotal(&self) -> Money {
        self.rate.times(u64::from(self.quantity))
    }
}

/// Payer details displayed on the hosted invoice page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePayer {
    pub name: String,
    pub email: String,
    pub mobile: String,
}

/// Request to create a hosted invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub payer: InvoicePayer,
    /// Free-text description; carries the correlation text
    pub description: String,
    /// Where the provider sends the payer after checkout
    pub redirect_url: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub items: Vec<InvoiceItem>,
}

impl InvoiceRequest {
    pub fn total(&self) -> Money {
        self.items.iter().map(InvoiceItem::subtotal).sum()
    }
}

/// Invoice as issued by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedInvoice {
    /// Provider-side invoice id
    pub id: String,
    pub transaction_id: Option<String>,
    /// Checkout URL handed to the payer
    pub link: String,
    pub expires_at: Option<DateTime<Utc>>,
}
