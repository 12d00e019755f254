//! Payment link issuance
//!
//! Turns one or more unpaid billings into a hosted invoice. The invoice
//! description carries the correlation text the reconciler later decodes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{BillingId, DocumentId, Money};

use crate::billing::Billing;
use crate::correlation::CorrelationCodec;
use crate::error::BillingError;
use crate::fee::{admin_fee, PayerContact};
use crate::invoice::{InvoiceItem, InvoicePayer, InvoiceRequest};
use crate::ports::{BillingStore, PaymentGateway, PricingConfigRepository};

/// Issuer settings that do not come from the pricing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerSettings {
    /// How long a hosted invoice stays payable
    pub invoice_validity_days: i64,
    /// Payer contact used for fields the pricing configuration leaves empty
    pub fallback_contact: PayerContact,
    pub redirect_url: Option<String>,
    /// Description of the fee line item
    pub fee_label: String,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            invoice_validity_days: 30,
            fallback_contact: PayerContact::default(),
            redirect_url: None,
            fee_label: "Biaya Layanan".to_string(),
        }
    }
}

/// An issued payment link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    /// Billed amounts plus fee
    pub amount: Money,
    pub fee: Money,
    /// Hosted checkout URL
    pub url: String,
    /// Correlation text sent as the invoice description
    pub description: String,
    pub correlation_ids: Vec<BillingId>,
    pub invoice_id: String,
    pub transaction_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Issues hosted payment links for billings
pub struct PaymentLinkIssuer {
    store: Arc<dyn BillingStore>,
    pricing: Arc<dyn PricingConfigRepository>,
    gateway: Arc<dyn PaymentGateway>,
    codec: Arc<dyn CorrelationCodec>,
    settings: IssuerSettings,
}

impl PaymentLinkIssuer {
    pub fn new(
        store: Arc<dyn BillingStore>,
        pricing: Arc<dyn PricingConfigRepository>,
        gateway: Arc<dyn PaymentGateway>,
        codec: Arc<dyn CorrelationCodec>,
        settings: IssuerSettings,
    ) -> Self {
        Self {
            store,
            pricing,
            gateway,
            codec,
            settings,
        }
    }

    /// Issues a link for a single billing
    pub async fn issue_for_billing(&self, id: BillingId) -> Result<PaymentLink, BillingError> {
        self.issue_payment_link(&[id]).await
    }

    /// Issues one link covering every billing in `ids`
    ///
    /// Duplicate ids are collapsed, keeping first-occurrence order. Nothing
    /// is written locally; a failed provider call leaves no state behind.
    ///
    /// # Errors
    ///
    /// * `Validation` - empty id list or a billing with a non-positive amount
    /// * `NotFound` - an id with no billing
    /// * `Upstream` - the provider failed, timed out, or answered garbage
    /// * `Configuration` - the invoice validity period overflows the clock
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn issue_payment_link(&self, ids: &[BillingId]) -> Result<PaymentLink, BillingError> {
        let ids = dedup_preserving_order(ids);
        if ids.is_empty() {
            return Err(BillingError::validation("at least one billing id is required"));
        }

        let billings = self.load_billings(&ids).await?;
        for billing in &billings {
            if !billing.amount.is_positive() {
                return Err(BillingError::validation(format!(
                    "billing {} has non-positive amount {}",
                    billing.id, billing.amount
                )));
            }
        }

        let config = self.pricing.active_pricing_config().await?;
        let fee = admin_fee(billings.iter().map(|b| b.period), config.as_ref());

        let documents: Vec<DocumentId> = billings.iter().filter_map(|b| b.document_id.clone()).collect();
        let description = self.codec.encode(&ids, &documents);

        let contact = config
            .map(|c| c.admin_contact)
            .unwrap_or_default()
            .or(&self.settings.fallback_contact);

        let mut items: Vec<InvoiceItem> = billings
            .iter()
            .map(|b| InvoiceItem::single(b.line_item_description(), b.amount))
            .collect();
        items.push(InvoiceItem::single(self.settings.fee_label.clone(), fee));

        let billed: Money = billings.iter().map(|b| b.amount).sum();
        let amount = billed.checked_add(fee)?;
        let expires_at = self.expiry_from(Utc::now())?;

        let request = InvoiceRequest {
            payer: InvoicePayer {
                name: contact.name.unwrap_or_default(),
                email: contact.email.unwrap_or_default(),
                mobile: contact.phone.unwrap_or_default(),
            },
            description: description.clone(),
            redirect_url: self.settings.redirect_url.clone(),
            expires_at,
            items,
        };

        let invoice = self.gateway.create_invoice(request).await.map_err(|e| {
            warn!(error = %e, "Invoice creation failed");
            BillingError::from_gateway(e)
        })?;

        info!(invoice_id = %invoice.id, amount = %amount, fee = %fee, "Payment link issued");
        Ok(PaymentLink {
            amount,
            fee,
            url: invoice.link,
            description,
            correlation_ids: ids,
            invoice_id: invoice.id,
            transaction_id: invoice.transaction_id,
            expires_at: invoice.expires_at.unwrap_or(expires_at),
        })
    }

    /// Loads the billings in the order of `ids`, failing on the first missing one
    async fn load_billings(&self, ids: &[BillingId]) -> Result<Vec<Billing>, BillingError> {
        let mut found: HashMap<BillingId, Billing> = self
            .store
            .billings_by_ids(ids)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        ids.iter()
            .map(|id| {
                found
                    .remove(id)
                    .ok_or_else(|| BillingError::not_found(BillingId::entity(), id))
            })
            .collect()
    }

    /// Invoice expiry counted from `now`
    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, BillingError> {
        let days = self.settings.invoice_validity_days;
        Duration::try_days(days)
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or_else(|| {
                BillingError::configuration(format!("invoice validity of {days} days is out of range"))
            })
    }
}

fn dedup_preserving_order(ids: &[BillingId]) -> Vec<BillingId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::DescriptionCodec;
    use crate::fee::PaymentPricingConfig;
    use crate::ports::mock::{MockBillingStore, MockPaymentGateway, MockPricingConfigRepository};
    use core_kernel::{BillingPeriod, PricingConfigId, StatusId};

    fn billing(id: i64, month: u32, amount: i64) -> Billing {
        let now = Utc::now();
        Billing {
            id: BillingId::new(id),
            document_id: Some(DocumentId::from_string(format!("monthly-{id}"))),
            name: "Iuran IPL".to_string(),
            note: None,
            period: BillingPeriod::new(month, 2025).unwrap(),
            amount: Money::new(amount),
            created_at: now,
            updated_at: now,
            published_at: Some(now),
            created_by: None,
            updated_by: None,
        }
    }

    fn pricing() -> PaymentPricingConfig {
        PaymentPricingConfig {
            id: PricingConfigId::new(1),
            base_fee: Money::new(20000),
            fixed_fee: false,
            discount_threshold: Some(6),
            capped_fee: Some(Money::new(20000)),
            admin_contact: PayerContact {
                name: Some("Pengelola Perumahan".to_string()),
                email: None,
                phone: Some("081200000000".to_string()),
            },
            published_at: Some(Utc::now()),
        }
    }

    async fn issuer(
        billings: Vec<Billing>,
        gateway: Arc<MockPaymentGateway>,
        config: Option<PaymentPricingConfig>,
    ) -> PaymentLinkIssuer {
        let store = Arc::new(MockBillingStore::new());
        for b in billings {
            store.insert_billing(b, StatusId::new(2)).await;
        }
        PaymentLinkIssuer::new(
            store,
            Arc::new(MockPricingConfigRepository::new(config)),
            gateway,
            Arc::new(DescriptionCodec),
            IssuerSettings {
                fallback_contact: PayerContact {
                    name: Some("Admin".to_string()),
                    email: Some("admin@estate.test".to_string()),
                    phone: Some("0800".to_string()),
                },
                ..IssuerSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_issue_sums_amounts_and_fee() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let issuer = issuer(
            vec![billing(1372, 1, 150000), billing(67, 2, 150000), billing(70, 3, 150000)],
            gateway.clone(),
            Some(pricing()),
        )
        .await;

        let link = issuer
            .issue_payment_link(&[BillingId::new(1372), BillingId::new(67), BillingId::new(70)])
            .await
            .unwrap();

        assert_eq!(link.fee, Money::new(60000));
        assert_eq!(link.amount, Money::new(510000));
        assert_eq!(link.description, "1372,67,70 (DocumentID: monthly-1372, monthly-67, monthly-70)");
        assert!(link.url.starts_with("https://"));

        let requests = gateway.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].items.len(), 4);
        assert_eq!(requests[0].total(), link.amount);
        assert_eq!(requests[0].payer.name, "Pengelola Perumahan");
        assert_eq!(requests[0].payer.email, "admin@estate.test");
    }

    #[tokio::test]
    async fn test_out_of_range_validity_is_configuration_error() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let store = Arc::new(MockBillingStore::new());
        store.insert_billing(billing(5, 1, 100000), StatusId::new(2)).await;
        let issuer = PaymentLinkIssuer::new(
            store,
            Arc::new(MockPricingConfigRepository::new(Some(pricing()))),
            gateway.clone(),
            Arc::new(DescriptionCodec),
            IssuerSettings {
                invoice_validity_days: i64::MAX,
                ..IssuerSettings::default()
            },
        );

        let err = issuer.issue_for_billing(BillingId::new(5)).await.unwrap_err();
        assert!(matches!(err, BillingError::Configuration(_)));
        assert!(gateway.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_billed_once() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let issuer = issuer(vec![billing(5, 1, 100000)], gateway, Some(pricing())).await;

        let link = issuer
            .issue_payment_link(&[BillingId::new(5), BillingId::new(5)])
            .await
            .unwrap();

        assert_eq!(link.correlation_ids, vec![BillingId::new(5)]);
        assert_eq!(link.amount, Money::new(120000));
    }

    #[tokio::test]
    async fn test_missing_billing_is_not_found() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let issuer = issuer(vec![billing(5, 1, 100000)], gateway.clone(), None).await;

        let err = issuer
            .issue_payment_link(&[BillingId::new(5), BillingId::new(6)])
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::NotFound { ref id, .. } if id == "6"));
        assert!(gateway.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let issuer = issuer(vec![billing(5, 1, 0)], gateway.clone(), None).await;

        let err = issuer.issue_for_billing(BillingId::new(5)).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
        assert!(gateway.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_request_is_rejected() {
        let issuer = issuer(vec![], Arc::new(MockPaymentGateway::new()), None).await;
        let err = issuer.issue_payment_link(&[]).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_is_upstream() {
        let gateway = Arc::new(MockPaymentGateway::failing(Some(500), "internal error"));
        let issuer = issuer(vec![billing(5, 1, 100000)], gateway, None).await;

        let err = issuer.issue_for_billing(BillingId::new(5)).await.unwrap_err();
        assert!(matches!(err, BillingError::Upstream(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_absent_pricing_config_means_zero_fee_and_fallback_payer() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let issuer = issuer(vec![billing(5, 1, 100000)], gateway.clone(), None).await;

        let link = issuer.issue_for_billing(BillingId::new(5)).await.unwrap();
        assert_eq!(link.fee, Money::ZERO);
        assert_eq!(link.amount, Money::new(100000));

        let requests = gateway.requests().await;
        assert_eq!(requests[0].payer.name, "Admin");
        assert_eq!(requests[0].payer.mobile, "0800");
    }
}
