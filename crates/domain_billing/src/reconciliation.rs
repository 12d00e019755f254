//! Payment reconciliation
//!
//! A webhook from the payment provider moves through
//! `Received → Decoded → Reconciling` and ends `Committed` or `Rejected`.
//! Nothing is retried here; the provider redelivers webhooks that were not
//! acknowledged with a 2xx.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::{BillingId, StatusId};

use crate::correlation::CorrelationCodec;
use crate::error::BillingError;
use crate::ports::BillingStore;

/// Progress of one webhook through reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationState {
    Received,
    Decoded { ids: usize },
    Reconciling,
    Committed { confirmed: usize },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Parse(String),
    Database(String),
}

impl fmt::Display for ReconciliationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationState::Received => f.write_str("received"),
            ReconciliationState::Decoded { ids } => write!(f, "decoded ({ids} ids)"),
            ReconciliationState::Reconciling => f.write_str("reconciling"),
            ReconciliationState::Committed { confirmed } => write!(f, "committed ({confirmed} confirmed)"),
            ReconciliationState::Rejected(RejectReason::Parse(e)) => write!(f, "rejected: parse error: {e}"),
            ReconciliationState::Rejected(RejectReason::Database(e)) => write!(f, "rejected: database error: {e}"),
        }
    }
}

/// Outcome of a committed reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    /// Billings whose status link now points at the paid status
    pub confirmed_ids: Vec<BillingId>,
    /// Decoded ids with no status link to update
    pub unmatched_ids: Vec<BillingId>,
}

/// Marks billings paid when the provider confirms a payment
pub struct PaymentReconciler {
    store: Arc<dyn BillingStore>,
    codec: Arc<dyn CorrelationCodec>,
    paid_status: StatusId,
}

impl PaymentReconciler {
    pub fn new(store: Arc<dyn BillingStore>, codec: Arc<dyn CorrelationCodec>, paid_status: StatusId) -> Self {
        Self {
            store,
            codec,
            paid_status,
        }
    }

    /// Reconciles a webhook from its raw invoice description
    ///
    /// Re-delivering the same webhook sets the same rows to paid again and
    /// reports the same outcome.
    ///
    /// # Errors
    ///
    /// * `Parse` - malformed correlation text; nothing is updated
    /// * `Persistence` - the update transaction was rolled back
    #[instrument(skip(self, raw_description))]
    pub async fn reconcile_webhook(&self, raw_description: &str) -> Result<ReconciliationOutcome, BillingError> {
        trace_state(&ReconciliationState::Received);

        let ids = match self.codec.decode(raw_description) {
            Ok(ids) => ids,
            Err(e) => {
                trace_state(&ReconciliationState::Rejected(RejectReason::Parse(e.to_string())));
                return Err(e.into());
            }
        };
        trace_state(&ReconciliationState::Decoded { ids: ids.len() });

        self.apply(ids).await
    }

    /// Marks billings paid on an administrator's confirmation
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn confirm_billings(&self, ids: &[BillingId]) -> Result<ReconciliationOutcome, BillingError> {
        if ids.is_empty() {
            return Err(BillingError::validation("at least one billing id is required"));
        }
        self.apply(ids.to_vec()).await
    }

    async fn apply(&self, ids: Vec<BillingId>) -> Result<ReconciliationOutcome, BillingError> {
        trace_state(&ReconciliationState::Reconciling);

        let touched = match self.store.mark_paid(&ids, self.paid_status).await {
            Ok(touched) => touched,
            Err(e) => {
                trace_state(&ReconciliationState::Rejected(RejectReason::Database(e.to_string())));
                return Err(BillingError::Persistence(e.to_string()));
            }
        };

        let mut outcome = ReconciliationOutcome::default();
        for (id, rows) in ids.into_iter().zip(touched) {
            if rows > 0 {
                outcome.confirmed_ids.push(id);
            } else {
                outcome.unmatched_ids.push(id);
            }
        }

        trace_state(&ReconciliationState::Committed {
            confirmed: outcome.confirmed_ids.len(),
        });
        if !outcome.unmatched_ids.is_empty() {
            warn!(unmatched = ?outcome.unmatched_ids, "Some billings had no status link to update");
        }
        info!(confirmed = ?outcome.confirmed_ids, "Billings marked paid");
        Ok(outcome)
    }
}

fn trace_state(state: &ReconciliationState) {
    match state {
        ReconciliationState::Rejected(_) => warn!(%state, "Reconciliation state"),
        _ => debug!(%state, "Reconciliation state"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::Billing;
    use crate::correlation::DescriptionCodec;
    use crate::ports::mock::MockBillingStore;
    use chrono::Utc;
    use core_kernel::{BillingPeriod, Money};

    const UNPAID: StatusId = StatusId::new(2);
    const PAID: StatusId = StatusId::new(6);

    async fn store_with(ids: &[i64]) -> Arc<MockBillingStore> {
        let store = Arc::new(MockBillingStore::new());
        for id in ids {
            let now = Utc::now();
            let billing = Billing {
                id: BillingId::new(*id),
                document_id: None,
                name: "Iuran IPL".to_string(),
                note: None,
                period: BillingPeriod::new(1, 2025).unwrap(),
                amount: Money::new(150000),
                created_at: now,
                updated_at: now,
                published_at: Some(now),
                created_by: None,
                updated_by: None,
            };
            store.insert_billing(billing, UNPAID).await;
        }
        store
    }

    fn reconciler(store: Arc<MockBillingStore>) -> PaymentReconciler {
        PaymentReconciler::new(store, Arc::new(DescriptionCodec), PAID)
    }

    #[tokio::test]
    async fn test_webhook_marks_billings_paid() {
        let store = store_with(&[1372, 67]).await;
        let reconciler = reconciler(store.clone());

        let outcome = reconciler
            .reconcile_webhook("1372,67 (DocumentID: monthly-a, monthly-b)")
            .await
            .unwrap();

        assert_eq!(outcome.confirmed_ids, vec![BillingId::new(1372), BillingId::new(67)]);
        assert!(outcome.unmatched_ids.is_empty());
        assert_eq!(store.status_of(BillingId::new(1372)).await, Some(PAID));
        assert_eq!(store.status_of(BillingId::new(67)).await, Some(PAID));
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let store = store_with(&[10]).await;
        let reconciler = reconciler(store.clone());

        let first = reconciler.reconcile_webhook("10 (DocumentID: N/A)").await.unwrap();
        let second = reconciler.reconcile_webhook("10 (DocumentID: N/A)").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.status_of(BillingId::new(10)).await, Some(PAID));
    }

    #[tokio::test]
    async fn test_non_numeric_token_rejects_whole_webhook() {
        let store = store_with(&[12]).await;
        let reconciler = reconciler(store.clone());

        let err = reconciler.reconcile_webhook("12,ab (DocumentID: x)").await.unwrap_err();

        assert!(matches!(err, BillingError::Parse(_)));
        assert_eq!(store.status_of(BillingId::new(12)).await, Some(UNPAID));
    }

    #[tokio::test]
    async fn test_unknown_ids_are_reported_unmatched() {
        let store = store_with(&[1]).await;
        let reconciler = reconciler(store);

        let outcome = reconciler.reconcile_webhook("1,2 (DocumentID: N/A)").await.unwrap();
        assert_eq!(outcome.confirmed_ids, vec![BillingId::new(1)]);
        assert_eq!(outcome.unmatched_ids, vec![BillingId::new(2)]);
    }

    #[tokio::test]
    async fn test_database_failure_is_persistence_error() {
        let store = store_with(&[1]).await;
        store.fail_status_updates(true).await;
        let reconciler = reconciler(store.clone());

        let err = reconciler.reconcile_webhook("1 (DocumentID: N/A)").await.unwrap_err();
        assert!(matches!(err, BillingError::Persistence(_)));
        assert_eq!(store.status_of(BillingId::new(1)).await, Some(UNPAID));
    }

    #[tokio::test]
    async fn test_manual_confirmation() {
        let store = store_with(&[3]).await;
        let reconciler = reconciler(store.clone());

        let outcome = reconciler.confirm_billings(&[BillingId::new(3)]).await.unwrap();
        assert_eq!(outcome.confirmed_ids, vec![BillingId::new(3)]);
        assert!(reconciler.confirm_billings(&[]).await.is_err());
    }
}
