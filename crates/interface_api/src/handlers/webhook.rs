//! Payment provider webhook

use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::dto::billing::ConfirmationResponse;
use crate::dto::webhook::PaymentWebhook;
use crate::dto::ValidatedJson;
use crate::{error::ApiError, AppState};

/// Marks the billings named in the invoice description as paid
///
/// Unknown ids are reported back, not rejected, so the provider stops
/// retrying a delivery that can never match.
pub async fn confirm_payment(
    State(state): State<AppState>,
    ValidatedJson(webhook): ValidatedJson<PaymentWebhook>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    info!(
        event = webhook.event.as_deref().unwrap_or("unknown"),
        provider_id = webhook.data.id.as_deref().unwrap_or("-"),
        provider_status = webhook.data.status.as_deref().unwrap_or("-"),
        "Payment webhook received"
    );

    let outcome = state
        .services
        .reconciler
        .reconcile_webhook(&webhook.data.description)
        .await
        .map_err(|e| {
            warn!(error = %e, "Payment webhook rejected");
            ApiError::from(e)
        })?;

    if !outcome.unmatched_ids.is_empty() {
        warn!(unmatched = ?outcome.unmatched_ids, "Webhook named billings without a status link");
    }
    Ok(Json(outcome.into()))
}
