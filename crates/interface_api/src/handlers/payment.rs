//! Payment link handlers

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};

use core_kernel::BillingId;

use crate::dto::payment::*;
use crate::dto::ValidatedJson;
use crate::{error::ApiError, AppState};

/// Issues a payment link for a single billing
pub async fn link_for_billing(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<PaymentLinkResponse>, ApiError> {
    let Path(id) = id?;
    let link = state
        .services
        .issuer
        .issue_for_billing(BillingId::new(id))
        .await?;
    Ok(Json(link.into()))
}

/// Issues one payment link covering several billings
pub async fn link_for_billings(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PaymentLinkRequest>,
) -> Result<Json<PaymentLinkResponse>, ApiError> {
    let link = state
        .services
        .issuer
        .issue_payment_link(&request.billing_ids)
        .await?;
    Ok(Json(link.into()))
}
