//! Billing handlers

use axum::{extract::State, Extension, Json};
use tracing::info;

use core_kernel::{BillingId, BillingPeriod, DefinitionId, ResidentId};
use domain_billing::{BatchKind, BillingError, GenerateBatchRequest};

use crate::auth::{permissions, Claims};
use crate::dto::billing::*;
use crate::dto::ValidatedJson;
use crate::{error::ApiError, AppState};

/// Generates monthly billings for every active monthly definition
pub async fn bulk_monthly(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(request): ValidatedJson<BulkMonthlyRequest>,
) -> Result<Json<BatchResultResponse>, ApiError> {
    claims.require(permissions::BILLING_WRITE)?;
    let actor = claims.actor()?;
    let period = BillingPeriod::new(request.month, request.year).map_err(BillingError::from)?;

    let result = state
        .services
        .generator
        .generate_batch(
            GenerateBatchRequest {
                kind: BatchKind::Monthly,
                resident_ids: explicit_cohort(request.user_ids),
                period,
            },
            actor,
        )
        .await?;

    Ok(Json(BatchResultResponse {
        month: period.month(),
        year: period.year(),
        result,
    }))
}

/// Generates billings from one custom definition
pub async fn bulk_custom(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(request): ValidatedJson<BulkCustomRequest>,
) -> Result<Json<BatchResultResponse>, ApiError> {
    claims.require(permissions::BILLING_WRITE)?;
    let actor = claims.actor()?;
    let period = BillingPeriod::new(request.month, request.year).map_err(BillingError::from)?;

    let result = state
        .services
        .generator
        .generate_batch(
            GenerateBatchRequest {
                kind: BatchKind::Custom(DefinitionId::new(request.billing_settings_id)),
                resident_ids: explicit_cohort(request.user_ids),
                period,
            },
            actor,
        )
        .await?;

    Ok(Json(BatchResultResponse {
        month: period.month(),
        year: period.year(),
        result,
    }))
}

/// Marks one billing paid on an administrator's confirmation
pub async fn confirm_single(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(request): ValidatedJson<ConfirmSingleRequest>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    claims.require(permissions::BILLING_WRITE)?;
    let actor = claims.actor()?;
    let id = BillingId::new(request.billing_id);

    let outcome = state.services.reconciler.confirm_billings(&[id]).await?;
    if outcome.confirmed_ids.is_empty() {
        return Err(BillingError::not_found(BillingId::entity(), id).into());
    }

    info!(billing_id = %id, actor = %actor, "Billing confirmed manually");
    Ok(Json(outcome.into()))
}

/// An empty `user_ids` list means "every resident", same as omitting it
fn explicit_cohort(user_ids: Option<Vec<ResidentId>>) -> Option<Vec<ResidentId>> {
    user_ids.filter(|ids| !ids.is_empty())
}
