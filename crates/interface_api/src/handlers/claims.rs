//! Claims handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::ClaimId;
use domain_claims::{ClaimQuery, ClaimStatus};

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

/// Opens a claim and calculates it
pub async fn submit_claim(
    State(state): State<AppState>,
    Json(body): Json<OpenClaimBody>,
) -> Result<(StatusCode, Json<CalculatedClaimResponse>), ApiError> {
    body.validate()?;

    let outcome = state.ledger.submit_claim(body.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CalculatedClaimResponse {
            claim: ClaimResponse::from(&outcome.claim),
            calculation: CalculationResponse::from(&outcome.result),
        }),
    ))
}

/// Lists claims, newest first
pub async fn list_claims(
    State(state): State<AppState>,
    Query(params): Query<ListClaimsParams>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    params.validate()?;

    let status = params
        .status
        .as_deref()
        .map(str::parse::<ClaimStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let query = ClaimQuery {
        status,
        patient_name: params.patient_name,
        limit: params.limit,
        offset: params.offset,
    };

    let claims = state.ledger.list_claims(query).await?;
    Ok(Json(claims.iter().map(ClaimResponse::from).collect()))
}

/// Gets a claim with its line items
pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimDetailResponse>, ApiError> {
    let detail = state.ledger.claim_detail(ClaimId::from_uuid(id)).await?;

    Ok(Json(ClaimDetailResponse {
        claim: ClaimResponse::from(&detail.claim),
        line_items: detail.line_items.iter().map(LineResponse::from).collect(),
    }))
}

/// Soft-deletes a claim
pub async fn delete_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.ledger.delete_claim(ClaimId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recalculates a claim
pub async fn calculate_claim(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CalculationResponse>, ApiError> {
    let outcome = state.ledger.calculate(ClaimId::from_uuid(id)).await?;
    Ok(Json(CalculationResponse::from(&outcome.result)))
}

/// Summary of the persisted calculation
pub async fn claim_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.ledger.summary(ClaimId::from_uuid(id)).await?;
    Ok(Json(SummaryResponse::from(&summary)))
}

/// Portfolio statistics
pub async fn statistics(State(state): State<AppState>) -> Result<Json<StatisticsResponse>, ApiError> {
    let stats = state.ledger.statistics().await?;
    Ok(Json(StatisticsResponse::from(&stats)))
}
