use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

pub async fn network_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    // Validate the account exists before reporting on it.
    state.services.accounts.get(&id)?;
    Ok(Json(ApiResponse::success(
        state.services.referrals.network_stats(&id),
    )))
}

pub async fn team(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.accounts.get(&id)?;
    Ok(Json(ApiResponse::success(
        state.services.referrals.team_members(&id),
    )))
}

pub async fn income_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.accounts.get(&id)?;
    Ok(Json(ApiResponse::success(
        state.services.referrals.income_logs(&id),
    )))
}

pub async fn claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let amount = state.services.referrals.claim_rewards(&id)?;
    Ok(Json(ApiResponse::success(json!({ "claimed": amount }))))
}
