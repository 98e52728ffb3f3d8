use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::models::{RateTable, ReferralLevelTable};
use crate::{ApiResponse, AppState};

pub async fn get_rates(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.store.rates()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatesPayload {
    pub actor_id: String,
    pub rates: RateTable,
}

/// Rate changes apply prospectively only; payouts already posted keep the
/// rate captured at the time.
pub async fn update_rates(
    State(state): State<AppState>,
    Json(payload): Json<UpdateRatesPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.accounts.require_admin(&payload.actor_id)?;
    state.store.set_rates(payload.rates);
    Ok(Json(ApiResponse::success_with_message((), "Rates updated")))
}

pub async fn get_referral_levels(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.store.referral_levels()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateReferralLevelsPayload {
    pub actor_id: String,
    pub levels: ReferralLevelTable,
}

pub async fn update_referral_levels(
    State(state): State<AppState>,
    Json(payload): Json<UpdateReferralLevelsPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.accounts.require_admin(&payload.actor_id)?;
    state.store.set_referral_levels(payload.levels);
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Referral levels updated",
    )))
}
