use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::{ApiResponse, AppState, ListQuery};

#[derive(Debug, Deserialize)]
pub struct CreateInvestmentPayload {
    pub account_id: String,
    pub principal: Decimal,
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvestmentPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let investment = state
        .services
        .investments
        .create(&payload.account_id, payload.principal)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            investment,
            "Investment created",
        )),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.investments.list(query.account_id.as_deref()),
    )))
}

#[derive(Debug, Deserialize)]
pub struct DistributePayload {
    pub actor_id: String,
    pub company_profit: Decimal,
}

pub async fn distribute(
    State(state): State<AppState>,
    Json(payload): Json<DistributePayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .investments
        .distribute_daily_dividends(&payload.actor_id, payload.company_profit)?;
    Ok(Json(ApiResponse::success(report)))
}
