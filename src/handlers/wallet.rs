use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

pub async fn balance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let balance = state.services.wallet.balance(&id)?;
    Ok(Json(ApiResponse::success(json!({
        "account_id": id,
        "balance": balance,
    }))))
}

pub async fn transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.wallet.transactions(&id)?,
    )))
}

#[derive(Debug, Deserialize)]
pub struct AddFundsPayload {
    pub amount: Decimal,
    pub source: String,
}

pub async fn add_funds(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AddFundsPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let txn = state
        .services
        .wallet
        .add_funds(&id, payload.amount, &payload.source)?;
    Ok(Json(ApiResponse::success(txn)))
}

#[derive(Debug, Deserialize)]
pub struct WithdrawPayload {
    pub amount: Decimal,
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<WithdrawPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let txn = state.services.wallet.withdraw_funds(&id, payload.amount)?;
    Ok(Json(ApiResponse::success(txn)))
}

#[derive(Debug, Deserialize)]
pub struct TransferPayload {
    pub actor_id: String,
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

pub async fn transfer(
    State(state): State<AppState>,
    Json(payload): Json<TransferPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.wallet.transfer_funds(
        &payload.actor_id,
        &payload.from,
        &payload.to,
        payload.amount,
    )?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Funds transferred",
    )))
}
