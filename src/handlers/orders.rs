use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::models::{OrderStatus, Priority};
use crate::services::orders::{AdvanceOrderRequest, BookOrderRequest, OrderFilter};
use crate::services::payouts::MaterialAction;
use crate::{ApiResponse, AppState, ListQuery};

#[derive(Debug, Deserialize)]
pub struct BookOrderPayload {
    pub actor_id: String,
    #[serde(flatten)]
    pub request: BookOrderRequest,
}

pub async fn book(
    State(state): State<AppState>,
    Json(payload): Json<BookOrderPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.book(&payload.actor_id, payload.request)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            orders,
            "Order booked",
        )),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = OrderFilter {
        status: query.status,
        assigned_worker_id: query.assigned_worker_id,
        customer_id: query.customer_id,
    };
    Ok(Json(ApiResponse::success(state.services.orders.list(&filter))))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(bill): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(state.services.orders.get(&bill)?)))
}

#[derive(Debug, Deserialize)]
pub struct AdvancePayload {
    pub actor_id: String,
    #[serde(flatten)]
    pub request: AdvanceOrderRequest,
}

pub async fn advance(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Json(payload): Json<AdvancePayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .advance(&payload.actor_id, &bill, payload.request)?;
    Ok(Json(ApiResponse::success(order)))
}

#[derive(Debug, Deserialize)]
pub struct ForceStatusPayload {
    pub actor_id: String,
    pub status: OrderStatus,
    pub description: Option<String>,
}

pub async fn force_status(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Json(payload): Json<ForceStatusPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.force_status(
        &payload.actor_id,
        &bill,
        payload.status,
        payload.description,
    )?;
    Ok(Json(ApiResponse::success(order)))
}

#[derive(Debug, Deserialize)]
pub struct SettlePayload {
    pub amount: Decimal,
    pub collected_by: String,
}

pub async fn settle_payment(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Json(payload): Json<SettlePayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .settle_payment(&bill, payload.amount, &payload.collected_by)?;
    Ok(Json(ApiResponse::success(order)))
}

#[derive(Debug, Deserialize)]
pub struct HandoverPayload {
    pub actor_id: String,
    pub pin: Option<String>,
}

pub async fn cash_handover(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Json(payload): Json<HandoverPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.services.orders.verify_cash_handover(
        &payload.actor_id,
        &bill,
        payload.pin.as_deref(),
    )?;
    Ok(Json(ApiResponse::success_with_message(
        outcome,
        "Handover verified; funds transferred",
    )))
}

#[derive(Debug, Deserialize)]
pub struct LogPayload {
    pub actor_id: String,
    pub description: String,
}

pub async fn add_log(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Json(payload): Json<LogPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .add_log(&payload.actor_id, &bill, &payload.description)?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn material_issue(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Json(payload): Json<LogPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .log_material_issue(&payload.actor_id, &bill, &payload.description)?;
    Ok(Json(ApiResponse::success(order)))
}

#[derive(Debug, Deserialize)]
pub struct StockEntryPayload {
    pub actor_id: String,
    pub description: String,
}

pub async fn stock_entry(
    State(state): State<AppState>,
    Json(payload): Json<StockEntryPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let breakdown = state.services.payouts.pay_material_incentive(
        &payload.actor_id,
        MaterialAction::StockEntry,
        &payload.description,
        None,
    )?;
    Ok(Json(ApiResponse::success(breakdown)))
}

#[derive(Debug, Deserialize)]
pub struct PriorityPayload {
    pub priority: Priority,
}

pub async fn set_priority(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Json(payload): Json<PriorityPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.set_priority(&bill, payload.priority)?;
    Ok(Json(ApiResponse::success(order)))
}

#[derive(Debug, Deserialize)]
pub struct NotesPayload {
    pub notes: String,
}

pub async fn set_notes(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Json(payload): Json<NotesPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.set_notes(&bill, payload.notes)?;
    Ok(Json(ApiResponse::success(order)))
}

#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor_id: String,
}

pub async fn remove(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.orders.delete(&query.actor_id, &bill)?;
    Ok(Json(ApiResponse::success_with_message((), "Order deleted")))
}
