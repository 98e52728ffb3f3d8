use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::errors::ServiceError;
use crate::services::customers::RegisterCustomerRequest;
use crate::{ApiResponse, AppState};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customers.register(request)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(state.services.customers.list())))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(state.services.customers.get(&id)?)))
}

pub async fn update_measurements(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customers.update_measurements(&id, fields)?;
    Ok(Json(ApiResponse::success(customer)))
}
