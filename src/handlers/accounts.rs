use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::errors::ServiceError;
use crate::services::accounts::{CreateAccountRequest, UpdateAccountRequest};
use crate::{ApiResponse, AppState, ListQuery};

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub identifier: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state
        .services
        .accounts
        .login(&payload.identifier, &payload.password)?;
    Ok(Json(ApiResponse::success(account)))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state.services.accounts.create(request)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(account))))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.accounts.list(query.role),
    )))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(state.services.accounts.get(&id)?)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state.services.accounts.update(&id, request)?;
    Ok(Json(ApiResponse::success(account)))
}

pub async fn manager_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.accounts.manager_stats(&id)?,
    )))
}

#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor_id: String,
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.accounts.deactivate(&query.actor_id, &id)?;
    Ok(Json(ApiResponse::success_with_message(
        (),
        "Account deactivated",
    )))
}
