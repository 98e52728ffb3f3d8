use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

pub async fn for_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(
        state.services.notifications.for_account(&account_id)?,
    )))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.notifications.mark_read(id)?;
    Ok(Json(ApiResponse::success_with_message((), "Marked read")))
}
