use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "environment": state.config.environment,
        "orders": state.store.orders.len(),
        "accounts": state.store.accounts.len(),
    }))
}
