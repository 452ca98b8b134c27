use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::AppState;

/// Liveness plus a round trip to the city store
pub async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.store.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}
