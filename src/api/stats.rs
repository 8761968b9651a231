use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::api::error_response;
use crate::db::AppState;
use crate::services::stats_service;

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let stats = stats_service::get_stats(&state.conn, state.clock.today())
        .await
        .map_err(error_response)?;

    Ok(Json(json!(stats)))
}
