use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::api::error_response;
use crate::db::AppState;
use crate::services::loan_service;

pub async fn return_borrow(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let return_date = loan_service::close_loan(&state.conn, id, state.clock.today())
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "message": "Item returned successfully",
        "return_date": return_date,
    })))
}

pub async fn list_borrowed(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = loan_service::list_open_loans(&state.conn, state.clock.today())
        .await
        .map_err(error_response)?;

    Ok(Json(json!(rows)))
}
