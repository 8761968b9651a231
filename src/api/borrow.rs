use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::api::error_response;
use crate::db::AppState;
use crate::models::loan::BorrowDto;
use crate::services::loan_service;

pub async fn create_borrow(
    State(state): State<AppState>,
    Json(payload): Json<BorrowDto>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let created = loan_service::create_loan(&state.conn, payload, state.clock.today())
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Borrow record created successfully",
            "borrow_id": created.loan_id,
            "student_id": created.borrower_id,
        })),
    ))
}
