use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error_response;
use crate::db::AppState;
use crate::services::loan_service::{self, HistoryFilter};

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub student: Option<String>,
    pub class_name: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub material: Option<String>,
    pub return_status: Option<String>,
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let filter = HistoryFilter {
        student: query.student,
        class_name: query.class_name,
        material: query.material,
        date_from: query.date_from,
        date_to: query.date_to,
        return_status: query.return_status,
    };

    let rows = loan_service::query_history(&state.conn, filter, state.clock.today())
        .await
        .map_err(error_response)?;

    Ok(Json(json!(rows)))
}
