use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error_response;
use crate::db::AppState;
use crate::models::material::UpsertStockDto;
use crate::services::stock_service;

pub async fn list_stock(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let materials = stock_service::list_materials(&state.conn)
        .await
        .map_err(error_response)?;

    Ok(Json(json!(materials)))
}

pub async fn upsert_stock(
    State(state): State<AppState>,
    Json(payload): Json<UpsertStockDto>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let outcome = stock_service::upsert_material(&state.conn, payload)
        .await
        .map_err(error_response)?;

    if outcome.created {
        Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "New material added successfully",
                "material_id": outcome.material.id,
                "material": outcome.material.name,
                "quantity": outcome.material.quantity_available,
            })),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Stock updated successfully",
                "material": outcome.material.name,
                "quantity_added": outcome.quantity_added,
            })),
        ))
    }
}

#[derive(Deserialize)]
pub struct SetQuantityPayload {
    pub quantity_available: Option<i32>,
}

pub async fn set_stock_quantity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SetQuantityPayload>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let material = stock_service::set_quantity(&state.conn, id, payload.quantity_available)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "message": "Stock quantity updated successfully",
        "material_id": material.id,
        "new_quantity": material.quantity_available,
    })))
}
