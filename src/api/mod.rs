pub mod borrow;
pub mod health;
pub mod history;
pub mod returns;
pub mod stats;
pub mod stock;

use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::db::AppState;
use crate::services::ServiceError;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Stock editor
        .route("/stock", get(stock::list_stock).post(stock::upsert_stock))
        .route("/stock/:id", put(stock::set_stock_quantity))
        // Borrow / return workflow
        .route("/borrow", post(borrow::create_borrow))
        .route("/return/:id", post(returns::return_borrow))
        .route("/borrowed", get(returns::list_borrowed))
        // Reporting
        .route("/history", get(history::get_history))
        .route("/stats", get(stats::get_stats))
        .with_state(state)
}

/// Map a service error to a status code and an `{"error": ...}` body.
/// Storage failures are logged and collapsed to a generic 500.
pub(crate) fn error_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Database(detail) => {
            tracing::error!("storage failure: {}", detail);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            );
        }
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": err.to_string() })))
}
