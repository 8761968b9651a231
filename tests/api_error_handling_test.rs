use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tower::util::ServiceExt; // for `oneshot`

use stockroom::api;
use stockroom::clock::Clock;
use stockroom::db::{self, AppState};
use stockroom::models::material;

// Helper to create a test app state with a pinned date
async fn setup_test_state() -> AppState {
    let conn = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    AppState::with_clock(conn, Clock::Fixed(today))
}

// Helper to create a test material
async fn create_test_material(db: &DatabaseConnection, name: &str, quantity: i32) -> i32 {
    let item = material::ActiveModel {
        name: Set(name.to_string()),
        quantity_available: Set(quantity),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    item.insert(db).await.expect("Failed to create material").id
}

fn json_request(method: &str, uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let state = setup_test_state().await;
    let app = api::api_router(state);

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_borrow_unknown_material_returns_404() {
    let state = setup_test_state().await;
    let app = api::api_router(state);

    let payload = serde_json::json!({
        "student_name": "Jane Doe",
        "class_name": "Form 2",
        "section_or_trade": "A",
        "material_id": 999,
        "quantity": 1,
        "borrow_date": "2024-01-01"
    });
    let response = app
        .oneshot(json_request("POST", "/borrow", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Material not found");
}

#[tokio::test]
async fn test_borrow_insufficient_stock_returns_400() {
    let state = setup_test_state().await;
    let mop = create_test_material(&state.conn, "Mop", 2).await;
    let app = api::api_router(state);

    let payload = serde_json::json!({
        "student_name": "Jane Doe",
        "class_name": "Form 2",
        "section_or_trade": "A",
        "material_id": mop,
        "quantity": 5,
        "borrow_date": "2024-01-01"
    });
    let response = app
        .oneshot(json_request("POST", "/borrow", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Insufficient stock. Available: 2, Requested: 5"
    );
}

#[tokio::test]
async fn test_borrow_missing_fields_returns_400() {
    let state = setup_test_state().await;
    let broom = create_test_material(&state.conn, "Broom", 10).await;
    let app = api::api_router(state);

    let payload = serde_json::json!({
        "class_name": "Form 2",
        "section_or_trade": "A",
        "material_id": broom,
        "quantity": 1
    });
    let response = app
        .oneshot(json_request("POST", "/borrow", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "All fields are required");
}

#[tokio::test]
async fn test_return_flow_and_double_return_guard() {
    let state = setup_test_state().await;
    let broom = create_test_material(&state.conn, "Broom", 10).await;
    let app = api::api_router(state);

    let payload = serde_json::json!({
        "student_name": "Jane Doe",
        "class_name": "Form 2",
        "section_or_trade": "A",
        "material_id": broom,
        "quantity": 3,
        "borrow_date": "2024-01-01"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/borrow", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let borrow_id = body["borrow_id"].as_i64().expect("borrow_id missing");
    assert!(body["student_id"].is_i64());

    let uri = format!("/return/{}", borrow_id);
    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["return_date"], "2024-01-10");

    // Returning the same record again must be a 404, not a silent success
    let response = app
        .oneshot(json_request("POST", &uri, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Borrow record not found or already returned");
}

#[tokio::test]
async fn test_set_stock_quantity_validation() {
    let state = setup_test_state().await;
    let broom = create_test_material(&state.conn, "Broom", 10).await;
    let app = api::api_router(state);

    let uri = format!("/stock/{}", broom);
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            serde_json::json!({ "quantity_available": -1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/stock/999",
            serde_json::json!({ "quantity_available": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(json_request(
            "PUT",
            &uri,
            serde_json::json!({ "quantity_available": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["new_quantity"], 4);
}

#[tokio::test]
async fn test_upsert_stock_adds_instead_of_conflicting() {
    let state = setup_test_state().await;
    let app = api::api_router(state);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/stock",
            serde_json::json!({ "name": "Rake", "quantity": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["material"], "Rake");
    assert_eq!(body["quantity"], 5);

    // Posting the same name again adds to stock rather than erroring
    let response = app
        .oneshot(json_request(
            "POST",
            "/stock",
            serde_json::json!({ "name": "Rake", "quantity": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["quantity_added"], 3);
}

#[tokio::test]
async fn test_borrowed_list_reflects_open_loans() {
    let state = setup_test_state().await;
    let broom = create_test_material(&state.conn, "Broom", 10).await;
    let app = api::api_router(state);

    let payload = serde_json::json!({
        "student_name": "Jane Doe",
        "class_name": "Form 2",
        "section_or_trade": "A",
        "material_id": broom,
        "quantity": 3,
        "borrow_date": "2024-01-04"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/borrow", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get_request("/borrowed")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let rows = body.as_array().expect("expected an array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["material_name"], "Broom");
    assert_eq!(rows[0]["days_borrowed"], 6);
}

#[tokio::test]
async fn test_history_overdue_filter_via_query_string() {
    let state = setup_test_state().await;
    let broom = create_test_material(&state.conn, "Broom", 10).await;
    let app = api::api_router(state);

    for (student, date) in [("Jane Doe", "2024-01-01"), ("John Smith", "2024-01-08")] {
        let payload = serde_json::json!({
            "student_name": student,
            "class_name": "Form 2",
            "section_or_trade": "A",
            "material_id": broom,
            "quantity": 1,
            "borrow_date": date
        });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/borrow", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(get_request("/history?return_status=overdue"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let rows = body.as_array().expect("expected an array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["full_name"], "Jane Doe");
    assert_eq!(rows[0]["status"], "Overdue");
}
