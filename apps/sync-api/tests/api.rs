//! End-to-end tests over the router with an in-memory database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use stockbook_db::{Database, DbConfig};
use stockbook_sync_api::auth::JwtValidator;
use stockbook_sync_api::config::ApiConfig;
use stockbook_sync_api::routes;
use stockbook_sync_api::state::AppState;

fn test_config() -> ApiConfig {
    ApiConfig {
        http_port: 0,
        database_path: ":memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        request_timeout_secs: 30,
        db_acquire_timeout_secs: 5,
        sync_batch_limit: 100,
    }
}

async fn test_app() -> (axum::Router, String) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = test_config();
    let token = JwtValidator::new(config.jwt_secret.clone())
        .issue("u1", 300)
        .unwrap();
    (routes::router(AppState::new(db, config)), token)
}

async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_open() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_sync_requires_a_token() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(
            Request::get("/sync/download/u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_download_is_scoped_to_the_token_owner() {
    let (app, token) = test_app().await;

    let response = app
        .oneshot(
            Request::get("/sync/download/somebody-else")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_incremental_upload_and_changes_round_trip() {
    let (app, token) = test_app().await;

    let upload = json!({
        "data": {
            "products": [{
                "id": "p1", "userId": "x", "name": "Valve", "quantity": 10,
                "retailPrice": 500.0, "wholesalePrice": 450.0,
                "purchasePrice": 4000.0, "perUnitPurchasePrice": 400.0,
                "createdAt": "2026-08-01T10:00:00Z",
                "updatedAt": "2026-08-01T10:00:00Z"
            }]
        },
        "lastSyncTimestamp": "2026-08-30T09:00:00Z"
    });

    let response = app
        .clone()
        .oneshot(
            Request::post("/sync/incremental-upload")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(upload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["results"]["created"], 1);

    // The created row comes back on the change feed.
    let response = app
        .oneshot(
            Request::get("/sync/changes/u1/2026-08-30T00:00:00Z")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["data"]["products"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bad_change_cursor_is_rejected() {
    let (app, token) = test_app().await;

    let response = app
        .oneshot(
            Request::get("/sync/changes/u1/yesterday")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_batch_is_rejected() {
    let (app, token) = test_app().await;

    let rows: Vec<Value> = (0..101).map(|i| json!({ "id": format!("p{i}") })).collect();
    let upload = json!({
        "data": { "products": rows },
        "lastSyncTimestamp": "2026-08-30T09:00:00Z"
    });

    let response = app
        .oneshot(
            Request::post("/sync/incremental-upload")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(upload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
