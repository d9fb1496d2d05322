use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{DirectoryUploader, Engine, SqliteStore};
use migration::MigratorTrait;
use server::{ServerState, router};

async fn app_with(uploads: Option<std::path::PathBuf>) -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let mut builder = Engine::builder().store(SqliteStore::new(db));
    if let Some(root) = uploads {
        builder = builder.uploader(DirectoryUploader::new(root));
    }
    router(ServerState {
        engine: Arc::new(builder.build().unwrap()),
    })
}

async fn app() -> Router {
    app_with(None).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_wallet(app: &Router, name: &str, opening_minor: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/wallets",
        Some(json!({"name": name, "uid": "alice", "opening_amount_minor": opening_minor})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn expense_updates_wallet_balance() {
    let app = app().await;
    let wallet_id = create_wallet(&app, "Cash", 10000).await;

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({
            "type": "expense",
            "wallet_id": wallet_id,
            "amount_minor": 2550,
            "uid": "alice",
            "category": "groceries",
            "date": "2025-03-01T10:00:00+01:00",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["type"], json!("expense"));
    assert_eq!(body["data"]["amount_minor"], json!(2550));
    assert_eq!(body["data"]["date"], json!("2025-03-01T09:00:00Z"));
    let tx_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/wallets/{wallet_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount_minor"], json!(7450));
    assert_eq!(body["data"]["total_expenses_minor"], json!(2550));

    let (status, body) = send(&app, "GET", &format!("/transactions/{tx_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"], json!("groceries"));
}

#[tokio::test]
async fn insufficient_balance_is_422() {
    let app = app().await;
    let wallet_id = create_wallet(&app, "Cash", 100).await;

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({"type": "expense", "wallet_id": wallet_id, "amount_minor": 101})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["kind"], json!("insufficient_balance"));
    assert_eq!(body["message"], json!("Insufficient balance in wallet!"));
}

#[tokio::test]
async fn missing_amount_is_invalid() {
    let app = app().await;
    let wallet_id = create_wallet(&app, "Cash", 100).await;

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({"type": "income", "wallet_id": wallet_id})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], json!("validation"));
    assert_eq!(body["message"], json!("Invalid transaction data!"));
}

#[tokio::test]
async fn unknown_records_are_404() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/transactions/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Transaction not found"));

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({"type": "income", "wallet_id": "nope", "amount_minor": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Wallet not found"));
}

#[tokio::test]
async fn receipt_without_upload_target_is_502_and_rolled_back() {
    let app = app().await;
    let wallet_id = create_wallet(&app, "Cash", 1000).await;

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({
            "type": "expense",
            "wallet_id": wallet_id,
            "amount_minor": 300,
            "receipt": {"file_name": "r.jpg", "data_base64": STANDARD.encode(b"jpeg")},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], json!("upstream"));
    assert_eq!(body["message"], json!("Receipt uploads are not configured"));

    let (_, body) = send(&app, "GET", &format!("/wallets/{wallet_id}"), None).await;
    assert_eq!(body["data"]["amount_minor"], json!(1000));
    assert_eq!(body["data"]["total_expenses_minor"], json!(0));
}

#[tokio::test]
async fn receipt_is_stored_in_upload_directory() {
    let root = std::env::temp_dir().join(format!("api_uploads_{}", uuid::Uuid::new_v4()));
    let app = app_with(Some(root.clone())).await;
    let wallet_id = create_wallet(&app, "Cash", 1000).await;

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({
            "type": "income",
            "wallet_id": wallet_id,
            "amount_minor": 300,
            "receipt": {"file_name": "r.jpg", "data_base64": STANDARD.encode(b"jpeg")},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let image = body["data"]["image"].as_str().unwrap();
    assert!(image.starts_with("transactions/"));
    assert!(image.ends_with(".jpg"));
    assert_eq!(std::fs::read(root.join(image)).unwrap(), b"jpeg");
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn edit_moves_expense_to_another_wallet() {
    let app = app().await;
    let from = create_wallet(&app, "Cash", 10000).await;
    let to = create_wallet(&app, "Bank", 20000).await;

    let (_, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({"type": "expense", "wallet_id": from, "amount_minor": 4000, "uid": "alice"})),
    )
    .await;
    let tx_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({"id": tx_id, "type": "expense", "wallet_id": to, "amount_minor": 4000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["id"], json!(tx_id));

    let (_, body) = send(&app, "GET", "/users/alice/wallets", None).await;
    assert_eq!(body["data"]["total_balance_minor"], json!(26000));

    let (_, body) = send(&app, "GET", &format!("/wallets/{from}/transactions"), None).await;
    assert_eq!(body["data"], json!([]));
    let (_, body) = send(&app, "GET", &format!("/wallets/{to}/transactions"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn user_transactions_respect_limit() {
    let app = app().await;
    let wallet_id = create_wallet(&app, "Cash", 0).await;
    for day in 1..=3 {
        send(
            &app,
            "POST",
            "/transactions",
            Some(json!({
                "type": "income",
                "wallet_id": wallet_id,
                "amount_minor": 100,
                "uid": "alice",
                "date": format!("2025-03-0{day}T12:00:00Z"),
            })),
        )
        .await;
    }

    let (status, body) = send(&app, "GET", "/users/alice/transactions?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tx| tx["date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(dates, vec!["2025-03-03T12:00:00Z", "2025-03-02T12:00:00Z"]);

    let (status, body) = send(&app, "GET", "/users/alice/transactions?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("validation"));
}

#[tokio::test]
async fn wallet_requires_name() {
    let app = app().await;

    let (status, body) = send(&app, "POST", "/wallets", Some(json!({"uid": "alice"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], json!("Wallet name is required"));
}

#[tokio::test]
async fn rejected_body_gets_failure_envelope() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/transactions")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["kind"], json!("validation"));
    assert!(!body["message"].as_str().unwrap().is_empty());

    let (status, body) = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({"type": "transfer", "wallet_id": "w1", "amount_minor": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["kind"], json!("validation"));

    let (status, body) = send(&app, "POST", "/wallets", Some(json!({"name": 7}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], json!("validation"));
}

#[tokio::test]
async fn wallet_icon_is_stored_in_wallets_folder() {
    let root = std::env::temp_dir().join(format!("api_icons_{}", uuid::Uuid::new_v4()));
    let app = app_with(Some(root.clone())).await;

    let (status, body) = send(
        &app,
        "POST",
        "/wallets",
        Some(json!({
            "name": "Cash",
            "uid": "alice",
            "icon": {"file_name": "cash.png", "data_base64": STANDARD.encode(b"png")},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let image = body["data"]["image"].as_str().unwrap();
    assert!(image.starts_with("wallets/"));
    assert!(root.join(image).exists());
    let _ = std::fs::remove_dir_all(&root);
}
