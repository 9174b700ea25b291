//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sift_core::ai::{ExtractionClient, MockBackend};
use sift_core::db::Database;
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

fn open_config() -> ServerConfig {
    ServerConfig {
        require_auth: false,
        allowed_origins: vec![],
        api_keys: vec![],
    }
}

fn setup_test_app() -> (Database, Router) {
    let db = Database::in_memory().unwrap();
    let app = create_router(
        db.clone(),
        Some(ExtractionClient::Mock(MockBackend::new())),
        open_config(),
    );
    (db, app)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_upload(file_bytes: &[u8], name: Option<&str>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"statement.pdf\"\r\nContent-Type: application/pdf\r\n\r\n",
            BOUNDARY
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(b"\r\n");
    if let Some(name) = name {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{}\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/statements")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

// ========== Auth Tests ==========

#[tokio::test]
async fn test_unauthorized_without_credentials() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        api_keys: vec!["test-key-123".to_string()],
    };
    let app = create_router(db, None, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/statements")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_key_authenticates() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        api_keys: vec!["test-key-123".to_string()],
    };
    let app = create_router(db, None, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/statements")
                .header("authorization", "Bearer test-key-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_api_key_rejected() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        api_keys: vec!["test-key-123".to_string()],
    };
    let app = create_router(db, None, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/statements")
                .header("authorization", "Bearer wrong-key-456")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_identity_header_authenticates() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        api_keys: vec![],
    };
    let app = create_router(db, None, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["user"], "alice@example.com");
    assert_eq!(json["auth_method"], "identity_header");
}

// ========== Upload Tests ==========

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let (_db, app) = setup_test_app();

    let response = app
        .oneshot(multipart_upload(b"this is not a pdf", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("not a PDF"));
}

#[tokio::test]
async fn test_upload_rejects_missing_file() {
    let (_db, app) = setup_test_app();

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nJanuary\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/statements")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== List/Detail Tests ==========

#[tokio::test]
async fn test_list_statements_scoped_by_owner() {
    let (db, app) = setup_test_app();
    db.create_statement("alice@example.com", Some("Alice Jan"), "alice text")
        .unwrap();
    db.create_statement("bob@example.com", Some("Bob Jan"), "bob text")
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/statements")
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let statements = json.as_array().unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0]["display_name"], "Alice Jan");
    assert_eq!(statements[0]["process_stage"], "uploaded");
}

#[tokio::test]
async fn test_statement_details_not_found() {
    let (_db, app) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/statements/9999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_statement_details_hidden_from_other_owner() {
    let (db, app) = setup_test_app();
    let id = db
        .create_statement("alice@example.com", None, "alice text")
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/statements/{}", id))
                .header("x-authenticated-user", "mallory@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Processing Tests ==========

#[tokio::test]
async fn test_process_statement_happy_path() {
    let (db, app) = setup_test_app();
    let id = db
        .create_statement("alice@example.com", None, "statement text")
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/statements/{}/process", id))
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["transaction_count"], 2);
    // Mock: 1250.00 deposited, 85.25 withdrawn, stored as cents
    assert_eq!(json["data"]["metrics"]["balance_minor"], 116475);

    // Details now include transactions and insights
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/statements/{}", id))
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["process_stage"], "completed");
    assert_eq!(json["transactions"].as_array().unwrap().len(), 2);
    assert!(!json["insights"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_process_statement_not_found() {
    let (_db, app) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/statements/9999/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_process_statement_twice_conflicts() {
    let (db, app) = setup_test_app();
    let id = db
        .create_statement("alice@example.com", None, "statement text")
        .unwrap();

    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/statements/{}/process", id))
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/statements/{}/process", id))
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_process_failure_returns_error_body() {
    let db = Database::in_memory().unwrap();
    let id = db
        .create_statement("alice@example.com", None, "statement text")
        .unwrap();
    let app = create_router(
        db.clone(),
        Some(ExtractionClient::Mock(MockBackend::failing_extraction())),
        open_config(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/statements/{}/process", id))
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
    // Caller-facing message is fixed; backend detail stays in the logs
    assert_eq!(json["error"], "Failed to process statement");
    assert!(!json["error"].as_str().unwrap().contains("Mock"));

    // The statement is now failed
    let statement = db.get_statement(id).unwrap().unwrap();
    assert_eq!(
        statement.process_stage,
        sift_core::models::ProcessStage::Failed
    );
}

#[tokio::test]
async fn test_process_without_backend_unavailable() {
    let db = Database::in_memory().unwrap();
    let id = db
        .create_statement("alice@example.com", None, "statement text")
        .unwrap();
    let app = create_router(db, None, open_config());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/statements/{}/process", id))
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ========== Delete Tests ==========

#[tokio::test]
async fn test_delete_statement() {
    let (db, app) = setup_test_app();
    let id = db
        .create_statement("alice@example.com", None, "text")
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/statements/{}", id))
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/statements/{}", id))
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Extraction Health Tests ==========

#[tokio::test]
async fn test_extraction_health_with_mock() {
    let (_db, app) = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/extraction/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["configured"], true);
    assert_eq!(json["available"], true);
    assert_eq!(json["model"], "mock");
}

#[tokio::test]
async fn test_extraction_health_unconfigured() {
    let db = Database::in_memory().unwrap();
    let app = create_router(db, None, open_config());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/extraction/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["configured"], false);
    assert_eq!(json["available"], false);
}

// ========== Audit Tests ==========

#[tokio::test]
async fn test_audit_log_records_access() {
    let (db, app) = setup_test_app();
    db.create_statement("alice@example.com", None, "text")
        .unwrap();

    // A list call writes an audit row
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/statements")
                .header("x-authenticated-user", "alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/audit?limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let entries = json.as_array().unwrap();
    assert!(!entries.is_empty());
    assert_eq!(entries[0]["action"], "list");
    assert_eq!(entries[0]["user_id"], "alice@example.com");
}
