//! HTTP transport tests driving the router directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use askdb::api;
use askdb::llm::ScriptedGateway;
use askdb::pipeline::QueryPipeline;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rusqlite::Connection;
use tower::ServiceExt;
use uuid::Uuid;

const MAX_UPLOAD: usize = 16 * 1024 * 1024;

fn test_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("askdb_api_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn sales_database_bytes(dir: &Path) -> Vec<u8> {
    let path = dir.join("source.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE sales (id INTEGER PRIMARY KEY, amount REAL, quarter TEXT);
         INSERT INTO sales (amount, quarter) VALUES (1200.0, 'Q1');
         INSERT INTO sales (amount, quarter) VALUES (800.0, 'Q1');",
    )
    .unwrap();
    drop(conn);
    std::fs::read(&path).unwrap()
}

fn app_in(dir: &Path, gateway: Arc<ScriptedGateway>) -> Router {
    let pipeline = Arc::new(QueryPipeline::new(
        gateway,
        dir.join("uploaded_database.db"),
    ));
    api::router(pipeline, MAX_UPLOAD)
}

fn multipart_request(part_name: &str, filename: &str, contents: &[u8]) -> Request<Body> {
    let boundary = "askdb-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{part_name}\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload_database")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn question_request(question: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process_question")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "question": question }).to_string(),
        ))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let dir = test_dir();
    let app = app_in(&dir, Arc::new(ScriptedGateway::new(Vec::<String>::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn upload_without_a_file_part_is_rejected() {
    let dir = test_dir();
    let app = app_in(&dir, Arc::new(ScriptedGateway::new(Vec::<String>::new())));

    let response = app
        .oneshot(multipart_request("attachment", "sales.db", b"ignored"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No file part");
}

#[tokio::test]
async fn upload_with_wrong_extension_is_rejected() {
    let dir = test_dir();
    let bytes = sales_database_bytes(&dir);
    let app = app_in(&dir, Arc::new(ScriptedGateway::new(Vec::<String>::new())));

    let response = app
        .oneshot(multipart_request("file", "sales.csv", &bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid file type");
}

#[tokio::test]
async fn question_before_upload_is_rejected() {
    let dir = test_dir();
    let app = app_in(&dir, Arc::new(ScriptedGateway::new(Vec::<String>::new())));

    let response = app
        .oneshot(question_request("What is the total sales for Q1?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No database uploaded yet");
}

#[tokio::test]
async fn upload_then_question_round_trip() {
    let dir = test_dir();
    let bytes = sales_database_bytes(&dir);
    let gateway = Arc::new(ScriptedGateway::new([
        "### Response:\nselect sum(amount) from sales where quarter = 'Q1'",
        "### Natural Language Description:\nQ1 sales total 2000.",
    ]));
    let app = app_in(&dir, gateway);

    let response = app
        .clone()
        .oneshot(multipart_request("file", "sales.db", &bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Database uploaded successfully");

    let response = app
        .oneshot(question_request("What is the total sales for Q1?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["query"],
        "SELECT sum(amount) FROM sales WHERE quarter = 'Q1';"
    );
    assert_eq!(json["result"][0]["sum(amount)"], 2000.0);
    assert_eq!(json["interpretation"], "Q1 sales total 2000.");
}

#[tokio::test]
async fn execution_errors_are_absorbed_into_the_response_payload() {
    let dir = test_dir();
    let bytes = sales_database_bytes(&dir);
    let gateway = Arc::new(ScriptedGateway::new([
        "### Response:\nSELECT nonexistent FROM sales",
    ]));
    let app = app_in(&dir, gateway.clone());

    let response = app
        .clone()
        .oneshot(multipart_request("file", "sales.db", &bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(question_request("What is the nonexistent value?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("no such column"), "got: {}", message);
    assert!(json.get("interpretation").is_none());
    assert_eq!(gateway.call_count(), 1);
}
