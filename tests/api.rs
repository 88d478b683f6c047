mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::{harness, harness_with, Harness, UnreachableStore, FAQ_CSV};
use docchat::api::create_router;
use docchat::domain::ports::ConversationStore;
use docchat::infrastructure::InMemoryConversationStore;

fn app(h: &Harness) -> Router {
    create_router(h.state.clone())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn upload(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "docchat-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/api/v1/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_and_readiness() {
    let h = harness("ok");

    let (status, body) = send_json(app(&h), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send_json(app(&h), get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_upload_then_search() {
    let h = harness("ok");

    let (status, body) = send_json(app(&h), upload("faq.csv", FAQ_CSV.as_bytes())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document_name"], "faq.csv");
    assert_eq!(body["chunks_added"], 4);
    assert!(h.dir.path().join("uploads/faq.csv").exists());

    let (status, body) = send_json(
        app(&h),
        post_json("/api/v1/search", json!({ "query": "refund policy", "limit": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["source"], "faq.csv");
    assert!(results[0]["content"].as_str().unwrap().contains("refund"));
}

#[tokio::test]
async fn test_unsupported_upload_is_415() {
    let h = harness("ok");

    let (status, body) = send_json(app(&h), upload("notes.txt", b"hello")).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "unsupported_file_type");
    assert_eq!(h.state.index.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_chat_defaults_to_thread_one() {
    let h = harness("Within 30 days.");

    let (status, body) = send_json(
        app(&h),
        post_json("/api/v1/chat", json!({ "question": "What is the refund policy?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Within 30 days.");
    assert_eq!(body["thread_id"], "1");
    assert_eq!(h.conversations.load("1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_retried_chat_request_is_stored_once() {
    let h = harness("ok");
    let request = json!({
        "question": "hi?",
        "thread_id": "t-retry",
        "request_id": "0b6f0d5e-7a4b-4d3c-9a4e-3f1f4c2a9e11",
    });

    for _ in 0..2 {
        let (status, _) = send_json(app(&h), post_json("/api/v1/chat", request.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(h.conversations.load("t-retry").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_blank_question_is_400() {
    let h = harness("ok");

    let (status, body) = send_json(
        app(&h),
        post_json("/api/v1/chat", json!({ "question": "  ", "thread_id": "t" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_generation_failure_is_502_and_stores_nothing() {
    let h = harness("ok");
    h.llm.set_failing(true);

    let (status, body) = send_json(
        app(&h),
        post_json("/api/v1/chat", json!({ "question": "hi?", "thread_id": "t-502" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "generation_error");
    assert!(h.conversations.load("t-502").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_stream_emits_tokens_then_done() {
    let h = harness("Orders ship in five business days.");

    let (status, bytes) = send(
        app(&h),
        post_json(
            "/api/v1/chat/stream",
            json!({ "question": "shipping?", "thread_id": "t-sse" }),
        ),
    )
    .await;
    let body = String::from_utf8(bytes).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: token"));
    assert!(body.contains("\"content\":\"Orders \""));
    assert!(body.trim_end().rsplit("\n\n").next().unwrap().contains("event: done"));

    let log = h.conversations.load("t-sse").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].content, "Orders ship in five business days.");
}

#[tokio::test]
async fn test_thread_endpoints() {
    let h = harness("ok");

    let (status, body) = send_json(
        app(&h),
        Request::post("/api/v1/threads").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let thread_id = body["thread_id"].as_str().unwrap().to_string();

    let (_, body) = send_json(app(&h), get("/api/v1/threads")).await;
    assert_eq!(body["threads"], json!([]));

    send_json(
        app(&h),
        post_json("/api/v1/chat", json!({ "question": "hello?", "thread_id": thread_id })),
    )
    .await;

    let (_, body) = send_json(app(&h), get("/api/v1/threads")).await;
    assert_eq!(body["threads"], json!([thread_id]));

    let (status, body) = send_json(
        app(&h),
        get(&format!("/api/v1/threads/{thread_id}/messages")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hello?");
    assert_eq!(messages[1]["role"], "assistant");
}

#[tokio::test]
async fn test_chat_stream_reports_provider_error_instead_of_done() {
    let h = harness("Orders ship in five business days.");
    h.llm.set_fail_mid_stream(true);

    let (status, bytes) = send(
        app(&h),
        post_json(
            "/api/v1/chat/stream",
            json!({ "question": "shipping?", "thread_id": "t-sse-err" }),
        ),
    )
    .await;
    let body = String::from_utf8(bytes).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: token"));
    assert!(body.contains("event: error"));
    assert!(body.contains("\"error\":\"generation_error\""));
    assert!(!body.contains("event: done"));
    assert!(h.conversations.load("t-sse-err").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_generation_timeout_is_504() {
    let h = harness_with(
        "ok",
        Arc::new(InMemoryConversationStore::new()),
        Duration::from_millis(50),
    );
    h.llm.set_delay(Duration::from_secs(5));

    let (status, body) = send_json(
        app(&h),
        post_json("/api/v1/chat", json!({ "question": "hi?", "thread_id": "t-504" })),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "generation_error");
    assert!(h.conversations.load("t-504").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_is_503() {
    let h = harness_with("ok", Arc::new(UnreachableStore), Duration::from_secs(60));

    let (status, body) = send_json(
        app(&h),
        post_json("/api/v1/chat", json!({ "question": "hi?", "thread_id": "t-503" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "store_error");

    let (status, body) = send_json(app(&h), get("/api/v1/threads")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "store_error");

    let (status, body) = send_json(app(&h), get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["conversation_store"], "disconnected");
}
