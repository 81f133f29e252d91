//! Router-level tests driving the API with in-memory collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tower::ServiceExt;

use quill_core::error::{QuillError, QuillResult};
use quill_core::traits::{GenerationRequest, GenerationResponse, TextStream, TrendSource};
use quill_core::{SqliteContentStore, StubPublisher, TextGenerator};
use quill_server::{create_server, AppState};
use quill_trends::TrendsService;

/// Echoes prompts and records the credential each call carried.
#[derive(Default)]
struct EchoGenerator {
    keys: Mutex<Vec<String>>,
}

impl EchoGenerator {
    fn record(&self, request: &GenerationRequest) {
        self.keys
            .lock()
            .unwrap()
            .push(request.api_key.expose_secret().clone());
    }
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> QuillResult<GenerationResponse> {
        self.record(request);
        Ok(GenerationResponse {
            text: format!("echo: {}", request.prompt),
            usage: None,
        })
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> QuillResult<TextStream> {
        self.record(request);
        let items = vec![
            Ok("Hello".to_string()),
            Ok(" world".to_string()),
            Err(QuillError::llm("stream cut")),
        ];
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

struct FailingTrends;

#[async_trait]
impl TrendSource for FailingTrends {
    async fn trending_searches(&self) -> QuillResult<Vec<String>> {
        Err(QuillError::trends("offline"))
    }

    fn source_name(&self) -> &str {
        "failing"
    }
}

struct TestApp {
    router: Router,
    generator: Arc<EchoGenerator>,
}

fn app_with_key(default_key: Option<&str>) -> TestApp {
    let generator = Arc::new(EchoGenerator::default());
    let state = AppState::new(
        Arc::new(SqliteContentStore::in_memory().unwrap()),
        generator.clone(),
        Arc::new(TrendsService::new(Arc::new(FailingTrends), 6)),
        Arc::new(StubPublisher::new()),
    )
    .with_default_api_key(default_key.map(str::to_string));

    TestApp {
        router: create_server(state, &["http://localhost:3000".to_string()]),
        generator,
    }
}

fn app() -> TestApp {
    app_with_key(None)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(router, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn post_body(title: &str, platform: &str, text: &str) -> Value {
    json!({
        "title": title,
        "platform": platform,
        "content_type": "post",
        "content_text": text,
    })
}

#[tokio::test]
async fn test_health_reports_count() {
    let app = app();
    send(&app.router, Method::POST, "/content/", Some(post_body("A", "twitter", "a"))).await;

    let (status, body) = send(&app.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["content_count"], 1);
    assert_eq!(body["model"], "echo");
}

#[tokio::test]
async fn test_content_version_flow() {
    let app = app();
    let router = &app.router;

    let (status, v1) = send(router, Method::POST, "/content", Some(post_body("Launch Post", "twitter", "v1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v1["version"], 1);
    assert_eq!(v1["is_latest"], true);

    let (_, v2) = send(router, Method::POST, "/content/", Some(post_body("Launch Post", "twitter", "v2"))).await;
    assert_eq!(v2["version"], 2);

    let uri = format!("/content/{}", v2["id"]);
    let (status, v3) = send(router, Method::PUT, &uri, Some(json!({ "content_text": "v3" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v3["version"], 3);
    assert_eq!(v3["title"], "Launch Post");
    assert_eq!(v3["content_text"], "v3");

    let (_, old) = send(router, Method::GET, &uri, None).await;
    assert_eq!(old["is_latest"], false);
    assert_eq!(old["content_text"], "v2");

    let (status, versions) = send(router, Method::GET, "/content/versions/Launch%20Post/twitter", None).await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<i64> = versions
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["version"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![3, 2, 1]);

    let (_, latest) = send(router, Method::GET, "/content", None).await;
    assert_eq!(latest.as_array().unwrap().len(), 1);

    let (_, all) = send(router, Method::GET, "/content?latest_only=false", None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_missing_field_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/content",
        Some(json!({ "title": "A", "platform": "twitter", "content_type": "post" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("content_text"));
}

#[tokio::test]
async fn test_list_filters() {
    let app = app();
    let router = &app.router;
    send(router, Method::POST, "/content", Some(post_body("A", "Twitter", "a"))).await;
    send(router, Method::POST, "/content", Some(post_body("B", "LinkedIn", "b"))).await;

    let (_, twit) = send(router, Method::GET, "/content?platform=twit", None).await;
    assert_eq!(twit.as_array().unwrap().len(), 1);
    assert_eq!(twit[0]["platform"], "Twitter");

    let (_, all) = send(router, Method::GET, "/content?platform=all", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, body) = send(router, Method::GET, "/content?date=2024-02-30", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid date format. Use YYYY-MM-DD");

    let (_, none) = send(router, Method::GET, "/content?date=1999-01-01", None).await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_entries_are_not_found() {
    let app = app();
    let router = &app.router;

    let (status, body) = send(router, Method::GET, "/content/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "CNT_001");

    let (status, _) = send(router, Method::PUT, "/content/99", Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(router, Method::DELETE, "/content/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(router, Method::GET, "/content/versions/none/twitter", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_latest_leaves_group_without_latest() {
    let app = app();
    let router = &app.router;
    send(router, Method::POST, "/content", Some(post_body("A", "twitter", "a1"))).await;
    let (_, v2) = send(router, Method::POST, "/content", Some(post_body("A", "twitter", "a2"))).await;

    let (status, body) = send(router, Method::DELETE, &format!("/content/{}", v2["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Content deleted successfully");

    let (_, latest) = send(router, Method::GET, "/content", None).await;
    assert!(latest.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_without_any_key_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/gemini/generate",
        Some(json!({ "message": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "No API key provided");
    assert!(app.generator.keys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_appends_context_and_prefers_request_key() {
    let app = app_with_key(Some("server-key"));
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/gemini/generate",
        Some(json!({ "message": "Summarize", "context": "notes.md", "apiKey": "client-key" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        "echo: Summarize\n\nContext (selected files):\nnotes.md"
    );

    send(&app.router, Method::POST, "/gemini/generate", Some(json!({ "message": "again" }))).await;
    let keys = app.generator.keys.lock().unwrap().clone();
    assert_eq!(keys, vec!["client-key", "server-key"]);
}

#[tokio::test]
async fn test_stream_emits_ndjson_lines() {
    let app = app_with_key(Some("server-key"));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/gemini/stream")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "prompt": "greet" }).to_string()))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-ndjson"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let lines: Vec<Value> = String::from_utf8(bytes.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["response"], "Hello");
    assert_eq!(lines[1]["response"], " world");
    assert!(lines[2]["error"].as_str().unwrap().contains("stream cut"));
}

#[tokio::test]
async fn test_trends_fall_back_when_upstream_fails() {
    let app = app();
    let (status, body) = send(&app.router, Method::GET, "/trends?area=technology", None).await;

    assert_eq!(status, StatusCode::OK);
    let topics: Vec<&str> = body["trends"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["topic"].as_str().unwrap())
        .collect();
    assert_eq!(
        topics,
        vec!["Technology Updates", "Technology News", "Technology Discussion"]
    );
}

#[tokio::test]
async fn test_post_content_stub() {
    let app = app();
    let router = &app.router;

    let (status, body) = send(
        router,
        Method::POST,
        "/post-content/",
        Some(json!({ "content": "Shipping today", "platform": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["platform"], "Twitter/X");
    assert_eq!(body["mock"], true);

    let (status, body) = send(
        router,
        Method::POST,
        "/post-content",
        Some(json!({ "content": "hi", "platform": "myspace" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Unsupported platform: myspace");

    let (status, body) = send(router, Method::POST, "/post-content", Some(json!({ "platform": "threads" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Content and platform are required");
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
    assert!(response.headers().contains_key("x-request-id"));
}
