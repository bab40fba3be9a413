//! xAI client tests against a local stand-in for the chat-completions API.

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use grok_chat::config::{ChatSettings, Variant};
use grok_chat::models::ChatMessage;
use grok_chat::services::providers::xai::{XaiChatProvider, XaiConfig};
use grok_chat::services::providers::{ChatProvider, ChatRequest, ProviderError};
use grok_chat::services::ChatService;
use grok_chat::startup::build_router;
use grok_chat::AppState;
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;

/// Authorization header and JSON body of the last completion request.
type Captured = Arc<Mutex<Option<(Option<String>, Value)>>>;

async fn completions(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *captured.lock().unwrap() = Some((auth, body));

    Json(json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "model": "grok-4-fast-reasoning",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Hello from **mock** xAI" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 21, "completion_tokens": 6, "total_tokens": 27 }
    }))
}

async fn rate_limited() -> impl IntoResponse {
    (StatusCode::TOO_MANY_REQUESTS, "slow down")
}

async fn unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, "Incorrect API key provided")
}

async fn no_choices() -> Json<Value> {
    Json(json!({ "model": "grok-4", "choices": [] }))
}

async fn spawn_mock_xai() -> (String, Captured) {
    let captured: Captured = Arc::default();

    let app = Router::new()
        .route("/ok/chat/completions", post(completions))
        .route("/limited/chat/completions", post(rate_limited))
        .route("/denied/chat/completions", post(unauthorized))
        .route("/empty/chat/completions", post(no_choices))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), captured)
}

fn provider(base_url: String, api_key: Option<&str>) -> XaiChatProvider {
    XaiChatProvider::new(XaiConfig {
        base_url,
        api_key: api_key.map(|k| Secret::new(k.to_string())),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn hello_request() -> ChatRequest {
    ChatRequest {
        model: "grok-4-fast-reasoning".to_string(),
        messages: vec![
            ChatMessage::system("You are Grok."),
            ChatMessage::user("Hello"),
        ],
    }
}

#[tokio::test]
async fn sends_bearer_key_model_and_messages() {
    let (base, captured) = spawn_mock_xai().await;
    let xai = provider(format!("{base}/ok"), Some("test-key"));

    let completion = xai.complete(&hello_request()).await.unwrap();

    assert_eq!(completion.content, "Hello from **mock** xAI");
    assert_eq!(completion.model, "grok-4-fast-reasoning");
    assert_eq!(completion.usage.input_tokens, 21);
    assert_eq!(completion.usage.output_tokens, 6);

    let (auth, body) = captured.lock().unwrap().take().unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(body["model"], "grok-4-fast-reasoning");
    assert_eq!(body["stream"], false);
    assert_eq!(
        body["messages"],
        json!([
            { "role": "system", "content": "You are Grok." },
            { "role": "user", "content": "Hello" }
        ])
    );
}

#[tokio::test]
async fn maps_429_to_rate_limited() {
    let (base, _) = spawn_mock_xai().await;
    let xai = provider(format!("{base}/limited"), Some("test-key"));

    let err = xai.complete(&hello_request()).await.unwrap_err();
    assert_eq!(err, ProviderError::RateLimited);
}

#[tokio::test]
async fn maps_error_status_to_api_error_with_body() {
    let (base, _) = spawn_mock_xai().await;
    let xai = provider(format!("{base}/denied"), Some("wrong-key"));

    let err = xai.complete(&hello_request()).await.unwrap_err();
    match err {
        ProviderError::ApiError(message) => {
            assert!(message.contains("401"), "{message}");
            assert!(message.contains("Incorrect API key provided"), "{message}");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choice_list_is_an_api_error() {
    let (base, _) = spawn_mock_xai().await;
    let xai = provider(format!("{base}/empty"), Some("test-key"));

    let err = xai.complete(&hello_request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::ApiError(_)));
}

#[tokio::test]
async fn missing_key_fails_before_any_request() {
    let (base, captured) = spawn_mock_xai().await;
    let xai = provider(format!("{base}/ok"), None);

    let err = xai.complete(&hello_request()).await.unwrap_err();
    assert_eq!(
        err,
        ProviderError::NotConfigured("XAI_API_KEY is not set".to_string())
    );
    assert!(captured.lock().unwrap().is_none());
    assert!(xai.health_check().await.is_err());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let xai = provider(format!("http://{addr}"), Some("test-key"));
    let err = xai.complete(&hello_request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::NetworkError(_)));
}

#[tokio::test]
async fn page_round_trip_through_xai_client() {
    let (base, captured) = spawn_mock_xai().await;
    let xai: Arc<dyn ChatProvider> = Arc::new(provider(format!("{base}/ok"), Some("test-key")));
    let chat = Arc::new(ChatService::new(xai, ChatSettings::new(Variant::Rich)));
    let app = build_router(AppState::new(chat));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("prompt=Hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains("<p>Hello from <strong>mock</strong> xAI</p>"));

    let (_, sent) = captured.lock().unwrap().take().unwrap();
    assert_eq!(sent["messages"][1]["content"], "Hello");
}
