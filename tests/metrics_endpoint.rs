//! Integration tests for /metrics instrumentation
//!
//! Sends real requests through the router, then scrapes /metrics and checks
//! that each outcome landed under the right labels.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chat_relay::{
    config::{Config, RelayMode},
    handlers::{self, AppState},
    metrics::Outcome,
    models::{ModelClient, ModelError, ModelHandle, ProviderResponse, RequestEnvelope},
};
use std::sync::Arc;
use tower::ServiceExt;

/// Answers "ok" unless the prompt is "block"
struct KeywordClient;

#[async_trait]
impl ModelClient for KeywordClient {
    async fn generate(&self, envelope: &RequestEnvelope) -> Result<ProviderResponse, ModelError> {
        match envelope {
            RequestEnvelope::Prompt(text) if text == "block" => {
                Ok(ProviderResponse::blocked(Some("SAFETY".to_string())))
            }
            RequestEnvelope::Prompt(text) if text == "fail" => {
                Err(ModelError::Decode("bad body".to_string()))
            }
            _ => Ok(ProviderResponse::text("ok")),
        }
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

fn create_test_state() -> AppState {
    let mut config = Config::default();
    config.relay.mode = RelayMode::Prompt;
    AppState::new(Arc::new(config), ModelHandle::ready(KeywordClient))
        .expect("should create AppState")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn prompt_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_outcomes_are_recorded_per_label() {
    let state = create_test_state();
    let app = handlers::router(state.clone());

    for body in [
        r#"{"prompt": "hello"}"#,
        r#"{"prompt": "hello again"}"#,
        r#"{"prompt": "block"}"#,
        r#"{"prompt": "fail"}"#,
        r#"{"prompt": 7}"#,
    ] {
        send(app.clone(), prompt_request(body)).await;
    }

    let metrics = state.metrics();
    assert_eq!(metrics.request_count(RelayMode::Prompt, Outcome::Success), 2);
    assert_eq!(metrics.request_count(RelayMode::Prompt, Outcome::Blocked), 1);
    assert_eq!(metrics.request_count(RelayMode::Prompt, Outcome::Failed), 1);
    assert_eq!(metrics.request_count(RelayMode::Prompt, Outcome::BadRequest), 1);

    // Only calls that reached the model are timed
    assert_eq!(metrics.generation_count(Outcome::Success), 2);
    assert_eq!(metrics.generation_count(Outcome::BadRequest), 0);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_counters() {
    let state = create_test_state();
    let app = handlers::router(state);

    send(app.clone(), prompt_request(r#"{"prompt": "hello"}"#)).await;

    let (status, body) = send(
        app,
        Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"chat_relay_requests_total{mode="prompt",outcome="success"} 1"#));
    assert!(body.contains(r#"chat_relay_generation_duration_ms_count{outcome="success"} 1"#));
}

#[tokio::test]
async fn test_health_and_preflight_are_not_counted() {
    let state = create_test_state();
    let app = handlers::router(state.clone());

    send(
        app.clone(),
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    send(
        app,
        Request::builder()
            .method("OPTIONS")
            .uri("/generate")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let output = state.metrics().gather().unwrap();
    assert!(!output.contains("chat_relay_requests_total{"));
}
