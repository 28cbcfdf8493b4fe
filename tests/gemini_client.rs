//! Integration tests for the Gemini REST client against a mock server
//!
//! Verifies the wire contract: endpoint path, API key header, system
//! instruction, role mapping, and how provider responses are interpreted.

use chat_relay::config::ModelConfig;
use chat_relay::models::{
    GeminiClient, ModelClient, ModelError, RequestEnvelope, SystemPrompt, Turn,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn create_client(server: &MockServer) -> GeminiClient {
    let config = ModelConfig {
        name: "gemini-test".to_string(),
        base_url: format!("{}/v1beta", server.uri()),
        api_key_env: "GEMINI_API_KEY".to_string(),
    };
    GeminiClient::new(
        &config,
        "test-key".to_string(),
        SystemPrompt::new("You are a travel planner.").unwrap(),
    )
    .expect("client should build")
}

fn text_response(parts: &[&str]) -> serde_json::Value {
    let parts: Vec<_> = parts.iter().map(|t| json!({"text": t})).collect();
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": parts},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_history_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "You are a travel planner."}]},
            "contents": [
                {"role": "user", "parts": [{"text": "Hello"}]},
                {"role": "model", "parts": [{"text": "Where to?"}]},
                {"role": "user", "parts": [{"text": "Lisbon"}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&["Great choice!"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server);
    let envelope = RequestEnvelope::History(vec![
        Turn::user("Hello"),
        Turn::model("Where to?"),
        Turn::user("Lisbon"),
    ]);

    let response = client.generate(&envelope).await.unwrap();
    assert!(response.has_content());
    assert_eq!(response.generated_text(), "Great choice!");
}

#[tokio::test]
async fn test_prompt_maps_to_single_user_turn() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Write a haiku"}]}]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_response(&["Old pond, ", "a frog"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server);
    let response = client
        .generate(&RequestEnvelope::Prompt("Write a haiku".to_string()))
        .await
        .unwrap();

    assert_eq!(response.generated_text(), "Old pond, a frog");
}

#[tokio::test]
async fn test_api_key_is_not_in_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(&["ok"])))
        .mount(&server)
        .await;

    let client = create_client(&server);
    client
        .generate(&RequestEnvelope::Prompt("hi".to_string()))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
    assert!(!requests[0].url.as_str().contains("test-key"));
}

#[tokio::test]
async fn test_prompt_block_reason_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let client = create_client(&server);
    let response = client
        .generate(&RequestEnvelope::Prompt("something unsafe".to_string()))
        .await
        .unwrap();

    assert!(!response.has_content());
    assert_eq!(response.block_reason(), Some("SAFETY"));
}

#[tokio::test]
async fn test_candidate_without_text_has_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        })))
        .mount(&server)
        .await;

    let response = create_client(&server)
        .generate(&RequestEnvelope::Prompt("hi".to_string()))
        .await
        .unwrap();

    assert!(!response.has_content());
    assert_eq!(response.block_reason(), None);
}

#[tokio::test]
async fn test_error_status_maps_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let err = create_client(&server)
        .generate(&RequestEnvelope::Prompt("hi".to_string()))
        .await
        .unwrap_err();

    match err {
        ModelError::Provider { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "API key not valid.");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_kept_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = create_client(&server)
        .generate(&RequestEnvelope::Prompt("hi".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ModelError::Provider { status: 502, ref message } if message == "Bad Gateway"
    ));
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = create_client(&server)
        .generate(&RequestEnvelope::Prompt("hi".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, ModelError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = ModelConfig {
        name: "gemini-test".to_string(),
        base_url: "http://127.0.0.1:1/v1beta".to_string(),
        api_key_env: "GEMINI_API_KEY".to_string(),
    };
    let client = GeminiClient::new(
        &config,
        "test-key".to_string(),
        SystemPrompt::new("You are a travel planner.").unwrap(),
    )
    .unwrap();

    let err = client
        .generate(&RequestEnvelope::Prompt("hi".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, ModelError::Transport(_)));
    assert!(!err.to_string().contains("test-key"));
}
