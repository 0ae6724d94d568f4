//! Integration tests for `HttpModelClient` using wiremock HTTP mocks.

use kpulse_pipeline::{HttpModelClient, ModelClient, ModelRequest, PipelineError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ModelRequest {
    ModelRequest {
        prompt: "Translate: 방탄소년단 컴백".to_string(),
        max_tokens: 300,
        temperature: 0.3,
    }
}

#[tokio::test]
async fn posts_chat_request_and_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama-3.1-8b-instruct",
            "max_tokens": 300,
            "messages": [{"role": "user", "content": "Translate: 방탄소년단 컴백"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"title\": \"BTS\"}"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpModelClient::new(
        &format!("{}/v1/chat/completions", server.uri()),
        Some("sk-test"),
        "llama-3.1-8b-instruct",
        5,
    )
    .unwrap();

    let text = client.complete(&request()).await.expect("completion");
    assert_eq!(text, "{\"title\": \"BTS\"}");
}

#[tokio::test]
async fn non_success_status_is_a_model_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = HttpModelClient::new(&server.uri(), None, "m", 5).unwrap();
    let err = client.complete(&request()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Model(ref msg) if msg.contains("429")));
}

#[tokio::test]
async fn unexpected_payload_is_a_model_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let client = HttpModelClient::new(&server.uri(), None, "m", 5).unwrap();
    let err = client.complete(&request()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "model request failed: unrecognized response shape"
    );
}
