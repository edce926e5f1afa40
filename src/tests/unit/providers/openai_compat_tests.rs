//! OpenAI-Compatible Gateway Unit Tests
//!
//! Tests for the HTTP adapter including:
//! - Request formatting (auth header, model, messages)
//! - Response parsing (content, usage, confidence)
//! - Status mapping (429, 401, 400, 5xx)
//! - Provider error bodies with retry hints

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::generation::{classify_gateway_error, ErrorClass};
use crate::core::llm::{GatewayError, GatewayRequest, OpenAiCompatibleGateway, TextGenerationGateway};

async fn gateway_for(server: &MockServer) -> OpenAiCompatibleGateway {
    OpenAiCompatibleGateway::new("sk-test", Some(format!("{}/v1", server.uri()))).unwrap()
}

fn request() -> GatewayRequest {
    GatewayRequest::new("gpt-4o", "You are a story architect.", "Outline this.")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o-2024-08-06",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 120, "completion_tokens": 45}
    })
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_successful_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "You are a story architect."},
                {"role": "user", "content": "Outline this."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"structure\": null}")))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway_for(&server).await.generate_text(request()).await.unwrap();

    assert_eq!(response.text, "{\"structure\": null}");
    assert_eq!(response.model, "gpt-4o-2024-08-06");
    let usage = response.usage.unwrap();
    assert_eq!(usage.input_tokens, 120);
    assert_eq!(usage.output_tokens, 45);
    assert!(response.confidence.is_none());
}

#[tokio::test]
async fn test_reported_confidence_is_passed_through() {
    let server = MockServer::start().await;
    let mut body = completion("{}");
    body["confidence"] = json!(0.75);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let response = gateway_for(&server).await.generate_text(request()).await.unwrap();
    assert_eq!(response.confidence, Some(0.75));
}

#[tokio::test]
async fn test_missing_content_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = gateway_for(&server).await.generate_text(request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse(_)));
    assert_eq!(classify_gateway_error(&err), ErrorClass::Fatal);
}

// =============================================================================
// Status Mapping
// =============================================================================

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let err = gateway_for(&server).await.generate_text(request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::RateLimited { retry_after_secs: 17 }));
    assert_eq!(classify_gateway_error(&err), ErrorClass::Retryable);
}

#[tokio::test]
async fn test_unauthorized_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = gateway_for(&server).await.generate_text(request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::AuthError(_)));
    assert_eq!(classify_gateway_error(&err), ErrorClass::Fatal);
}

#[tokio::test]
async fn test_bad_request_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown model"))
        .mount(&server)
        .await;

    let err = gateway_for(&server).await.generate_text(request()).await.unwrap_err();
    match err {
        GatewayError::InvalidRequest(message) => assert_eq!(message, "unknown model"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors_map_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&server)
        .await;

    let err = gateway_for(&server).await.generate_text(request()).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(classify_gateway_error(&err), ErrorClass::Retryable);
}

#[tokio::test]
async fn test_provider_error_body_carries_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "context length exceeded", "retryable": false}
        })))
        .mount(&server)
        .await;

    let err = gateway_for(&server).await.generate_text(request()).await.unwrap_err();
    match &err {
        GatewayError::Provider { message, retryable } => {
            assert_eq!(message, "context length exceeded");
            assert_eq!(*retryable, Some(false));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(classify_gateway_error(&err), ErrorClass::Fatal);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("{}"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let gateway = OpenAiCompatibleGateway::with_timeout(
        "sk-test",
        Some(format!("{}/v1", server.uri())),
        Duration::from_millis(50),
    )
    .unwrap();

    let err = gateway.generate_text(request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Timeout));
    assert_eq!(classify_gateway_error(&err), ErrorClass::Retryable);
}
