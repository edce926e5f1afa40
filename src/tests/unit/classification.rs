//! Gateway error classification tables

use rstest::rstest;

use crate::core::generation::{classify_gateway_error, ErrorClass, GenerationError};
use crate::core::llm::GatewayError;
use crate::core::plot::ParseError;

#[rstest]
#[case::timeout(GatewayError::Timeout, ErrorClass::Retryable)]
#[case::connection(GatewayError::Connection("reset by peer".into()), ErrorClass::Retryable)]
#[case::rate_limited(GatewayError::RateLimited { retry_after_secs: 30 }, ErrorClass::Retryable)]
#[case::server_error(GatewayError::ApiError { status: 500, message: String::new() }, ErrorClass::Retryable)]
#[case::bad_gateway(GatewayError::ApiError { status: 502, message: String::new() }, ErrorClass::Retryable)]
#[case::unavailable(GatewayError::ApiError { status: 503, message: String::new() }, ErrorClass::Retryable)]
#[case::too_many(GatewayError::ApiError { status: 429, message: String::new() }, ErrorClass::Retryable)]
#[case::not_found(GatewayError::ApiError { status: 404, message: String::new() }, ErrorClass::Fatal)]
#[case::gateway_timeout_status(GatewayError::ApiError { status: 504, message: String::new() }, ErrorClass::Fatal)]
#[case::auth(GatewayError::AuthError("bad key".into()), ErrorClass::Fatal)]
#[case::invalid_request(GatewayError::InvalidRequest("missing model".into()), ErrorClass::Fatal)]
#[case::invalid_response(GatewayError::InvalidResponse("no content".into()), ErrorClass::Fatal)]
#[case::not_configured(GatewayError::NotConfigured("no key".into()), ErrorClass::Fatal)]
#[case::provider_hint_true(
    GatewayError::Provider { message: "busy".into(), retryable: Some(true) },
    ErrorClass::Retryable
)]
#[case::provider_hint_false(
    GatewayError::Provider { message: "overloaded".into(), retryable: Some(false) },
    ErrorClass::Fatal
)]
#[case::provider_overloaded(
    GatewayError::Provider { message: "Model is overloaded".into(), retryable: None },
    ErrorClass::Retryable
)]
#[case::provider_policy(
    GatewayError::Provider { message: "content policy violation".into(), retryable: None },
    ErrorClass::Fatal
)]
fn test_classification(#[case] error: GatewayError, #[case] expected: ErrorClass) {
    assert_eq!(classify_gateway_error(&error), expected);
}

#[rstest]
#[case(GenerationError::TransientGateway(GatewayError::Timeout), "transient_gateway")]
#[case(GenerationError::FatalGateway(GatewayError::AuthError("x".into())), "fatal_gateway")]
#[case(GenerationError::ResponseParse(ParseError::NoJson), "response_parse")]
#[case(GenerationError::ContextRetrieval("down".into()), "context_retrieval")]
#[case(GenerationError::Cancelled, "cancelled")]
fn test_generation_error_kind(#[case] error: GenerationError, #[case] kind: &str) {
    assert_eq!(error.kind(), kind);
}
