//! LLM Provider Unit Tests
//!
//! Uses wiremock for HTTP mocking to test:
//! - Request formatting
//! - Response parsing (content, usage, confidence)
//! - Status code to `GatewayError` mapping

mod openai_compat_tests;
