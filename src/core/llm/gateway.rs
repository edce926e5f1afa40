//! Text Generation Gateway
//!
//! The contract every text-generation provider implements, plus the
//! request/response/error types shared by the orchestrator and the adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timeout")]
    Timeout,

    /// Error reported by the provider itself, optionally with an explicit
    /// retry hint
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        retryable: Option<bool>,
    },
}

impl GatewayError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::ApiError { status, .. } => Some(*status),
            GatewayError::RateLimited { .. } => Some(429),
            GatewayError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GatewayRequest {
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub text: String,
    pub model: String,
    /// Provider-reported confidence, if the provider has one
    pub confidence: Option<f32>,
    pub usage: Option<TokenUsage>,
}

impl GatewayResponse {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            confidence: None,
            usage: None,
        }
    }
}

// ============================================================================
// Gateway Trait
// ============================================================================

/// An external text-generation provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerationGateway: Send + Sync {
    /// Short identifier used in logs
    fn id(&self) -> &str;

    async fn generate_text(&self, request: GatewayRequest) -> Result<GatewayResponse>;
}

/// Gateway used when no provider is configured; always fails fatally so the
/// template path runs
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl TextGenerationGateway for UnconfiguredGateway {
    fn id(&self) -> &str {
        "unconfigured"
    }

    async fn generate_text(&self, _request: GatewayRequest) -> Result<GatewayResponse> {
        Err(GatewayError::NotConfigured(
            "no text generation provider configured".to_string(),
        ))
    }
}
