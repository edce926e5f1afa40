//! OpenAI-Compatible Gateway
//!
//! Talks to any `/chat/completions` endpoint that follows the OpenAI wire
//! format (OpenAI, OpenRouter, Together, Groq, local proxies...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::llm::gateway::{
    GatewayError, GatewayRequest, GatewayResponse, Result, TextGenerationGateway, TokenUsage,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Gateway over an OpenAI-compatible chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleGateway {
    id: String,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    client: Client,
}

impl OpenAiCompatibleGateway {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        Self::with_timeout(api_key, base_url, Duration::from_secs(120))
    }

    /// Build with an HTTP-level timeout. The orchestrator applies its own
    /// per-call timeout on top of this.
    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            id: "openai-compatible".to_string(),
            api_key: api_key.into(),
            base_url,
            max_tokens: DEFAULT_MAX_TOKENS,
            client,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_body(&self, request: &GatewayRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(serde_json::json!({
                "role": "system",
                "content": request.system_prompt
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": request.user_prompt
        }));

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(self.max_tokens)
        });
        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        body
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::Connection(e.to_string())
    } else {
        GatewayError::HttpError(e)
    }
}

#[async_trait]
impl TextGenerationGateway for OpenAiCompatibleGateway {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate_text(&self, request: GatewayRequest) -> Result<GatewayResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&request);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(GatewayError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GatewayError::AuthError(format!(
                "provider rejected credentials ({})",
                status.as_u16()
            )));
        }

        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::InvalidRequest(text));
        }

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let json: serde_json::Value = resp.json().await.map_err(map_transport_error)?;

        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            return Err(GatewayError::Provider {
                message: error["message"].as_str().unwrap_or("unknown error").to_string(),
                retryable: error["retryable"].as_bool(),
            });
        }

        let text = json["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| GatewayError::InvalidResponse("Missing content".to_string()))?
            .to_string();

        let usage = json["usage"].as_object().map(|u| TokenUsage {
            input_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            output_tokens: u
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
        });

        log::debug!(
            "{} returned {} chars from {}",
            self.id,
            text.len(),
            request.model
        );

        Ok(GatewayResponse {
            text,
            model: json["model"].as_str().unwrap_or(&request.model).to_string(),
            confidence: json["confidence"].as_f64().map(|c| c as f32),
            usage,
        })
    }
}
