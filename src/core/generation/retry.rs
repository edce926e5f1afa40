//! Retry Policy
//!
//! Error classification and exponential backoff for gateway calls. The
//! orchestrator drives the loop itself; this module only answers "may I
//! retry?" and "how long do I wait?". Sleeping goes through `Sleeper` so
//! tests can observe delays without waiting.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::llm::GatewayError;

/// Retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubles each time
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// Malformed responses re-sent before falling back
pub const DEFAULT_MAX_PARSE_RETRIES: u32 = 1;

/// Per-call timeout
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 60_000;

/// HTTP statuses treated as transient
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 500, 502, 503];

// ============================================================================
// RetryConfig
// ============================================================================

/// Gateway retry policy. Values above the defaults for `max_retries` and
/// `base_delay_ms` are clamped by `bounded` when an orchestrator is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Parse retries count against `max_retries` as well
    pub max_parse_retries: u32,
    pub call_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_parse_retries: DEFAULT_MAX_PARSE_RETRIES,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            max_parse_retries: 0,
            ..Default::default()
        }
    }

    /// Clamp to the policy ceiling of three retries and a 100 ms base delay,
    /// so no configuration exceeds 700 ms of total backoff
    pub fn bounded(self) -> Self {
        let max_retries = self.max_retries.min(DEFAULT_MAX_RETRIES);
        if max_retries < self.max_retries || self.base_delay_ms > DEFAULT_BASE_DELAY_MS {
            log::warn!(
                "Retry policy capped at {} retries and {}ms base delay (requested {} and {}ms)",
                DEFAULT_MAX_RETRIES,
                DEFAULT_BASE_DELAY_MS,
                self.max_retries,
                self.base_delay_ms
            );
        }
        Self {
            max_retries,
            base_delay_ms: self.base_delay_ms.min(DEFAULT_BASE_DELAY_MS),
            max_parse_retries: self.max_parse_retries.min(max_retries),
            call_timeout_ms: self.call_timeout_ms,
        }
    }

    /// Backoff before retry number `retry` (1-based): base * 2^(retry-1)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Sum of every backoff the policy can apply
    pub fn max_total_backoff(&self) -> Duration {
        (1..=self.max_retries).map(|r| self.delay_for(r)).sum()
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

// ============================================================================
// Classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Retryable,
    Fatal,
}

impl ErrorClass {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorClass::Retryable)
    }
}

fn class_for_status(status: u16) -> ErrorClass {
    if RETRYABLE_STATUSES.contains(&status) {
        ErrorClass::Retryable
    } else {
        ErrorClass::Fatal
    }
}

fn class_for_message(message: &str) -> ErrorClass {
    let lower = message.to_lowercase();
    let transient = [
        "timeout",
        "timed out",
        "connection reset",
        "connection refused",
        "temporarily unavailable",
        "overloaded",
        "rate limit",
    ];
    if transient.iter().any(|needle| lower.contains(needle)) {
        ErrorClass::Retryable
    } else {
        ErrorClass::Fatal
    }
}

/// Decide whether a gateway error is worth retrying. Pure.
pub fn classify_gateway_error(error: &GatewayError) -> ErrorClass {
    match error {
        GatewayError::Timeout
        | GatewayError::Connection(_)
        | GatewayError::RateLimited { .. } => ErrorClass::Retryable,
        GatewayError::ApiError { status, .. } => class_for_status(*status),
        GatewayError::Provider {
            retryable: Some(hint),
            ..
        } => {
            if *hint {
                ErrorClass::Retryable
            } else {
                ErrorClass::Fatal
            }
        }
        GatewayError::Provider { message, .. } => class_for_message(message),
        GatewayError::HttpError(e) => {
            if e.is_timeout() || e.is_connect() {
                ErrorClass::Retryable
            } else {
                e.status()
                    .map(|s| class_for_status(s.as_u16()))
                    .unwrap_or(ErrorClass::Fatal)
            }
        }
        GatewayError::AuthError(_)
        | GatewayError::InvalidRequest(_)
        | GatewayError::InvalidResponse(_)
        | GatewayError::NotConfigured(_) => ErrorClass::Fatal,
    }
}

// ============================================================================
// Sleeper
// ============================================================================

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping via the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested delay
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn total(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}
