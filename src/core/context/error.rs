//! Error types for context loading and retrieval.

use thiserror::Error;

/// Errors raised while loading raw project data
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Project source unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors reported by the external retrieval service
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Retrieval service unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval request timed out")]
    Timeout,

    #[error("Invalid retrieval response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ContextError>;
