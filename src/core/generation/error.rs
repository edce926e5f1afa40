//! Generation error taxonomy.
//!
//! Only `Cancelled` ever reaches a caller. The other variants are resolved
//! inside the orchestrator (retry or template fallback) and surface as the
//! fallback reason in `GenerationMetadata`.

use thiserror::Error;

use crate::core::llm::GatewayError;
use crate::core::plot::ParseError;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Transient gateway error: {0}")]
    TransientGateway(GatewayError),

    #[error("Gateway error: {0}")]
    FatalGateway(GatewayError),

    #[error("Malformed response: {0}")]
    ResponseParse(#[from] ParseError),

    #[error("Context retrieval failed: {0}")]
    ContextRetrieval(String),

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Short machine-readable name
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::TransientGateway(_) => "transient_gateway",
            GenerationError::FatalGateway(_) => "fatal_gateway",
            GenerationError::ResponseParse(_) => "response_parse",
            GenerationError::ContextRetrieval(_) => "context_retrieval",
            GenerationError::Cancelled => "cancelled",
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
