//! Generation Module
//!
//! Drives one plot request from raw project data to a result:
//! - `orchestrator`: pipeline, retry loop and template fallback
//! - `retry`: error classification and backoff
//! - `state`: pipeline states and per-request trace
//! - `prompts`: task prompts and retrieval queries

pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod retry;
pub mod state;

pub use error::GenerationError;
pub use orchestrator::{GenerationOrchestrator, GenerationOrchestratorBuilder, OrchestratorConfig};
pub use retry::{
    classify_gateway_error, ErrorClass, RecordingSleeper, RetryConfig, Sleeper, TokioSleeper,
};
pub use state::{GenerationState, StateTracker};
