//! LLM Module
//!
//! Provides the gateway contract used by the generation pipeline:
//! - `gateway`: `TextGenerationGateway` trait, request/response and errors
//! - `model_selector`: complexity scoring and tier selection
//! - `providers`: HTTP adapters

pub mod gateway;
pub mod model_selector;
pub mod providers;

pub use gateway::{
    GatewayError, GatewayRequest, GatewayResponse, TextGenerationGateway, TokenUsage,
    UnconfiguredGateway,
};
pub use model_selector::{
    score_breakdown, tier_for_score, ModelCatalog, ModelSelection, ModelSelector, ModelTier,
    ScoreBreakdown,
};
pub use providers::OpenAiCompatibleGateway;
