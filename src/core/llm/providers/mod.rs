//! Gateway Implementations
//!
//! Concrete `TextGenerationGateway` adapters.

mod openai_compat;

pub use openai_compat::{OpenAiCompatibleGateway, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS};
