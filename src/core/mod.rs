pub mod clock;
pub mod logging;

// Domain model: requests, outlines, templates and response parsing
pub mod plot;

// Project data -> ProjectContext -> enriched prompts
pub mod context;

// Gateway contract, model tiers and HTTP providers
pub mod llm;

// Orchestration: state machine, retries, fallback
pub mod generation;
