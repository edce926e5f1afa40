//! Integration tests
//!
//! The full pipeline (source, retrieval, cache, injection, model selection,
//! HTTP gateway, retry, parse) against a wiremock provider.

mod plot_pipeline;
