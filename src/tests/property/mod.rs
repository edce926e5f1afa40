//! Property-based tests
//!
//! Invariants that must hold for every input, checked with proptest:
//!
//! - `plot_structure_props`: template outlines partition `[1, target]`, carry
//!   exactly one climax and are idempotent
//! - `retry_props`: at most three retries and 700ms of total backoff, and
//!   permanent failures always end in a valid template result
//! - `model_selector_props`: tier selection is monotonic in complexity
//! - `context_props`: trimming respects the budget and keeps every name;
//!   the cache serves a put only while the content hash matches
//!
//! Case count is controlled via `PROPTEST_CASES`.

mod model_selector_props;
mod plot_structure_props;
mod retry_props;
