/// Plotweaver - context-aware plot generation engine
///
/// Core library turning a story premise plus project data into a
/// validated plot outline, with model-tier selection, retries and a
/// deterministic template fallback.

pub mod config;
pub mod core;


pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
