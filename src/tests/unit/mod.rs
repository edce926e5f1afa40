//! Unit tests that span several modules
//!
//! - `scenarios`: end-to-end behaviour of the orchestrator on fixed inputs
//! - `classification`: gateway error classification tables
//! - `providers`: HTTP adapters against a wiremock server

mod classification;
mod providers;
mod scenarios;
