//! Property-based tests for the retry policy
//!
//! Tests invariants:
//! - A request never makes more than `1 + max_retries` gateway calls
//! - Total backoff never exceeds 700ms with the default policy
//! - Permanent failures always yield a valid template result
//! - Delays double from the base delay

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use crate::core::generation::{RecordingSleeper, RetryConfig};
use crate::core::llm::GatewayError;
use crate::core::plot::{PlotGenerationRequest, StructureType, FALLBACK_CONFIDENCE};
use crate::tests::mocks::{orchestrator_with, ScriptedGateway};

fn failure_strategy() -> impl Strategy<Value = fn() -> GatewayError> {
    let makers: Vec<fn() -> GatewayError> = vec![
        || GatewayError::Timeout,
        || GatewayError::RateLimited { retry_after_secs: 1 },
        || GatewayError::ApiError { status: 500, message: "boom".into() },
        || GatewayError::ApiError { status: 502, message: "bad gateway".into() },
        || GatewayError::Connection("reset".into()),
        || GatewayError::AuthError("nope".into()),
        || GatewayError::InvalidRequest("bad".into()),
        || GatewayError::ApiError { status: 404, message: "missing".into() },
    ];
    prop::sample::select(makers)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn permanent_failure_is_bounded_and_falls_back(
        make in failure_strategy(),
        structure in prop::sample::select(StructureType::ALL.to_vec()),
        length in 1u32..60,
    ) {
        let request = PlotGenerationRequest::builder("prop", "A premise")
            .structure(structure)
            .target_length(length)
            .build()
            .unwrap();

        let gateway = Arc::new(ScriptedGateway::always_failing(make));
        let sleeper = Arc::new(RecordingSleeper::new());
        let orchestrator = orchestrator_with(gateway.clone(), sleeper.clone());

        let result = runtime().block_on(orchestrator.generate_plot(&request));

        prop_assert!(gateway.call_count() <= 4);
        prop_assert!(sleeper.delays().len() <= 3);
        prop_assert!(sleeper.total() <= Duration::from_millis(700));
        prop_assert_eq!(result.metadata.retries as usize, sleeper.delays().len());
        prop_assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        let structure = result.structure.expect("fallback always has a structure");
        prop_assert_eq!(structure.validate(length), Ok(()));
    }

    #[test]
    fn delays_double(base in 1u64..1_000, retry in 1u32..10) {
        let config = RetryConfig { base_delay_ms: base, ..Default::default() };
        prop_assert_eq!(config.delay_for(retry + 1), config.delay_for(retry) * 2);
        prop_assert_eq!(config.delay_for(1), Duration::from_millis(base));
    }
}
