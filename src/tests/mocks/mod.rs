//! Mock implementations for testing
//!
//! `ScriptedGateway` plays back a fixed sequence of responses and failures,
//! which is easier to read than chained mockall expectations when a test is
//! about the order of attempts.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::context::{CharacterSummary, RawProjectData, TimelineEvent, WorldEntry};
use crate::core::generation::{GenerationOrchestrator, RecordingSleeper};
use crate::core::llm::gateway::Result;
use crate::core::llm::{GatewayError, GatewayRequest, GatewayResponse, TextGenerationGateway};
use crate::core::plot::{generate_template_plot, PlotGenerationRequest, StructureType};

// ============================================================================
// Scripted Gateway
// ============================================================================

type Step = std::result::Result<String, GatewayError>;

pub struct ScriptedGateway {
    steps: Mutex<VecDeque<Step>>,
    exhausted: fn() -> GatewayError,
    calls: AtomicU32,
    requests: Mutex<Vec<GatewayRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            exhausted: || GatewayError::NotConfigured("script exhausted".to_string()),
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with the error produced by `make`
    pub fn always_failing(make: fn() -> GatewayError) -> Self {
        Self::new().when_exhausted(make)
    }

    pub fn then_respond(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    pub fn then_fail(self, error: GatewayError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn when_exhausted(mut self, make: fn() -> GatewayError) -> Self {
        self.exhausted = make;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }
}

#[async_trait]
impl TextGenerationGateway for ScriptedGateway {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn generate_text(&self, request: GatewayRequest) -> Result<GatewayResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Ok(text)) => Ok(GatewayResponse::new(text, model)),
            Some(Err(e)) => Err(e),
            None => Err((self.exhausted)()),
        }
    }
}

pub fn unavailable() -> GatewayError {
    GatewayError::ApiError {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

pub fn unauthorized() -> GatewayError {
    GatewayError::AuthError("invalid api key".to_string())
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn three_act_request() -> PlotGenerationRequest {
    PlotGenerationRequest::builder("novel-1", "A lighthouse keeper finds a map in a bottle")
        .genre("mystery")
        .target_length(12)
        .structure(StructureType::ThreeAct)
        .build()
        .unwrap()
}

/// A response body a well-behaved provider would send for `request`
pub fn valid_plot_json(request: &PlotGenerationRequest) -> String {
    let structure = generate_template_plot(request, request.structure());
    serde_json::json!({
        "structure": structure,
        "suggestions": [
            {"text": "Give the keeper a rival who also wants the map", "category": "conflict"}
        ],
        "alternatives": []
    })
    .to_string()
}

pub fn sample_project() -> RawProjectData {
    RawProjectData {
        title: Some("Salt and Signal".into()),
        idea: Some(
            "Premise: A lighthouse keeper finds a map in a bottle\n\
             Themes: isolation, inheritance\n\
             @Maren follows the map to [[Gull Rock]]."
                .into(),
        ),
        genre: Some("mystery".into()),
        characters: vec![
            CharacterSummary::named("c1", "Maren").with_role("keeper"),
            CharacterSummary::named("c2", "Tobias").with_role("smuggler"),
        ],
        world_entries: vec![WorldEntry::new("Gull Rock", "place", "A tidal island.")],
        timeline: vec![TimelineEvent {
            title: "The storm".into(),
            description: "The lamp fails for one night".into(),
            chapter: Some(1),
        }],
        ..Default::default()
    }
}

/// Orchestrator over `gateway` with an instant sleeper
pub fn orchestrator_with(
    gateway: Arc<dyn TextGenerationGateway>,
    sleeper: Arc<RecordingSleeper>,
) -> GenerationOrchestrator {
    GenerationOrchestrator::builder(gateway).sleeper(sleeper).build()
}
