//! Generation pipeline states and the per-request trace.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Idle,
    ContextResolved,
    PromptBuilt,
    Calling,
    Succeeded,
    Retrying,
    FallingBack,
    Done,
}

impl GenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ContextResolved => "context_resolved",
            Self::PromptBuilt => "prompt_built",
            Self::Calling => "calling",
            Self::Succeeded => "succeeded",
            Self::Retrying => "retrying",
            Self::FallingBack => "falling_back",
            Self::Done => "done",
        }
    }

    pub fn can_transition_to(&self, next: GenerationState) -> bool {
        use GenerationState::*;
        matches!(
            (self, next),
            (Idle, ContextResolved)
                | (ContextResolved, PromptBuilt)
                | (PromptBuilt, Calling)
                | (Calling, Succeeded)
                | (Calling, Retrying)
                | (Calling, FallingBack)
                | (Retrying, Calling)
                | (Retrying, FallingBack)
                | (Succeeded, Done)
                | (FallingBack, Done)
        )
    }
}

impl std::fmt::Display for GenerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the current state of one request and every state it entered
#[derive(Debug, Clone)]
pub struct StateTracker {
    generation_id: String,
    current: GenerationState,
    trace: Vec<GenerationState>,
}

impl StateTracker {
    pub fn new(generation_id: impl Into<String>) -> Self {
        Self {
            generation_id: generation_id.into(),
            current: GenerationState::Idle,
            trace: vec![GenerationState::Idle],
        }
    }

    pub fn current(&self) -> GenerationState {
        self.current
    }

    pub fn trace(&self) -> &[GenerationState] {
        &self.trace
    }

    pub fn trace_strings(&self) -> Vec<String> {
        self.trace.iter().map(|s| s.as_str().to_string()).collect()
    }

    /// Move to `next`. An illegal transition is logged and still applied so
    /// the trace shows what actually happened.
    pub fn advance(&mut self, next: GenerationState) {
        if !self.current.can_transition_to(next) {
            tracing::error!(
                generation_id = %self.generation_id,
                from = %self.current,
                to = %next,
                "Illegal generation state transition"
            );
            debug_assert!(false, "illegal transition {} -> {}", self.current, next);
        } else {
            tracing::trace!(
                generation_id = %self.generation_id,
                from = %self.current,
                to = %next,
                "Generation state transition"
            );
        }
        self.current = next;
        self.trace.push(next);
    }
}
