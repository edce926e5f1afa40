//! Model Selector
//!
//! Scores how demanding a generation call is and maps the score to a
//! cost/quality tier, then to a concrete model id via `ModelCatalog`.
//!
//! Score components:
//! - task: suggestions 0, alternatives 1, structure 1
//! - structure: three-act +1, five-act +2, hero's journey / kishotenketsu +3
//! - length: +1 above 12 chapters, +2 above 30
//! - cast: +1 above 3 characters, +2 above 8
//! - +1 for more than 10 timeline events, +1 for more than 3 themes
//!
//! Every component is non-decreasing in its input, so the tier is monotonic.

use serde::{Deserialize, Serialize};

use crate::core::context::ProjectContext;
use crate::core::plot::{PlotGenerationRequest, StructureType, TaskType};

/// Score at or above which the advanced tier is used
pub const ADVANCED_THRESHOLD: u32 = 3;

/// Score at or above which the standard tier is used
pub const STANDARD_THRESHOLD: u32 = 1;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Standard,
    Advanced,
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Standard => write!(f, "standard"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// Tier to model id mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCatalog {
    pub fast: String,
    pub standard: String,
    pub advanced: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            fast: "gpt-4o-mini".to_string(),
            standard: "gpt-4o".to_string(),
            advanced: "gpt-4.1".to_string(),
        }
    }
}

impl ModelCatalog {
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Standard => &self.standard,
            ModelTier::Advanced => &self.advanced,
        }
    }
}

/// Per-factor contributions, kept for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub task: u32,
    pub structure: u32,
    pub length: u32,
    pub characters: u32,
    pub timeline: u32,
    pub themes: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.task + self.structure + self.length + self.characters + self.timeline + self.themes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelection {
    pub tier: ModelTier,
    pub model_id: String,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
}

// ============================================================================
// Scoring
// ============================================================================

fn structure_weight(structure: StructureType) -> u32 {
    match structure {
        StructureType::ThreeAct => 1,
        StructureType::FiveAct => 2,
        StructureType::HerosJourney | StructureType::Kishotenketsu => 3,
    }
}

fn bucket(value: usize, low: usize, high: usize) -> u32 {
    if value > high {
        2
    } else if value > low {
        1
    } else {
        0
    }
}

/// Complexity factors for a call
pub fn score_breakdown(
    request: &PlotGenerationRequest,
    task: TaskType,
    context: Option<&ProjectContext>,
) -> ScoreBreakdown {
    let cast = context
        .map(|c| c.characters.len())
        .unwrap_or(0)
        .max(request.character_ids().len());
    let timeline = context.map(|c| c.timeline.len()).unwrap_or(0);
    let themes = context.map(|c| c.themes.len()).unwrap_or(0);

    ScoreBreakdown {
        task: match task {
            TaskType::Suggestions => 0,
            TaskType::Alternatives | TaskType::Structure => 1,
        },
        structure: structure_weight(request.structure()),
        length: bucket(request.target_length() as usize, 12, 30),
        characters: bucket(cast, 3, 8),
        timeline: u32::from(timeline > 10),
        themes: u32::from(themes > 3),
    }
}

pub fn tier_for_score(score: u32) -> ModelTier {
    if score >= ADVANCED_THRESHOLD {
        ModelTier::Advanced
    } else if score >= STANDARD_THRESHOLD {
        ModelTier::Standard
    } else {
        ModelTier::Fast
    }
}

// ============================================================================
// Selector
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    catalog: ModelCatalog,
}

impl ModelSelector {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Pick a tier and model for a call
    pub fn select_model(
        &self,
        request: &PlotGenerationRequest,
        task: TaskType,
        context: Option<&ProjectContext>,
    ) -> ModelSelection {
        let breakdown = score_breakdown(request, task, context);
        let score = breakdown.total();
        let tier = tier_for_score(score);

        ModelSelection {
            tier,
            model_id: self.catalog.model_for(tier).to_string(),
            score,
            breakdown,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
