//! Plot Domain Types
//!
//! Request, structure, act, point and result types for plot generation,
//! plus the structural invariants every returned `PlotStructure` must satisfy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Confidence assigned to results produced by the template fallback path
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Confidence assigned to AI-backed results that parsed cleanly
pub const AI_CONFIDENCE: f32 = 1.0;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while building a `PlotGenerationRequest`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("target length must be a positive chapter count")]
    ZeroTargetLength,

    #[error("project id must not be empty")]
    MissingProjectId,
}

/// A broken structural invariant in a `PlotStructure`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureViolation {
    #[error("structure has no acts")]
    NoActs,

    #[error("act {index} has an inverted chapter range {start}..={end}")]
    InvertedRange { index: usize, start: u32, end: u32 },

    #[error("act {index} starts at chapter {start}, expected {expected}")]
    Gap { index: usize, start: u32, expected: u32 },

    #[error("act {index} ends at chapter {end}, beyond the last chapter {target}")]
    BeyondTarget { index: usize, end: u32, target: u32 },

    #[error("acts cover chapters 1..={covered}, expected 1..={target}")]
    Coverage { covered: u32, target: u32 },

    #[error("expected exactly one climax, found {0}")]
    ClimaxCount(usize),

    #[error("no resolution point")]
    MissingResolution,

    #[error("first plot point is {0}, not an opening beat")]
    MissingOpeningBeat(String),

    #[error("point '{label}' at chapter {position} lies outside act {index}")]
    PointOutOfRange {
        index: usize,
        label: String,
        position: u32,
    },
}

// ============================================================================
// Structure Type
// ============================================================================

/// Narrative structure requested for the outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureType {
    ThreeAct,
    FiveAct,
    HerosJourney,
    Kishotenketsu,
}

impl Default for StructureType {
    fn default() -> Self {
        StructureType::ThreeAct
    }
}

impl StructureType {
    /// All structure types in their canonical order
    pub const ALL: [StructureType; 4] = [
        StructureType::ThreeAct,
        StructureType::FiveAct,
        StructureType::HerosJourney,
        StructureType::Kishotenketsu,
    ];

    /// Get the kebab-case identifier used in prompts and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureType::ThreeAct => "three-act",
            StructureType::FiveAct => "five-act",
            StructureType::HerosJourney => "heros-journey",
            StructureType::Kishotenketsu => "kishotenketsu",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            StructureType::ThreeAct => "Three-Act Structure",
            StructureType::FiveAct => "Five-Act Structure",
            StructureType::HerosJourney => "Hero's Journey",
            StructureType::Kishotenketsu => "Kishōtenketsu",
        }
    }
}

impl std::fmt::Display for StructureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Task Type
// ============================================================================

/// What a single gateway call is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Full outline with suggestions and alternatives
    Structure,
    Suggestions,
    Alternatives,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Structure => "structure",
            TaskType::Suggestions => "suggestions",
            TaskType::Alternatives => "alternatives",
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// A validated, immutable plot generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlotGenerationRequest", rename_all = "camelCase")]
pub struct PlotGenerationRequest {
    premise: String,
    genre: String,
    target_length: u32,
    structure: StructureType,
    character_ids: BTreeSet<String>,
    project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Unvalidated wire shape of a request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlotGenerationRequest {
    premise: String,
    #[serde(default)]
    genre: String,
    target_length: u32,
    #[serde(default)]
    structure: StructureType,
    #[serde(default)]
    character_ids: BTreeSet<String>,
    project_id: String,
    #[serde(default)]
    temperature: Option<f32>,
}

impl TryFrom<RawPlotGenerationRequest> for PlotGenerationRequest {
    type Error = RequestError;

    fn try_from(raw: RawPlotGenerationRequest) -> Result<Self, Self::Error> {
        let mut builder = PlotGenerationRequest::builder(raw.project_id, raw.premise)
            .genre(raw.genre)
            .target_length(raw.target_length)
            .structure(raw.structure)
            .characters(raw.character_ids);
        if let Some(temperature) = raw.temperature {
            builder = builder.temperature(temperature);
        }
        builder.build()
    }
}

impl PlotGenerationRequest {
    /// Start building a request for a project
    pub fn builder(
        project_id: impl Into<String>,
        premise: impl Into<String>,
    ) -> PlotGenerationRequestBuilder {
        PlotGenerationRequestBuilder {
            project_id: project_id.into(),
            premise: premise.into(),
            genre: String::new(),
            target_length: 12,
            structure: StructureType::ThreeAct,
            character_ids: BTreeSet::new(),
            temperature: None,
        }
    }

    pub fn premise(&self) -> &str {
        &self.premise
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    /// Chapter count, always at least 1
    pub fn target_length(&self) -> u32 {
        self.target_length
    }

    pub fn structure(&self) -> StructureType {
        self.structure
    }

    pub fn character_ids(&self) -> &BTreeSet<String> {
        &self.character_ids
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }
}

/// Builder for `PlotGenerationRequest`
#[derive(Debug, Clone)]
pub struct PlotGenerationRequestBuilder {
    project_id: String,
    premise: String,
    genre: String,
    target_length: u32,
    structure: StructureType,
    character_ids: BTreeSet<String>,
    temperature: Option<f32>,
}

impl PlotGenerationRequestBuilder {
    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = genre.into();
        self
    }

    pub fn target_length(mut self, chapters: u32) -> Self {
        self.target_length = chapters;
        self
    }

    pub fn structure(mut self, structure: StructureType) -> Self {
        self.structure = structure;
        self
    }

    pub fn character(mut self, id: impl Into<String>) -> Self {
        self.character_ids.insert(id.into());
        self
    }

    pub fn characters<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.character_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Override the gateway temperature (clamped to 0.0..=2.0)
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }

    /// Validate and freeze the request
    pub fn build(self) -> Result<PlotGenerationRequest, RequestError> {
        if self.target_length == 0 {
            return Err(RequestError::ZeroTargetLength);
        }
        if self.project_id.trim().is_empty() {
            return Err(RequestError::MissingProjectId);
        }

        Ok(PlotGenerationRequest {
            premise: self.premise,
            genre: self.genre,
            target_length: self.target_length,
            structure: self.structure,
            character_ids: self.character_ids,
            project_id: self.project_id,
            temperature: self.temperature,
        })
    }
}

// ============================================================================
// Plot Points
// ============================================================================

/// Narrative function of a plot point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotPointType {
    IncitingIncident,
    RisingAction,
    Midpoint,
    Climax,
    FallingAction,
    Resolution,
    // Three-act / five-act openings
    Setup,
    Exposition,
    // Hero's journey stages
    OrdinaryWorld,
    CallToAdventure,
    RefusalOfTheCall,
    MeetingTheMentor,
    CrossingTheThreshold,
    TestsAlliesEnemies,
    ApproachToInmostCave,
    Ordeal,
    Reward,
    RoadBack,
    // Kishotenketsu
    Introduction,
    Development,
    Twist,
}

impl PlotPointType {
    /// Get the snake_case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncitingIncident => "inciting_incident",
            Self::RisingAction => "rising_action",
            Self::Midpoint => "midpoint",
            Self::Climax => "climax",
            Self::FallingAction => "falling_action",
            Self::Resolution => "resolution",
            Self::Setup => "setup",
            Self::Exposition => "exposition",
            Self::OrdinaryWorld => "ordinary_world",
            Self::CallToAdventure => "call_to_adventure",
            Self::RefusalOfTheCall => "refusal_of_the_call",
            Self::MeetingTheMentor => "meeting_the_mentor",
            Self::CrossingTheThreshold => "crossing_the_threshold",
            Self::TestsAlliesEnemies => "tests_allies_enemies",
            Self::ApproachToInmostCave => "approach_to_inmost_cave",
            Self::Ordeal => "ordeal",
            Self::Reward => "reward",
            Self::RoadBack => "road_back",
            Self::Introduction => "introduction",
            Self::Development => "development",
            Self::Twist => "twist",
        }
    }

    /// Whether a structure may open with this beat
    pub fn is_opening_beat(&self) -> bool {
        matches!(
            self,
            Self::IncitingIncident
                | Self::Setup
                | Self::Exposition
                | Self::OrdinaryWorld
                | Self::Introduction
        )
    }
}

impl std::fmt::Display for PlotPointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single narrative beat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotPoint {
    #[serde(rename = "type")]
    pub point_type: PlotPointType,
    pub label: String,
    pub description: String,
    /// Chapter index (1-based)
    pub position: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub character_ids: Vec<String>,
}

/// An act spanning an inclusive chapter range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotAct {
    pub index: usize,
    pub label: String,
    pub start_chapter: u32,
    pub end_chapter: u32,
    pub points: Vec<PlotPoint>,
}

impl PlotAct {
    /// Number of chapters in the act
    pub fn chapter_count(&self) -> u32 {
        self.end_chapter
            .saturating_add(1)
            .saturating_sub(self.start_chapter)
    }

    pub fn contains_chapter(&self, chapter: u32) -> bool {
        chapter >= self.start_chapter && chapter <= self.end_chapter
    }
}

/// A complete outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotStructure {
    pub structure_type: StructureType,
    pub acts: Vec<PlotAct>,
}

impl PlotStructure {
    /// Total chapters covered by the acts
    pub fn total_chapters(&self) -> u32 {
        self.acts.iter().map(PlotAct::chapter_count).sum()
    }

    /// Iterate over every point in act order
    pub fn points(&self) -> impl Iterator<Item = &PlotPoint> {
        self.acts.iter().flat_map(|act| act.points.iter())
    }

    /// Count points of a given type
    pub fn count_of(&self, point_type: PlotPointType) -> usize {
        self.points().filter(|p| p.point_type == point_type).count()
    }

    /// Index of the act holding the climax, if any
    pub fn climax_act(&self) -> Option<usize> {
        self.acts
            .iter()
            .position(|act| act.points.iter().any(|p| p.point_type == PlotPointType::Climax))
    }

    /// Check every structural invariant against the requested length
    pub fn validate(&self, target_length: u32) -> Result<(), StructureViolation> {
        if self.acts.is_empty() {
            return Err(StructureViolation::NoActs);
        }

        let mut expected = 1u32;
        for (index, act) in self.acts.iter().enumerate() {
            if act.end_chapter < act.start_chapter {
                return Err(StructureViolation::InvertedRange {
                    index,
                    start: act.start_chapter,
                    end: act.end_chapter,
                });
            }
            if act.end_chapter > target_length {
                return Err(StructureViolation::BeyondTarget {
                    index,
                    end: act.end_chapter,
                    target: target_length,
                });
            }
            if act.start_chapter != expected {
                return Err(StructureViolation::Gap {
                    index,
                    start: act.start_chapter,
                    expected,
                });
            }
            if let Some(point) = act.points.iter().find(|p| !act.contains_chapter(p.position)) {
                return Err(StructureViolation::PointOutOfRange {
                    index,
                    label: point.label.clone(),
                    position: point.position,
                });
            }
            expected = act.end_chapter.saturating_add(1);
        }

        let covered = expected.saturating_sub(1);
        if covered != target_length {
            return Err(StructureViolation::Coverage {
                covered,
                target: target_length,
            });
        }

        let climaxes = self.count_of(PlotPointType::Climax);
        if climaxes != 1 {
            return Err(StructureViolation::ClimaxCount(climaxes));
        }

        if self.count_of(PlotPointType::Resolution) == 0 {
            return Err(StructureViolation::MissingResolution);
        }

        match self.points().next() {
            Some(first) if first.point_type.is_opening_beat() => Ok(()),
            Some(first) => Err(StructureViolation::MissingOpeningBeat(
                first.point_type.to_string(),
            )),
            None => Err(StructureViolation::MissingOpeningBeat("nothing".to_string())),
        }
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// Category of a plot suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Character,
    Conflict,
    Theme,
    Pacing,
    WorldBuilding,
    Structure,
}

/// A free-standing idea to improve or extend the plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotSuggestion {
    pub text: String,
    pub category: SuggestionCategory,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_characters: Vec<String>,
}

impl PlotSuggestion {
    pub fn new(category: SuggestionCategory, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category,
            related_characters: Vec::new(),
        }
    }

    pub fn with_characters(mut self, ids: Vec<String>) -> Self {
        self.related_characters = ids;
        self
    }
}

// ============================================================================
// Result
// ============================================================================

/// Which path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Ai,
    Template,
}

/// Diagnostics describing how a result was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub generation_id: String,
    pub source: ResultSource,
    pub model_id: Option<String>,
    pub tier: Option<String>,
    /// Gateway calls made, including the first
    pub attempts: u32,
    pub retries: u32,
    pub total_backoff_ms: u64,
    pub fallback_reason: Option<String>,
    /// Pipeline states in the order they were entered
    pub state_trace: Vec<String>,
}

/// Final output of a generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotGenerationResult {
    pub structure: Option<PlotStructure>,
    pub suggestions: Vec<PlotSuggestion>,
    pub alternatives: Vec<PlotStructure>,
    pub confidence: f32,
    pub generated_at: DateTime<Utc>,
    pub metadata: GenerationMetadata,
}

impl PlotGenerationResult {
    /// Whether the template path produced this result
    pub fn is_fallback(&self) -> bool {
        self.metadata.source == ResultSource::Template
    }
}

// ============================================================================
// Tests
// ============================================================================
