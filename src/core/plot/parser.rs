//! AI Response Parser
//!
//! The only place where gateway text becomes domain types. The response must
//! contain a JSON object matching `AiPlotResponse`; everything it yields is
//! validated against the request before it leaves this module.

use serde::Deserialize;

use super::types::{
    PlotAct, PlotGenerationRequest, PlotPoint, PlotStructure, PlotSuggestion, StructureType,
    StructureViolation, TaskType,
};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("response contains no JSON object")]
    NoJson,

    #[error("response JSON does not match the expected shape: {0}")]
    Shape(String),

    #[error("response is missing the '{0}' field")]
    MissingField(&'static str),

    #[error("expected a {expected} structure, got {found}")]
    StructureMismatch {
        expected: StructureType,
        found: StructureType,
    },

    #[error("structure is invalid: {0}")]
    InvalidStructure(#[from] StructureViolation),

    #[error("no valid alternative structures in response")]
    NoValidAlternatives,
}

// ============================================================================
// Wire Shape
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiPlotResponse {
    #[serde(default)]
    structure: Option<AiStructure>,
    #[serde(default)]
    suggestions: Option<Vec<PlotSuggestion>>,
    #[serde(default)]
    alternatives: Option<Vec<AiStructure>>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiStructure {
    #[serde(default)]
    structure_type: Option<StructureType>,
    acts: Vec<AiAct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiAct {
    label: String,
    start_chapter: u32,
    end_chapter: u32,
    points: Vec<PlotPoint>,
}

impl AiStructure {
    fn into_structure(self, fallback_type: StructureType) -> PlotStructure {
        let acts = self
            .acts
            .into_iter()
            .enumerate()
            .map(|(index, act)| PlotAct {
                index,
                label: act.label,
                start_chapter: act.start_chapter,
                end_chapter: act.end_chapter,
                points: act.points,
            })
            .collect();

        PlotStructure {
            structure_type: self.structure_type.unwrap_or(fallback_type),
            acts,
        }
    }
}

// ============================================================================
// Parsed Output
// ============================================================================

/// Validated content extracted from a gateway response
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPlot {
    pub structure: Option<PlotStructure>,
    pub suggestions: Vec<PlotSuggestion>,
    pub alternatives: Vec<PlotStructure>,
    /// Provider-reported confidence, clamped to [0, 1]
    pub confidence: Option<f32>,
}

// ============================================================================
// JSON Extraction
// ============================================================================

/// Locate the JSON object in free-form model output.
///
/// A ```json fenced block wins; otherwise each `{` is tried in turn with a
/// string-aware brace matcher.
pub fn extract_json_object(content: &str) -> Option<serde_json::Value> {
    if let Some(start) = content.find("```json") {
        let body = &content[start + 7..];
        if let Some(end) = body.find("```") {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(body[..end].trim()) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }

    for (idx, _) in content.match_indices('{') {
        let substring = &content[idx..];
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut end_idx = None;

        for (i, ch) in substring.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        end_idx = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        if let Some(end) = end_idx {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&substring[..=end]) {
                return Some(value);
            }
        }
    }

    None
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse and validate a gateway response for the given task
pub fn parse_plot_response(
    content: &str,
    task: TaskType,
    request: &PlotGenerationRequest,
) -> Result<ParsedPlot, ParseError> {
    let value = extract_json_object(content).ok_or(ParseError::NoJson)?;
    let response: AiPlotResponse =
        serde_json::from_value(value).map_err(|e| ParseError::Shape(e.to_string()))?;

    let expected = request.structure();
    let target = request.target_length();

    let structure = match task {
        TaskType::Structure => {
            let raw = response.structure.ok_or(ParseError::MissingField("structure"))?;
            let structure = raw.into_structure(expected);
            if structure.structure_type != expected {
                return Err(ParseError::StructureMismatch {
                    expected,
                    found: structure.structure_type,
                });
            }
            structure.validate(target)?;
            Some(structure)
        }
        _ => None,
    };

    let suggestions = match (task, response.suggestions) {
        (TaskType::Suggestions, None) => return Err(ParseError::MissingField("suggestions")),
        (TaskType::Alternatives, _) => Vec::new(),
        (_, suggestions) => suggestions.unwrap_or_default(),
    };

    let alternatives = match task {
        TaskType::Suggestions => Vec::new(),
        _ => {
            let candidates = match (task, response.alternatives) {
                (TaskType::Alternatives, None) => {
                    return Err(ParseError::MissingField("alternatives"))
                }
                (_, candidates) => candidates.unwrap_or_default(),
            };
            let valid: Vec<PlotStructure> = candidates
                .into_iter()
                .map(|alt| alt.into_structure(expected))
                .filter(|alt| match alt.validate(target) {
                    Ok(()) => true,
                    Err(e) => {
                        log::debug!("Dropping invalid {} alternative: {}", alt.structure_type, e);
                        false
                    }
                })
                .collect();
            if task == TaskType::Alternatives && valid.is_empty() {
                return Err(ParseError::NoValidAlternatives);
            }
            valid
        }
    };

    let confidence = response
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0));

    Ok(ParsedPlot {
        structure,
        suggestions,
        alternatives,
        confidence,
    })
}

// ============================================================================
// Tests
// ============================================================================
