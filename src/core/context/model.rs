//! Project Context Types
//!
//! Raw project data as loaded from a data source, and the token-bounded
//! `ProjectContext` the extractor derives from it.

use serde::{Deserialize, Serialize};

// ============================================================================
// Section Headers
// ============================================================================

pub const SECTION_PREMISE: &str = "PREMISE";
pub const SECTION_THEMES: &str = "THEMES";
pub const SECTION_CHARACTERS: &str = "CHARACTERS";
pub const SECTION_WORLD: &str = "WORLD";
pub const SECTION_MENTIONS: &str = "ENTITY MENTIONS";
pub const SECTION_SUPPLEMENTAL: &str = "RELATED PASSAGES";
pub const SECTION_CHAPTERS: &str = "CHAPTER SUMMARIES";
pub const SECTION_TIMELINE: &str = "TIMELINE";

// ============================================================================
// Records
// ============================================================================

/// A character as known to the project
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterSummary {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub traits: Vec<String>,
    pub description: Option<String>,
}

impl CharacterSummary {
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_traits(mut self, traits: Vec<String>) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Render as a single context line
    pub fn line(&self) -> String {
        let mut line = format!("- {}", self.name);
        if let Some(role) = self.role.as_deref().filter(|r| !r.is_empty()) {
            line.push_str(&format!(" ({})", role));
        }
        if !self.traits.is_empty() {
            line.push_str(&format!(": {}", self.traits.join(", ")));
        }
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            line.push_str(&format!(". {}", description));
        }
        line
    }
}

/// A world-building entry (place, faction, artifact, rule...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorldEntry {
    pub name: String,
    pub category: String,
    pub description: String,
}

impl WorldEntry {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: description.into(),
        }
    }

    pub fn line(&self) -> String {
        let mut line = format!("- {}", self.name);
        if !self.category.is_empty() {
            line.push_str(&format!(" [{}]", self.category));
        }
        if !self.description.is_empty() {
            line.push_str(&format!(": {}", self.description));
        }
        line
    }
}

/// An event on the project timeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineEvent {
    pub title: String,
    pub description: String,
    pub chapter: Option<u32>,
}

impl TimelineEvent {
    pub fn line(&self) -> String {
        let mut line = match self.chapter {
            Some(chapter) => format!("- [ch {}] {}", chapter, self.title),
            None => format!("- {}", self.title),
        };
        if !self.description.is_empty() {
            line.push_str(&format!(": {}", self.description));
        }
        line
    }
}

/// Summary of an already written chapter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterSummary {
    pub number: u32,
    pub title: String,
    pub summary: String,
}

impl ChapterSummary {
    pub fn line(&self) -> String {
        format!("- Chapter {}: {} - {}", self.number, self.title, self.summary)
    }
}

/// An entity referenced in the free-text project idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMention {
    pub kind: String,
    pub name: String,
    pub detail: Option<String>,
}

impl EntityMention {
    pub fn line(&self) -> String {
        match &self.detail {
            Some(detail) => format!("- {}: {} - {}", self.kind, self.name, detail),
            None => format!("- {}: {}", self.kind, self.name),
        }
    }
}

/// A passage returned by the retrieval service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementalPassage {
    pub kind: String,
    pub id: String,
    pub snippet: String,
    pub score: f32,
}

impl SupplementalPassage {
    pub fn line(&self) -> String {
        format!("- ({} {}) {}", self.kind, self.id, self.snippet)
    }
}

// ============================================================================
// Raw Project Data
// ============================================================================

/// Everything a data source knows about a project. Missing sections
/// deserialize as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProjectData {
    pub title: Option<String>,
    /// Free-text project idea; may embed `Premise:`/`Themes:` lines and mentions
    pub idea: Option<String>,
    pub genre: Option<String>,
    pub themes: Vec<String>,
    pub characters: Vec<CharacterSummary>,
    pub world_entries: Vec<WorldEntry>,
    pub chapters: Vec<ChapterSummary>,
    pub timeline: Vec<TimelineEvent>,
}

impl RawProjectData {
    /// blake3 hex digest of the canonical JSON encoding
    pub fn content_hash(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self == &RawProjectData::default()
    }
}

// ============================================================================
// Context Sections
// ============================================================================

/// A rendered block of context under a stable header
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSection {
    pub name: &'static str,
    pub content: String,
}

impl ContextSection {
    fn from_lines(name: &'static str, lines: Vec<String>) -> Option<Self> {
        if lines.is_empty() {
            None
        } else {
            Some(Self {
                name,
                content: lines.join("\n"),
            })
        }
    }

    /// Header plus content
    pub fn render(&self) -> String {
        format!("### {} ###\n{}", self.name, self.content)
    }
}

// ============================================================================
// Project Context
// ============================================================================

/// Structured, token-bounded project facts used to ground generation.
///
/// Never mutated once built: trimming and summarising produce new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub project_id: String,
    pub premise: Option<String>,
    pub characters: Vec<CharacterSummary>,
    pub world_entries: Vec<WorldEntry>,
    pub timeline: Vec<TimelineEvent>,
    pub chapter_summaries: Vec<ChapterSummary>,
    pub themes: Vec<String>,
    pub mentions: Vec<EntityMention>,
    pub supplemental: Vec<SupplementalPassage>,
    /// Names of sections that lost material to the token budget
    pub trimmed_sections: Vec<String>,
    pub token_estimate: u32,
}

impl ProjectContext {
    /// A context with no facts at all
    pub fn empty(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            premise: None,
            characters: Vec::new(),
            world_entries: Vec::new(),
            timeline: Vec::new(),
            chapter_summaries: Vec::new(),
            themes: Vec::new(),
            mentions: Vec::new(),
            supplemental: Vec::new(),
            trimmed_sections: Vec::new(),
            token_estimate: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections().is_empty()
    }

    /// Non-empty sections in render order
    pub fn sections(&self) -> Vec<ContextSection> {
        let premise = self
            .premise
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| vec![p.to_string()])
            .unwrap_or_default();
        let themes = if self.themes.is_empty() {
            Vec::new()
        } else {
            vec![self.themes.join(", ")]
        };

        [
            ContextSection::from_lines(SECTION_PREMISE, premise),
            ContextSection::from_lines(SECTION_THEMES, themes),
            ContextSection::from_lines(
                SECTION_CHARACTERS,
                self.characters.iter().map(CharacterSummary::line).collect(),
            ),
            ContextSection::from_lines(
                SECTION_WORLD,
                self.world_entries.iter().map(WorldEntry::line).collect(),
            ),
            ContextSection::from_lines(
                SECTION_MENTIONS,
                self.mentions.iter().map(EntityMention::line).collect(),
            ),
            ContextSection::from_lines(
                SECTION_SUPPLEMENTAL,
                self.supplemental.iter().map(SupplementalPassage::line).collect(),
            ),
            ContextSection::from_lines(
                SECTION_CHAPTERS,
                self.chapter_summaries.iter().map(ChapterSummary::line).collect(),
            ),
            ContextSection::from_lines(
                SECTION_TIMELINE,
                self.timeline.iter().map(TimelineEvent::line).collect(),
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// All sections, separated by blank lines
    pub fn render(&self) -> String {
        self.sections()
            .iter()
            .map(ContextSection::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Fresh token estimate of the rendered context
    pub fn measure_tokens(&self) -> u32 {
        estimate_tokens(&self.render())
    }

    /// Premise, character names and themes only
    pub fn summary_only(&self) -> ProjectContext {
        let mut summary = ProjectContext::empty(self.project_id.clone());
        summary.premise = self.premise.clone();
        summary.themes = self.themes.clone();
        summary.characters = self
            .characters
            .iter()
            .map(|c| CharacterSummary::named(c.id.clone(), c.name.clone()))
            .collect();
        summary.trimmed_sections = vec!["summary_only".to_string()];
        summary.token_estimate = summary.measure_tokens();
        summary
    }

    /// Character names in context order
    pub fn character_names(&self) -> Vec<&str> {
        self.characters.iter().map(|c| c.name.as_str()).collect()
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Estimate token count from text (~4 characters per token, rounded up)
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(4) as u32
}

// ============================================================================
// Tests
// ============================================================================
