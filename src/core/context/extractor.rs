//! Context Extractor
//!
//! Turns raw project data into a token-bounded `ProjectContext`.
//!
//! Extraction never fails: missing sections become empty collections and the
//! free-text idea is parsed on a best-effort basis. When the rendered context
//! exceeds the budget, material is dropped lowest priority first:
//!
//! 1. timeline events
//! 2. chapter summaries
//! 3. supplemental retrieval passages
//! 4. entity mentions
//! 5. world entry descriptions (truncated), then world entries from the end
//! 6. character descriptions and traits, from the last character backwards
//!
//! Character names and the premise are never dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::model::{
    CharacterSummary, EntityMention, ProjectContext, RawProjectData, SupplementalPassage,
    WorldEntry, SECTION_CHAPTERS, SECTION_CHARACTERS, SECTION_MENTIONS, SECTION_SUPPLEMENTAL,
    SECTION_TIMELINE, SECTION_WORLD,
};
use super::retrieval::RetrievalService;

/// Default token ceiling for an extracted context
pub const DEFAULT_MAX_CONTEXT_TOKENS: u32 = 6_000;

/// Default number of retrieval hits requested
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// World entry descriptions are cut to this many characters before whole
/// entries are dropped
pub const WORLD_DESCRIPTION_LIMIT: usize = 160;

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
    pub max_tokens: u32,
    pub search_limit: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl ExtractOptions {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }
}

// ============================================================================
// Idea Parsing
// ============================================================================

static AT_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z][\w'-]*)").expect("Failed to compile @mention regex"));

static LINK_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("Failed to compile [[link]] regex"));

/// `Kind: Name - detail`
static KIND_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z ]{0,30}?)\s*:\s*(.+?)\s+-\s+(.+?)\s*$")
        .expect("Failed to compile kind line regex")
});

/// Facts pulled out of the free-text project idea
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedIdea {
    pub premise: Option<String>,
    pub themes: Vec<String>,
    pub mentions: Vec<EntityMention>,
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .and_then(|_| line.get(prefix.len()..))
}

fn split_list(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Best-effort parse of the project idea field
pub fn parse_idea(
    idea: &str,
    characters: &[CharacterSummary],
    world_entries: &[WorldEntry],
) -> ParsedIdea {
    let classify = |name: &str| -> String {
        if characters.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            "character".to_string()
        } else if let Some(entry) = world_entries.iter().find(|w| w.name.eq_ignore_ascii_case(name)) {
            if entry.category.is_empty() {
                "world".to_string()
            } else {
                entry.category.to_lowercase()
            }
        } else {
            "entity".to_string()
        }
    };

    let mut parsed = ParsedIdea::default();
    let mut free_text = Vec::new();

    for line in idea.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = strip_prefix_ci(line, "premise:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                parsed.premise = Some(rest.to_string());
            }
            continue;
        }
        if let Some(rest) = strip_prefix_ci(line, "themes:") {
            parsed.themes.extend(split_list(rest));
            continue;
        }
        if let Some(caps) = KIND_LINE.captures(line) {
            parsed.mentions.push(EntityMention {
                kind: caps[1].trim().to_lowercase(),
                name: caps[2].trim().to_string(),
                detail: Some(caps[3].trim().to_string()),
            });
            continue;
        }
        free_text.push(line);
    }

    for caps in AT_MENTION.captures_iter(idea) {
        let name = &caps[1];
        parsed.mentions.push(EntityMention {
            kind: classify(name),
            name: name.to_string(),
            detail: None,
        });
    }
    for caps in LINK_MENTION.captures_iter(idea) {
        let name = caps[1].trim();
        parsed.mentions.push(EntityMention {
            kind: classify(name),
            name: name.to_string(),
            detail: None,
        });
    }

    let mut seen = std::collections::HashSet::new();
    parsed
        .mentions
        .retain(|m| seen.insert(m.name.to_lowercase()));

    if parsed.premise.is_none() && !free_text.is_empty() {
        parsed.premise = Some(free_text.join(" "));
    }

    parsed
}

/// Explicit themes, then `Themes:` lines, then the genre; deduplicated
fn derive_themes(raw: &RawProjectData, idea_themes: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.themes
        .iter()
        .chain(idea_themes.iter())
        .chain(raw.genre.iter())
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Extraction
// ============================================================================

fn build_context(project_id: &str, raw: &RawProjectData) -> ProjectContext {
    let idea = parse_idea(
        raw.idea.as_deref().unwrap_or_default(),
        &raw.characters,
        &raw.world_entries,
    );
    let themes = derive_themes(raw, &idea.themes);

    let mut context = ProjectContext::empty(project_id);
    context.premise = idea.premise;
    context.themes = themes;
    context.mentions = idea.mentions;
    context.characters = raw
        .characters
        .iter()
        .filter(|c| !c.name.trim().is_empty() || !c.id.is_empty())
        .map(|c| {
            let mut c = c.clone();
            if c.name.trim().is_empty() {
                c.name = c.id.clone();
            }
            c
        })
        .collect();
    context.world_entries = raw
        .world_entries
        .iter()
        .filter(|w| !w.name.trim().is_empty())
        .cloned()
        .collect();
    context.chapter_summaries = raw.chapters.clone();
    context.chapter_summaries.sort_by_key(|c| c.number);
    context.timeline = raw.timeline.clone();
    context
}

/// Build a token-bounded context from raw project data
pub fn extract(project_id: &str, raw: &RawProjectData, options: &ExtractOptions) -> ProjectContext {
    let context = trim_to_budget(&build_context(project_id, raw), options.max_tokens);
    log::debug!(
        "Extracted context for project {}: {} characters, {} world entries, ~{} tokens",
        project_id,
        context.characters.len(),
        context.world_entries.len(),
        context.token_estimate
    );
    context
}

/// Extract, adding supplemental passages from the retrieval service.
///
/// A retrieval failure is logged and yields no passages.
pub async fn extract_with_retrieval(
    project_id: &str,
    raw: &RawProjectData,
    options: &ExtractOptions,
    retrieval: &dyn RetrievalService,
    query: &str,
) -> ProjectContext {
    let mut context = build_context(project_id, raw);

    if options.search_limit > 0 && !query.trim().is_empty() {
        match retrieval.search(query, project_id, options.search_limit).await {
            Ok(hits) => {
                context.supplemental = hits
                    .into_iter()
                    .take(options.search_limit)
                    .map(SupplementalPassage::from)
                    .collect();
            }
            Err(e) => {
                log::warn!("Context retrieval failed for project {}: {}", project_id, e);
            }
        }
    }

    let context = trim_to_budget(&context, options.max_tokens);
    log::debug!(
        "Extracted context for project {} with {} passages, ~{} tokens",
        project_id,
        context.supplemental.len(),
        context.token_estimate
    );
    context
}

// ============================================================================
// Budget Trimming
// ============================================================================

fn mark(context: &mut ProjectContext, section: &str) {
    if !context.trimmed_sections.iter().any(|s| s == section) {
        context.trimmed_sections.push(section.to_string());
    }
}

/// Pop items until the character count is within budget. `chars` stays an
/// upper bound of the rendered length.
fn drop_from_end<T>(items: &mut Vec<T>, line: fn(&T) -> String, chars: &mut usize, budget: usize) -> bool {
    let mut dropped = false;
    while *chars > budget {
        let Some(item) = items.pop() else {
            break;
        };
        *chars = chars.saturating_sub(line(&item).chars().count() + 1);
        dropped = true;
    }
    dropped
}

fn truncate_chars(text: &str, limit: usize) -> Option<String> {
    if text.chars().count() <= limit {
        return None;
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push('…');
    Some(cut)
}

/// Re-apply the trimming order to a context, returning a new context
pub fn trim_to_budget(context: &ProjectContext, max_tokens: u32) -> ProjectContext {
    let mut trimmed = context.clone();
    let budget = max_tokens as usize * 4;
    let mut chars = trimmed.render().chars().count();

    if chars > budget {
        if drop_from_end(&mut trimmed.timeline, |e| e.line(), &mut chars, budget) {
            mark(&mut trimmed, SECTION_TIMELINE);
        }
        if drop_from_end(&mut trimmed.chapter_summaries, |c| c.line(), &mut chars, budget) {
            mark(&mut trimmed, SECTION_CHAPTERS);
        }
        if drop_from_end(&mut trimmed.supplemental, |p| p.line(), &mut chars, budget) {
            mark(&mut trimmed, SECTION_SUPPLEMENTAL);
        }
        if drop_from_end(&mut trimmed.mentions, |m| m.line(), &mut chars, budget) {
            mark(&mut trimmed, SECTION_MENTIONS);
        }
    }

    if chars > budget {
        let mut truncated = false;
        for entry in trimmed.world_entries.iter_mut() {
            if let Some(cut) = truncate_chars(&entry.description, WORLD_DESCRIPTION_LIMIT) {
                entry.description = cut;
                truncated = true;
            }
        }
        if truncated {
            mark(&mut trimmed, SECTION_WORLD);
            chars = trimmed.render().chars().count();
        }
        if drop_from_end(&mut trimmed.world_entries, |w| w.line(), &mut chars, budget) {
            mark(&mut trimmed, SECTION_WORLD);
        }
    }

    if chars > budget {
        for character in trimmed.characters.iter_mut().rev() {
            if chars <= budget {
                break;
            }
            let before = character.line().chars().count();
            character.description = None;
            character.traits.clear();
            chars = chars.saturating_sub(before - character.line().chars().count());
        }
        mark(&mut trimmed, SECTION_CHARACTERS);
    }

    trimmed.token_estimate = trimmed.measure_tokens();
    if trimmed.token_estimate > max_tokens {
        log::warn!(
            "Context for project {} still ~{} tokens after trimming (budget {})",
            trimmed.project_id,
            trimmed.token_estimate,
            max_tokens
        );
    } else if !trimmed.trimmed_sections.is_empty() {
        log::debug!(
            "Trimmed context for project {}: {:?}",
            trimmed.project_id,
            trimmed.trimmed_sections
        );
    }
    trimmed
}

// ============================================================================
// Tests
// ============================================================================
