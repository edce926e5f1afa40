//! Prompt Builder
//!
//! Task-specific system and user prompts. Every prompt spells out the JSON
//! shape the parser accepts, so a conforming provider needs no guessing.

use crate::core::plot::{PlotGenerationRequest, StructureType, TaskType};

const SYSTEM_BASE: &str = "You are a story architect who designs plot outlines for novelists. \
Ground every beat in the project context you are given: reuse the characters, places and themes \
it names instead of inventing replacements. Respond with a single JSON object and nothing else.";

const POINT_TYPES: &str = "inciting_incident, rising_action, midpoint, climax, falling_action, \
resolution, setup, exposition, ordinary_world, call_to_adventure, refusal_of_the_call, \
meeting_the_mentor, crossing_the_threshold, tests_allies_enemies, approach_to_inmost_cave, \
ordeal, reward, road_back, introduction, development, twist";

const SUGGESTION_CATEGORIES: &str = "character, conflict, theme, pacing, world_building, structure";

const STRUCTURE_SHAPE: &str = r#"{"structureType": "<type>", "acts": [{"label": "...", "startChapter": 1, "endChapter": 3, "points": [{"type": "<point type>", "label": "...", "description": "...", "position": 1, "characterIds": ["..."]}]}]}"#;

const SUGGESTION_SHAPE: &str = r#"{"text": "...", "category": "<category>", "relatedCharacters": ["..."]}"#;

fn structure_rules(request: &PlotGenerationRequest) -> String {
    format!(
        "Structure rules:\n\
         - Acts are contiguous and together cover chapters 1 to {target} exactly.\n\
         - Exactly one point across all acts has type \"climax\"; at least one has type \"resolution\".\n\
         - The first point is one of: inciting_incident, setup, exposition, ordinary_world, introduction.\n\
         - Every point's position lies inside its act's chapter range.\n\
         - Allowed point types: {types}.",
        target = request.target_length(),
        types = POINT_TYPES,
    )
}

fn structure_guidance(structure: StructureType) -> &'static str {
    match structure {
        StructureType::ThreeAct => "Use three acts (setup, confrontation, resolution) weighted roughly 1:2:1.",
        StructureType::FiveAct => "Use five acts: exposition, rising action, climax, falling action, denouement.",
        StructureType::HerosJourney => "Use Departure, Initiation and Return with the twelve stages of the hero's journey in order; the resurrection is the climax.",
        StructureType::Kishotenketsu => "Use four acts (ki, shō, ten, ketsu); the twist in ten carries the climax.",
    }
}

/// System prompt for a task
pub fn system_prompt(task: TaskType) -> String {
    let role = match task {
        TaskType::Structure => "Produce a complete outline together with improvement suggestions and alternative structures.",
        TaskType::Suggestions => "Produce concrete, project-specific suggestions for improving or extending the plot.",
        TaskType::Alternatives => "Produce alternative outlines that use different narrative structures for the same story.",
    };
    format!("{}\n\n{}", SYSTEM_BASE, role)
}

fn request_summary(request: &PlotGenerationRequest) -> String {
    let mut lines = vec![format!("Premise: {}", request.premise())];
    if !request.genre().is_empty() {
        lines.push(format!("Genre: {}", request.genre()));
    }
    lines.push(format!("Target length: {} chapters", request.target_length()));
    lines.push(format!("Structure: {}", request.structure().as_str()));
    if !request.character_ids().is_empty() {
        let ids: Vec<&str> = request.character_ids().iter().map(String::as_str).collect();
        lines.push(format!("Focus characters: {}", ids.join(", ")));
    }
    lines.join("\n")
}

/// User prompt for a task, including the required output shape
pub fn user_prompt(request: &PlotGenerationRequest, task: TaskType) -> String {
    let summary = request_summary(request);
    match task {
        TaskType::Structure => format!(
            "{summary}\n\n{guidance}\n\n{rules}\n\n\
             Return JSON of the form:\n\
             {{\"structure\": {structure}, \"suggestions\": [{suggestion}], \"alternatives\": [{structure}], \"confidence\": 0.0-1.0}}\n\
             Suggestion categories: {categories}.",
            summary = summary,
            guidance = structure_guidance(request.structure()),
            rules = structure_rules(request),
            structure = STRUCTURE_SHAPE,
            suggestion = SUGGESTION_SHAPE,
            categories = SUGGESTION_CATEGORIES,
        ),
        TaskType::Suggestions => format!(
            "{summary}\n\n\
             Return JSON of the form:\n\
             {{\"suggestions\": [{suggestion}], \"confidence\": 0.0-1.0}}\n\
             Suggestion categories: {categories}.",
            summary = summary,
            suggestion = SUGGESTION_SHAPE,
            categories = SUGGESTION_CATEGORIES,
        ),
        TaskType::Alternatives => {
            let others: Vec<&str> = StructureType::ALL
                .iter()
                .filter(|t| **t != request.structure())
                .map(StructureType::as_str)
                .collect();
            format!(
                "{summary}\n\n\
                 Write one outline for each of these structures: {others}.\n\n{rules}\n\n\
                 Return JSON of the form:\n\
                 {{\"alternatives\": [{structure}], \"confidence\": 0.0-1.0}}",
                summary = summary,
                others = others.join(", "),
                rules = structure_rules(request),
                structure = STRUCTURE_SHAPE,
            )
        }
    }
}

/// Query sent to the retrieval service for supplemental passages
pub fn retrieval_query(request: &PlotGenerationRequest) -> String {
    if request.genre().is_empty() {
        request.premise().trim().to_string()
    } else {
        format!("{} {}", request.premise().trim(), request.genre())
    }
}
