//! Template Fallback Generator
//!
//! Deterministic plot outlines for every supported structure type. Used when
//! the gateway is unavailable or its output cannot be trusted, and as the
//! source of alternative structures.
//!
//! Each structure type has one `StructureTemplate` implementation describing
//! its acts (label, weight, beats). Chapters are distributed by weight with
//! `distribute_chapters`, which always yields an exact partition of
//! `[1, target_length]`.

use super::types::{
    PlotAct, PlotGenerationRequest, PlotPoint, PlotPointType, PlotStructure, PlotSuggestion,
    StructureType, SuggestionCategory,
};
use crate::core::context::ProjectContext;

// ============================================================================
// Blueprints
// ============================================================================

/// A beat within an act blueprint
#[derive(Debug, Clone, Copy)]
pub struct BeatSpec {
    pub point_type: PlotPointType,
    pub label: &'static str,
    pub summary: &'static str,
}

/// An act blueprint: label, relative weight and ordered beats
#[derive(Debug, Clone, Copy)]
pub struct ActSpec {
    pub label: &'static str,
    pub weight: u32,
    pub beats: &'static [BeatSpec],
}

const fn beat(point_type: PlotPointType, label: &'static str, summary: &'static str) -> BeatSpec {
    BeatSpec {
        point_type,
        label,
        summary,
    }
}

/// One implementation per structure type
pub trait StructureTemplate: Send + Sync {
    fn structure_type(&self) -> StructureType;

    fn acts(&self) -> &'static [ActSpec];

    /// Build a complete outline for the request's target length
    fn build(&self, request: &PlotGenerationRequest) -> PlotStructure {
        build_from_blueprint(self.structure_type(), self.acts(), request)
    }
}

// ============================================================================
// Structure Templates
// ============================================================================

pub struct ThreeActTemplate;

const THREE_ACT: &[ActSpec] = &[
    ActSpec {
        label: "Act I: Setup",
        weight: 1,
        beats: &[
            beat(PlotPointType::Setup, "Setup", "Establish the protagonist, their world and what they want."),
            beat(PlotPointType::IncitingIncident, "Inciting Incident", "An event disrupts the status quo and forces a choice."),
        ],
    },
    ActSpec {
        label: "Act II: Confrontation",
        weight: 2,
        beats: &[
            beat(PlotPointType::RisingAction, "Rising Action", "Obstacles mount as the protagonist pursues the goal."),
            beat(PlotPointType::Midpoint, "Midpoint", "A revelation raises the stakes and changes the approach."),
            beat(PlotPointType::RisingAction, "All Is Lost", "The plan collapses and the cost of failure becomes real."),
        ],
    },
    ActSpec {
        label: "Act III: Resolution",
        weight: 1,
        beats: &[
            beat(PlotPointType::Climax, "Climax", "The central conflict comes to a head in a decisive confrontation."),
            beat(PlotPointType::FallingAction, "Falling Action", "Consequences of the climax ripple outward."),
            beat(PlotPointType::Resolution, "Resolution", "A new equilibrium shows how the characters have changed."),
        ],
    },
];

impl StructureTemplate for ThreeActTemplate {
    fn structure_type(&self) -> StructureType {
        StructureType::ThreeAct
    }

    fn acts(&self) -> &'static [ActSpec] {
        THREE_ACT
    }
}

pub struct FiveActTemplate;

const FIVE_ACT: &[ActSpec] = &[
    ActSpec {
        label: "Act I: Exposition",
        weight: 1,
        beats: &[
            beat(PlotPointType::Exposition, "Exposition", "Introduce the setting, the cast and the tensions beneath the surface."),
            beat(PlotPointType::IncitingIncident, "Inciting Incident", "A spark sets the central conflict in motion."),
        ],
    },
    ActSpec {
        label: "Act II: Rising Action",
        weight: 1,
        beats: &[beat(PlotPointType::RisingAction, "Complications", "Complications multiply and alliances are tested.")],
    },
    ActSpec {
        label: "Act III: Climax",
        weight: 1,
        beats: &[beat(PlotPointType::Climax, "Climax", "The turning point from which there is no going back.")],
    },
    ActSpec {
        label: "Act IV: Falling Action",
        weight: 1,
        beats: &[beat(PlotPointType::FallingAction, "Falling Action", "The fallout unfolds and a final reversal looms.")],
    },
    ActSpec {
        label: "Act V: Denouement",
        weight: 1,
        beats: &[beat(PlotPointType::Resolution, "Denouement", "Loose ends are tied and the story's meaning settles.")],
    },
];

impl StructureTemplate for FiveActTemplate {
    fn structure_type(&self) -> StructureType {
        StructureType::FiveAct
    }

    fn acts(&self) -> &'static [ActSpec] {
        FIVE_ACT
    }
}

pub struct HerosJourneyTemplate;

const HEROS_JOURNEY: &[ActSpec] = &[
    ActSpec {
        label: "Departure",
        weight: 1,
        beats: &[
            beat(PlotPointType::OrdinaryWorld, "The Ordinary World", "The hero's everyday life and the lack within it."),
            beat(PlotPointType::CallToAdventure, "The Call to Adventure", "A challenge or opportunity appears."),
            beat(PlotPointType::RefusalOfTheCall, "Refusal of the Call", "Fear or duty makes the hero hesitate."),
            beat(PlotPointType::MeetingTheMentor, "Meeting the Mentor", "Guidance, training or a gift prepares the hero."),
            beat(PlotPointType::CrossingTheThreshold, "Crossing the Threshold", "The hero commits and enters the unknown."),
        ],
    },
    ActSpec {
        label: "Initiation",
        weight: 2,
        beats: &[
            beat(PlotPointType::TestsAlliesEnemies, "Tests, Allies and Enemies", "The rules of the new world are learned the hard way."),
            beat(PlotPointType::ApproachToInmostCave, "Approach to the Inmost Cave", "Preparations for the central ordeal."),
            beat(PlotPointType::Ordeal, "The Ordeal", "The hero faces their greatest fear so far."),
            beat(PlotPointType::Reward, "The Reward", "Having survived, the hero seizes the prize."),
            beat(PlotPointType::RoadBack, "The Road Back", "Pursuit or consequence drives the hero home."),
        ],
    },
    ActSpec {
        label: "Return",
        weight: 1,
        beats: &[
            beat(PlotPointType::Climax, "The Resurrection", "A final test where everything learned is put on the line."),
            beat(PlotPointType::Resolution, "Return with the Elixir", "The hero returns transformed, carrying something that heals their world."),
        ],
    },
];

impl StructureTemplate for HerosJourneyTemplate {
    fn structure_type(&self) -> StructureType {
        StructureType::HerosJourney
    }

    fn acts(&self) -> &'static [ActSpec] {
        HEROS_JOURNEY
    }
}

pub struct KishotenketsuTemplate;

const KISHOTENKETSU: &[ActSpec] = &[
    ActSpec {
        label: "Ki: Introduction",
        weight: 1,
        beats: &[beat(PlotPointType::Introduction, "Introduction", "Characters and setting are presented without conflict.")],
    },
    ActSpec {
        label: "Shō: Development",
        weight: 1,
        beats: &[beat(PlotPointType::Development, "Development", "The situation deepens and the characters grow familiar.")],
    },
    ActSpec {
        label: "Ten: Twist",
        weight: 1,
        beats: &[
            beat(PlotPointType::Twist, "Twist", "An unexpected element recasts everything seen so far."),
            beat(PlotPointType::Climax, "Convergence", "The twist and the established world collide."),
        ],
    },
    ActSpec {
        label: "Ketsu: Reconciliation",
        weight: 1,
        beats: &[beat(PlotPointType::Resolution, "Reconciliation", "The pieces are brought into a new harmony.")],
    },
];

impl StructureTemplate for KishotenketsuTemplate {
    fn structure_type(&self) -> StructureType {
        StructureType::Kishotenketsu
    }

    fn acts(&self) -> &'static [ActSpec] {
        KISHOTENKETSU
    }
}

/// Get the template implementation for a structure type
pub fn template_for(structure_type: StructureType) -> &'static dyn StructureTemplate {
    match structure_type {
        StructureType::ThreeAct => &ThreeActTemplate,
        StructureType::FiveAct => &FiveActTemplate,
        StructureType::HerosJourney => &HerosJourneyTemplate,
        StructureType::Kishotenketsu => &KishotenketsuTemplate,
    }
}

// ============================================================================
// Chapter Distribution
// ============================================================================

/// Split `[1, target_length]` into contiguous inclusive ranges by weight.
///
/// Each act gets the floor of its weighted share, the final act takes the
/// remainder, and any empty act borrows one chapter from the largest. When
/// there are fewer chapters than acts, one single-chapter range is returned
/// per chapter and the caller merges the trailing acts.
pub fn distribute_chapters(weights: &[u32], target_length: u32) -> Vec<(u32, u32)> {
    let slots = weights.len().min(target_length as usize);
    if slots == 0 {
        return Vec::new();
    }
    if slots < weights.len() {
        return (1..=target_length).map(|c| (c, c)).collect();
    }

    let total_weight = weights.iter().map(|w| *w as u64).sum::<u64>().max(1);
    let last = weights.len() - 1;
    let mut counts: Vec<u32> = weights
        .iter()
        .map(|w| (target_length as u64 * *w as u64 / total_weight) as u32)
        .collect();
    let assigned: u32 = counts[..last].iter().sum();
    counts[last] = target_length - assigned;

    while let Some(empty) = counts.iter().position(|c| *c == 0) {
        let mut largest = 0;
        for (i, count) in counts.iter().enumerate() {
            if *count > counts[largest] {
                largest = i;
            }
        }
        counts[largest] -= 1;
        counts[empty] += 1;
    }

    let mut start = 1;
    counts
        .into_iter()
        .map(|count| {
            let range = (start, start + count - 1);
            start += count;
            range
        })
        .collect()
}

/// Spread `count` beats across an inclusive chapter range, first at the
/// start and last at the end
fn beat_positions(start: u32, end: u32, count: usize) -> Vec<u32> {
    if count <= 1 {
        return vec![start; count];
    }
    let span = (end - start) as u64;
    let steps = (count - 1) as u64;
    (0..count as u64)
        .map(|i| start + (i * span / steps) as u32)
        .collect()
}

fn build_from_blueprint(
    structure_type: StructureType,
    specs: &'static [ActSpec],
    request: &PlotGenerationRequest,
) -> PlotStructure {
    let weights: Vec<u32> = specs.iter().map(|s| s.weight).collect();
    let ranges = distribute_chapters(&weights, request.target_length());

    // Fewer chapters than acts: the trailing blueprints collapse into the last slot
    let mut groups: Vec<Vec<&ActSpec>> = specs.iter().take(ranges.len()).map(|s| vec![s]).collect();
    if let Some(last) = groups.last_mut() {
        last.extend(specs.iter().skip(ranges.len()));
    }

    let cast: Vec<String> = request.character_ids().iter().cloned().collect();
    let premise = request.premise().trim();

    let acts = groups
        .into_iter()
        .zip(ranges)
        .enumerate()
        .map(|(index, (group, (start, end)))| {
            let label = group.iter().map(|s| s.label).collect::<Vec<_>>().join(" / ");
            let beats: Vec<&BeatSpec> = group.iter().flat_map(|s| s.beats.iter()).collect();
            let positions = beat_positions(start, end, beats.len());

            let points = beats
                .into_iter()
                .zip(positions)
                .map(|(beat, position)| {
                    let description = if beat.point_type.is_opening_beat() && !premise.is_empty() {
                        format!("{} Premise: {}", beat.summary, premise)
                    } else {
                        beat.summary.to_string()
                    };
                    let character_ids = match beat.point_type {
                        PlotPointType::Climax | PlotPointType::Resolution => cast.clone(),
                        t if t.is_opening_beat() => cast.clone(),
                        _ => Vec::new(),
                    };
                    PlotPoint {
                        point_type: beat.point_type,
                        label: beat.label.to_string(),
                        description,
                        position,
                        character_ids,
                    }
                })
                .collect();

            PlotAct {
                index,
                label,
                start_chapter: start,
                end_chapter: end,
                points,
            }
        })
        .collect();

    PlotStructure {
        structure_type,
        acts,
    }
}

// ============================================================================
// Public Generators
// ============================================================================

/// Deterministic outline for a structure type at the request's length
pub fn generate_template_plot(
    request: &PlotGenerationRequest,
    structure_type: StructureType,
) -> PlotStructure {
    template_for(structure_type).build(request)
}

/// Outlines for every other structure type, in canonical order
pub fn generate_template_alternatives(request: &PlotGenerationRequest) -> Vec<PlotStructure> {
    StructureType::ALL
        .iter()
        .filter(|t| **t != request.structure())
        .map(|t| generate_template_plot(request, *t))
        .collect()
}

/// Generic but context-aware suggestions, one per category
pub fn generate_default_suggestions(
    request: &PlotGenerationRequest,
    context: Option<&ProjectContext>,
) -> Vec<PlotSuggestion> {
    let mut suggestions = Vec::with_capacity(6);
    let midpoint = (request.target_length() / 2).max(1);

    let lead = context.and_then(|c| c.characters.first());
    suggestions.push(match lead {
        Some(character) => PlotSuggestion::new(
            SuggestionCategory::Character,
            format!(
                "Give {} a personal stake that the climax forces them to risk.",
                character.name
            ),
        )
        .with_characters(vec![character.id.clone()]),
        None => PlotSuggestion::new(
            SuggestionCategory::Character,
            "Define a protagonist whose want directly collides with the premise.",
        )
        .with_characters(request.character_ids().iter().cloned().collect()),
    });

    suggestions.push(PlotSuggestion::new(
        SuggestionCategory::Conflict,
        format!(
            "Escalate the central conflict before chapter {} so the midpoint lands as a reversal.",
            midpoint
        ),
    ));

    let theme = context
        .and_then(|c| c.themes.first().cloned())
        .or_else(|| (!request.genre().is_empty()).then(|| request.genre().to_string()));
    suggestions.push(PlotSuggestion::new(
        SuggestionCategory::Theme,
        match theme {
            Some(theme) => format!("Echo the theme of {} in both the midpoint and the resolution.", theme),
            None => "Name the question the story is asking and let the resolution answer it.".to_string(),
        },
    ));

    let pacing = if request.target_length() > 30 {
        "With a long run of chapters, plan sub-plots that peak between the main beats."
    } else if request.target_length() < 6 {
        "With few chapters, merge setup and inciting incident into the opening scene."
    } else {
        "Alternate high-tension chapters with quieter ones to let consequences breathe."
    };
    suggestions.push(PlotSuggestion::new(SuggestionCategory::Pacing, pacing));

    let place = context.and_then(|c| c.world_entries.first());
    suggestions.push(PlotSuggestion::new(
        SuggestionCategory::WorldBuilding,
        match place {
            Some(entry) => format!("Let {} actively complicate the protagonist's plans.", entry.name),
            None => "Establish the rules of the setting early so later twists feel earned.".to_string(),
        },
    ));

    suggestions.push(PlotSuggestion::new(
        SuggestionCategory::Structure,
        format!(
            "Keep the {} beats visible: every act should end on a change of direction.",
            request.structure().display_name()
        ),
    ));

    suggestions
}

// ============================================================================
// Tests
// ============================================================================
