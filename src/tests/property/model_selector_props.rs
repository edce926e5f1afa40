//! Property-based tests for model tier selection
//!
//! Tests invariants:
//! - Tier never decreases when the story gets longer
//! - Tier never decreases when more characters are involved
//! - Tier never decreases for a more complex structure type
//! - Tier never decreases when the context grows
//! - Selected model always comes from the catalog

use proptest::prelude::*;

use crate::core::context::{CharacterSummary, ProjectContext, TimelineEvent};
use crate::core::llm::{tier_for_score, ModelCatalog, ModelSelector};
use crate::core::plot::{PlotGenerationRequest, StructureType, TaskType};

fn task_strategy() -> impl Strategy<Value = TaskType> {
    prop::sample::select(vec![TaskType::Structure, TaskType::Suggestions, TaskType::Alternatives])
}

fn request(structure: StructureType, length: u32, cast: usize) -> PlotGenerationRequest {
    PlotGenerationRequest::builder("prop", "premise")
        .structure(structure)
        .target_length(length)
        .characters((0..cast).map(|i| format!("c{i}")))
        .build()
        .unwrap()
}

/// Structure types from simplest to most complex; equal-rank types share a slot
fn complexity_rank(structure: StructureType) -> u8 {
    match structure {
        StructureType::ThreeAct => 0,
        StructureType::FiveAct => 1,
        StructureType::HerosJourney | StructureType::Kishotenketsu => 2,
    }
}

fn context(characters: usize, events: usize, themes: usize) -> ProjectContext {
    ProjectContext {
        characters: (0..characters)
            .map(|i| CharacterSummary::named(format!("c{i}"), format!("Name{i}")))
            .collect(),
        timeline: (0..events)
            .map(|i| TimelineEvent {
                title: format!("event {i}"),
                ..Default::default()
            })
            .collect(),
        themes: (0..themes).map(|i| format!("theme {i}")).collect(),
        ..ProjectContext::empty("prop")
    }
}

proptest! {
    #[test]
    fn tier_monotonic_in_length(
        task in task_strategy(),
        structure in prop::sample::select(StructureType::ALL.to_vec()),
        length in 1u32..100,
        extra in 0u32..100,
        cast in 0usize..12,
    ) {
        let selector = ModelSelector::default();
        let short = selector.select_model(&request(structure, length, cast), task, None);
        let long = selector.select_model(&request(structure, length + extra, cast), task, None);
        prop_assert!(long.tier >= short.tier);
    }

    #[test]
    fn tier_monotonic_in_cast(
        task in task_strategy(),
        length in 1u32..60,
        cast in 0usize..12,
        extra in 0usize..12,
    ) {
        let selector = ModelSelector::default();
        let small = selector.select_model(&request(StructureType::ThreeAct, length, cast), task, None);
        let large = selector.select_model(&request(StructureType::ThreeAct, length, cast + extra), task, None);
        prop_assert!(large.tier >= small.tier);
    }

    #[test]
    fn tier_monotonic_in_structure_complexity(
        task in task_strategy(),
        simpler in prop::sample::select(StructureType::ALL.to_vec()),
        richer in prop::sample::select(StructureType::ALL.to_vec()),
        length in 1u32..60,
        cast in 0usize..12,
        characters in 0usize..12,
        events in 0usize..20,
        themes in 0usize..8,
    ) {
        prop_assume!(complexity_rank(simpler) <= complexity_rank(richer));
        let selector = ModelSelector::default();
        let ctx = context(characters, events, themes);
        let before = selector.select_model(&request(simpler, length, cast), task, Some(&ctx));
        let after = selector.select_model(&request(richer, length, cast), task, Some(&ctx));
        prop_assert!(after.score >= before.score);
        prop_assert!(after.tier >= before.tier);
    }

    #[test]
    fn tier_monotonic_in_context(
        task in task_strategy(),
        characters in 0usize..12,
        events in 0usize..20,
        themes in 0usize..8,
        grow in 0usize..10,
    ) {
        let selector = ModelSelector::default();
        let req = request(StructureType::FiveAct, 12, 0);
        let before = selector.select_model(&req, task, Some(&context(characters, events, themes)));
        let after = selector.select_model(
            &req,
            task,
            Some(&context(characters + grow, events + grow, themes + grow)),
        );
        prop_assert!(after.score >= before.score);
        prop_assert!(after.tier >= before.tier);
    }

    #[test]
    fn tier_for_score_is_monotonic(score in 0u32..20, extra in 0u32..20) {
        prop_assert!(tier_for_score(score + extra) >= tier_for_score(score));
    }

    #[test]
    fn model_comes_from_catalog(task in task_strategy(), length in 1u32..80, cast in 0usize..10) {
        let catalog = ModelCatalog::default();
        let selection = ModelSelector::new(catalog.clone())
            .select_model(&request(StructureType::HerosJourney, length, cast), task, None);
        prop_assert_eq!(selection.model_id.as_str(), catalog.model_for(selection.tier));
    }
}
