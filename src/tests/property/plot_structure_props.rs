//! Property-based tests for template outlines
//!
//! Tests invariants:
//! - Acts partition `[1, target_length]` with no gaps or overlaps
//! - Exactly one climax, at least one resolution, opening beat first
//! - Same request produces the same outline
//! - Chapter distribution always covers the target

use proptest::prelude::*;

use crate::core::plot::{
    generate_template_alternatives, generate_template_plot, templates::distribute_chapters,
    PlotGenerationRequest, PlotPointType, StructureType,
};

fn structure_strategy() -> impl Strategy<Value = StructureType> {
    prop::sample::select(StructureType::ALL.to_vec())
}

fn request_strategy() -> impl Strategy<Value = PlotGenerationRequest> {
    (
        structure_strategy(),
        1u32..=120,
        "[a-zA-Z ]{1,60}",
        prop::collection::vec("[a-z]{1,8}", 0..5),
    )
        .prop_map(|(structure, length, premise, characters)| {
            PlotGenerationRequest::builder("prop", premise)
                .structure(structure)
                .target_length(length)
                .characters(characters)
                .build()
                .unwrap()
        })
}

proptest! {
    #[test]
    fn template_acts_partition_target(request in request_strategy()) {
        let plot = generate_template_plot(&request, request.structure());

        let mut next = 1;
        for act in &plot.acts {
            prop_assert_eq!(act.start_chapter, next);
            prop_assert!(act.end_chapter >= act.start_chapter);
            next = act.end_chapter + 1;
        }
        prop_assert_eq!(next - 1, request.target_length());
        prop_assert_eq!(plot.total_chapters(), request.target_length());
    }

    #[test]
    fn template_has_exactly_one_climax(request in request_strategy()) {
        let plot = generate_template_plot(&request, request.structure());
        prop_assert_eq!(plot.count_of(PlotPointType::Climax), 1);
        prop_assert!(plot.count_of(PlotPointType::Resolution) >= 1);
        prop_assert_eq!(plot.validate(request.target_length()), Ok(()));
    }

    #[test]
    fn template_generation_is_idempotent(request in request_strategy()) {
        let first = generate_template_plot(&request, request.structure());
        let second = generate_template_plot(&request, request.structure());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn alternatives_are_valid_and_distinct(request in request_strategy()) {
        let alternatives = generate_template_alternatives(&request);
        prop_assert_eq!(alternatives.len(), StructureType::ALL.len() - 1);
        for alt in &alternatives {
            prop_assert_ne!(alt.structure_type, request.structure());
            prop_assert!(alt.validate(request.target_length()).is_ok());
        }
    }

    #[test]
    fn distribution_covers_target(
        weights in prop::collection::vec(1u32..5, 1..8),
        target in 1u32..200,
    ) {
        let ranges = distribute_chapters(&weights, target);
        prop_assert_eq!(ranges.len(), weights.len().min(target as usize));
        prop_assert_eq!(ranges.first().map(|r| r.0), Some(1));
        prop_assert_eq!(ranges.last().map(|r| r.1), Some(target));
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[1].0, pair[0].1 + 1);
        }
    }
}
