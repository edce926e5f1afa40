//! Scenario tests
//!
//! Fixed inputs with fully specified outcomes, covering the retry path, the
//! permanent-failure path, direct template generation and context budgeting.

use std::sync::Arc;
use std::time::Duration;

use crate::core::context::{
    extract, CharacterSummary, ExtractOptions, RawProjectData, WorldEntry,
};
use crate::core::generation::RecordingSleeper;
use crate::core::plot::{
    generate_template_plot, PlotGenerationRequest, PlotPointType, ResultSource, StructureType,
    AI_CONFIDENCE, FALLBACK_CONFIDENCE,
};
use crate::tests::mocks::{
    orchestrator_with, three_act_request, unavailable, valid_plot_json, ScriptedGateway,
};

// =============================================================================
// Gateway recovers after transient failures
// =============================================================================

#[tokio::test]
async fn test_two_failures_then_success() {
    let request = three_act_request();
    let gateway = Arc::new(
        ScriptedGateway::new()
            .then_fail(unavailable())
            .then_fail(unavailable())
            .then_respond(valid_plot_json(&request)),
    );
    let sleeper = Arc::new(RecordingSleeper::new());

    let result = orchestrator_with(gateway.clone(), sleeper.clone())
        .generate_plot(&request)
        .await;

    assert_eq!(result.metadata.source, ResultSource::Ai);
    assert_eq!(result.confidence, AI_CONFIDENCE);
    let structure = result.structure.unwrap();
    assert_eq!(structure.acts.len(), 3);
    assert_eq!(structure.total_chapters(), 12);

    assert_eq!(gateway.call_count(), 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
    assert_eq!(result.metadata.retries, 2);
    assert_eq!(result.metadata.total_backoff_ms, 300);
}

#[tokio::test]
async fn test_confidence_reported_in_body_is_used() {
    let request = three_act_request();
    let body = serde_json::json!({
        "structure": generate_template_plot(&request, StructureType::ThreeAct),
        "suggestions": [],
        "confidence": 0.8
    })
    .to_string();
    let gateway = Arc::new(ScriptedGateway::new().then_fail(unavailable()).then_respond(body));
    let sleeper = Arc::new(RecordingSleeper::new());

    let result = orchestrator_with(gateway, sleeper.clone()).generate_plot(&request).await;

    assert!((result.confidence - 0.8).abs() < f32::EPSILON);
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(100)]);
}

#[tokio::test]
async fn test_out_of_range_chapters_fall_back_instead_of_panicking() {
    let request = three_act_request();
    let body = serde_json::json!({
        "structure": {
            "structureType": "three-act",
            "acts": [{
                "label": "A",
                "startChapter": 1,
                "endChapter": u32::MAX,
                "points": [{"type": "setup", "label": "Open", "description": "x", "position": 1}]
            }]
        }
    })
    .to_string();
    let gateway = Arc::new(
        ScriptedGateway::new()
            .then_respond(body.clone())
            .then_respond(body),
    );
    let sleeper = Arc::new(RecordingSleeper::new());

    let result = orchestrator_with(gateway.clone(), sleeper.clone())
        .generate_plot(&request)
        .await;

    assert_eq!(result.metadata.source, ResultSource::Template);
    assert_eq!(gateway.call_count(), 2);
    assert_eq!(result.structure.unwrap().validate(12), Ok(()));
}

// =============================================================================
// Gateway never recovers
// =============================================================================

#[tokio::test]
async fn test_permanent_failure_uses_template() {
    let request = three_act_request();
    let gateway = Arc::new(ScriptedGateway::always_failing(unavailable));
    let sleeper = Arc::new(RecordingSleeper::new());

    let result = orchestrator_with(gateway.clone(), sleeper.clone())
        .generate_plot(&request)
        .await;

    assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    assert_eq!(result.metadata.source, ResultSource::Template);
    assert_eq!(gateway.call_count(), 4);
    assert_eq!(sleeper.total(), Duration::from_millis(700));

    let ranges: Vec<(u32, u32)> = result
        .structure
        .unwrap()
        .acts
        .iter()
        .map(|a| (a.start_chapter, a.end_chapter))
        .collect();
    assert_eq!(ranges, vec![(1, 3), (4, 9), (10, 12)]);

    assert_eq!(result.alternatives.len(), 3);
    assert_eq!(result.suggestions.len(), 6);
    assert_eq!(
        result.metadata.state_trace.last().map(String::as_str),
        Some("done")
    );
    assert!(result
        .metadata
        .state_trace
        .iter()
        .any(|s| s == "falling_back"));
}

// =============================================================================
// Direct template generation
// =============================================================================

#[test]
fn test_kishotenketsu_direct_template() {
    let request = PlotGenerationRequest::builder("novel-2", "Two sisters trade lives for a summer")
        .structure(StructureType::Kishotenketsu)
        .target_length(8)
        .build()
        .unwrap();

    let plot = generate_template_plot(&request, request.structure());

    assert_eq!(plot.acts.len(), 4);
    assert!(plot.acts.iter().all(|a| a.chapter_count() == 2));
    assert_eq!(plot.climax_act(), Some(2));
    assert!(plot.acts[2]
        .points
        .iter()
        .any(|p| p.point_type == PlotPointType::Climax));
}

// =============================================================================
// Context budget
// =============================================================================

#[test]
fn test_large_cast_and_world_bible_fit_budget() {
    let raw = RawProjectData {
        idea: Some("Premise: An empire's archivists rewrite history one ledger at a time".into()),
        characters: (0..40)
            .map(|i| {
                CharacterSummary::named(format!("c{i}"), format!("Archivist {i}"))
                    .with_role("scribe")
                    .with_traits(vec!["meticulous".into(), "secretive".into()])
                    .with_description("Keeps a private copy of every page she is told to burn.")
            })
            .collect(),
        // ~50k tokens of world bible
        world_entries: (0..100)
            .map(|i| WorldEntry::new(format!("Vault {i}"), "place", "stone and dust ".repeat(143)))
            .collect(),
        ..Default::default()
    };
    let options = ExtractOptions::default();

    let context = extract("empire", &raw, &options);

    assert!(context.token_estimate <= options.max_tokens);
    let names = context.character_names();
    assert_eq!(names.len(), 40);
    for i in 0..40 {
        let name = format!("Archivist {i}");
        assert!(names.contains(&name.as_str()), "missing {name}");
    }
    assert!(!context.trimmed_sections.is_empty());
}
