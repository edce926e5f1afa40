//! Plot Pipeline Integration Tests
//!
//! - Project facts and retrieval passages reach the provider request
//! - A 503 is retried and the next response is used
//! - Second request for an unchanged project is served from the cache
//! - Editing the project invalidates the cached context

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::context::retrieval::MockRetrievalService;
use crate::core::context::{
    CharacterSummary, ContextCache, ContextStore, InMemoryProjectSource, SearchHit,
};
use crate::core::generation::{GenerationOrchestrator, RecordingSleeper};
use crate::core::llm::{ModelCatalog, OpenAiCompatibleGateway};
use crate::core::plot::{ResultSource, SuggestionCategory, AI_CONFIDENCE};
use crate::tests::mocks::{sample_project, three_act_request, valid_plot_json};

fn completion(content: String) -> serde_json::Value {
    json!({
        "model": "story-standard",
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

fn catalog() -> ModelCatalog {
    ModelCatalog {
        fast: "story-fast".into(),
        standard: "story-standard".into(),
        advanced: "story-advanced".into(),
    }
}

fn retrieval_once() -> MockRetrievalService {
    let mut retrieval = MockRetrievalService::new();
    retrieval
        .expect_search()
        .times(1)
        .returning(|_, _, _| {
            Ok(vec![SearchHit {
                kind: "chapter".into(),
                id: "ch-3".into(),
                snippet: "The bottle washed up at low tide".into(),
                score: 0.87,
            }])
        });
    retrieval
}

#[tokio::test]
async fn test_pipeline_retries_then_uses_provider_output() {
    let server = MockServer::start().await;
    let request = three_act_request();

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Maren"))
        .and(body_string_contains("The bottle washed up at low tide"))
        .and(body_string_contains("story-standard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(valid_plot_json(&request))))
        .expect(1)
        .mount(&server)
        .await;

    let gateway =
        OpenAiCompatibleGateway::new("sk-test", Some(format!("{}/v1", server.uri()))).unwrap();
    let source = InMemoryProjectSource::new().with_project("novel-1", sample_project());
    let sleeper = Arc::new(RecordingSleeper::new());

    let orchestrator = GenerationOrchestrator::builder(Arc::new(gateway))
        .source(Arc::new(source))
        .retrieval(Arc::new(retrieval_once()))
        .catalog(catalog())
        .sleeper(sleeper.clone())
        .build();

    let result = orchestrator.generate_plot(&request).await;

    assert_eq!(result.metadata.source, ResultSource::Ai);
    assert_eq!(result.metadata.model_id.as_deref(), Some("story-standard"));
    assert_eq!(result.metadata.tier.as_deref(), Some("standard"));
    assert_eq!(result.confidence, AI_CONFIDENCE);
    assert_eq!(result.suggestions[0].category, SuggestionCategory::Conflict);
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(100)]);
}

#[tokio::test]
async fn test_cached_context_until_project_changes() {
    let server = MockServer::start().await;
    let request = three_act_request();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(valid_plot_json(&request))))
        .expect(3)
        .mount(&server)
        .await;

    let gateway =
        OpenAiCompatibleGateway::new("sk-test", Some(format!("{}/v1", server.uri()))).unwrap();
    let source = Arc::new(InMemoryProjectSource::new().with_project("novel-1", sample_project()));
    let cache = Arc::new(ContextCache::default());

    let mut retrieval = MockRetrievalService::new();
    retrieval.expect_search().times(2).returning(|_, _, _| Ok(Vec::new()));

    let orchestrator = GenerationOrchestrator::builder(Arc::new(gateway))
        .source(source.clone())
        .retrieval(Arc::new(retrieval))
        .store(cache.clone())
        .sleeper(Arc::new(RecordingSleeper::new()))
        .build();

    orchestrator.generate_plot(&request).await;
    orchestrator.generate_plot(&request).await;

    let mut edited = sample_project();
    edited
        .characters
        .push(CharacterSummary::named("c3", "Ilse").with_role("harbourmaster"));
    source.upsert("novel-1", edited).await;

    let result = orchestrator.generate_plot(&request).await;
    assert_eq!(result.metadata.source, ResultSource::Ai);

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}
