//! Generation Orchestrator
//!
//! Top-level entry point for plot generation. Each request runs as one
//! sequential pipeline:
//!
//! ```text
//! Idle -> ContextResolved -> PromptBuilt -> Calling -+-> Succeeded ---> Done
//!                                  ^                 |
//!                                  +--- Retrying <---+-> FallingBack -> Done
//! ```
//!
//! Gateway failures and malformed output never reach the caller: they are
//! retried with exponential backoff where that can help, and otherwise
//! resolved by the template generator. Only cancellation is reported as an
//! error.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::GenerationError;
use super::prompts;
use super::retry::{classify_gateway_error, RetryConfig, Sleeper, TokioSleeper};
use super::state::{GenerationState, StateTracker};
use crate::core::context::{
    extract_with_retrieval, inject, ContextCache, ContextStore, ExtractOptions, InMemoryProjectSource,
    InjectOptions, InjectedPrompts, NoopRetrieval, ProjectContext, ProjectDataSource, RawProjectData,
    RetrievalService,
};
use crate::core::llm::{
    GatewayError, GatewayRequest, ModelCatalog, ModelSelection, ModelSelector, TextGenerationGateway,
};
use crate::core::plot::{
    generate_default_suggestions, generate_template_alternatives, generate_template_plot,
    parse_plot_response, GenerationMetadata, ParsedPlot, PlotGenerationRequest,
    PlotGenerationResult, ResultSource, TaskType, AI_CONFIDENCE, FALLBACK_CONFIDENCE,
};

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub extract: ExtractOptions,
    pub inject: InjectOptions,
    pub retry: RetryConfig,
    /// Default gateway temperature; a request may override it
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

// ============================================================================
// Call Outcome
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct CallStats {
    attempts: u32,
    retries: u32,
    parse_retries: u32,
    backoff: Duration,
}

enum CallOutcome {
    Success {
        parsed: ParsedPlot,
        model: String,
        confidence: f32,
        stats: CallStats,
    },
    Fallback {
        reason: GenerationError,
        stats: CallStats,
    },
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct GenerationOrchestrator {
    gateway: Arc<dyn TextGenerationGateway>,
    source: Arc<dyn ProjectDataSource>,
    retrieval: Arc<dyn RetrievalService>,
    store: Arc<dyn ContextStore>,
    selector: ModelSelector,
    sleeper: Arc<dyn Sleeper>,
    config: OrchestratorConfig,
}

impl GenerationOrchestrator {
    pub fn builder(gateway: Arc<dyn TextGenerationGateway>) -> GenerationOrchestratorBuilder {
        GenerationOrchestratorBuilder::new(gateway)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The context store, e.g. for invalidation after a project edit
    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    /// Full outline with suggestions and alternatives. Never fails.
    pub async fn generate_plot(&self, request: &PlotGenerationRequest) -> PlotGenerationResult {
        self.run(request, TaskType::Structure).await
    }

    /// Suggestions only; `structure` is `None` in the result
    pub async fn generate_suggestions_only(
        &self,
        request: &PlotGenerationRequest,
    ) -> PlotGenerationResult {
        self.run(request, TaskType::Suggestions).await
    }

    /// Alternative structures only; `structure` is `None` in the result
    pub async fn generate_alternatives_only(
        &self,
        request: &PlotGenerationRequest,
    ) -> PlotGenerationResult {
        self.run(request, TaskType::Alternatives).await
    }

    /// `generate_plot` that stops as soon as `token` is cancelled. The
    /// in-flight gateway call and any pending backoff are dropped; no partial
    /// result is returned.
    pub async fn generate_plot_with_cancellation(
        &self,
        request: &PlotGenerationRequest,
        token: CancellationToken,
    ) -> Result<PlotGenerationResult, GenerationError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::info!(project_id = %request.project_id(), "Plot generation cancelled");
                Err(GenerationError::Cancelled)
            }
            result = self.run(request, TaskType::Structure) => Ok(result),
        }
    }

    async fn run(&self, request: &PlotGenerationRequest, task: TaskType) -> PlotGenerationResult {
        let generation_id = Uuid::new_v4().to_string();
        let mut tracker = StateTracker::new(generation_id.clone());

        tracing::info!(
            generation_id = %generation_id,
            project_id = %request.project_id(),
            task = task.as_str(),
            structure = %request.structure(),
            target_length = request.target_length(),
            "Starting plot generation"
        );

        let context = self.resolve_context(request).await;
        tracker.advance(GenerationState::ContextResolved);

        let system = prompts::system_prompt(task);
        let user = prompts::user_prompt(request, task);
        let injected = inject(&context, &user, &system, &self.config.inject);
        let selection = self.selector.select_model(request, task, Some(&context));
        tracker.advance(GenerationState::PromptBuilt);

        tracing::debug!(
            generation_id = %generation_id,
            tier = %selection.tier,
            model = %selection.model_id,
            score = selection.score,
            context_tokens = injected.context_tokens,
            degradation = ?injected.degradation,
            "Prompt built"
        );

        let outcome = self
            .call_with_retry(request, task, &injected, &selection, &mut tracker)
            .await;

        let result = match outcome {
            CallOutcome::Success {
                parsed,
                model,
                confidence,
                stats,
            } => {
                tracker.advance(GenerationState::Done);
                PlotGenerationResult {
                    structure: parsed.structure,
                    suggestions: parsed.suggestions,
                    alternatives: parsed.alternatives,
                    confidence,
                    generated_at: Utc::now(),
                    metadata: metadata(
                        &generation_id,
                        ResultSource::Ai,
                        Some(model),
                        &selection,
                        stats,
                        None,
                        &tracker,
                    ),
                }
            }
            CallOutcome::Fallback { reason, stats } => {
                let fallback = template_result(request, task, &context);
                tracker.advance(GenerationState::Done);
                tracing::warn!(
                    generation_id = %generation_id,
                    reason = reason.kind(),
                    error = %reason,
                    attempts = stats.attempts,
                    "Falling back to template generation"
                );
                PlotGenerationResult {
                    metadata: metadata(
                        &generation_id,
                        ResultSource::Template,
                        Some(selection.model_id.clone()),
                        &selection,
                        stats,
                        Some(reason.to_string()),
                        &tracker,
                    ),
                    ..fallback
                }
            }
        };

        tracing::info!(
            generation_id = %generation_id,
            source = ?result.metadata.source,
            confidence = result.confidence,
            attempts = result.metadata.attempts,
            "Plot generation finished"
        );
        result
    }

    /// Load, hash and extract the project context, going through the store
    async fn resolve_context(&self, request: &PlotGenerationRequest) -> Arc<ProjectContext> {
        let project_id = request.project_id();

        let raw = match self.source.load_project(project_id).await {
            Ok(raw) => raw,
            Err(e) => {
                let err = GenerationError::ContextRetrieval(e.to_string());
                tracing::warn!(project_id = %project_id, error = %err, "Using empty project data");
                RawProjectData::default()
            }
        };

        let hash = raw.content_hash();
        if let Some(context) = self.store.get(project_id, &hash).await {
            tracing::debug!(project_id = %project_id, "Context cache hit");
            return context;
        }

        let context = Arc::new(
            extract_with_retrieval(
                project_id,
                &raw,
                &self.config.extract,
                self.retrieval.as_ref(),
                &prompts::retrieval_query(request),
            )
            .await,
        );
        self.store.put(project_id, Arc::clone(&context), hash).await;
        context
    }

    async fn call_with_retry(
        &self,
        request: &PlotGenerationRequest,
        task: TaskType,
        prompts: &InjectedPrompts,
        selection: &ModelSelection,
        tracker: &mut StateTracker,
    ) -> CallOutcome {
        let retry = &self.config.retry;
        let mut stats = CallStats::default();

        loop {
            tracker.advance(GenerationState::Calling);
            stats.attempts += 1;

            let mut gateway_request = GatewayRequest::new(
                selection.model_id.clone(),
                prompts.system_prompt.clone(),
                prompts.user_prompt.clone(),
            );
            if let Some(temperature) = request.temperature().or(self.config.temperature) {
                gateway_request = gateway_request.with_temperature(temperature);
            }
            if let Some(max_tokens) = self.config.max_tokens {
                gateway_request = gateway_request.with_max_tokens(max_tokens);
            }

            let response = match tokio::time::timeout(
                retry.call_timeout(),
                self.gateway.generate_text(gateway_request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout),
            };

            let failure = match response {
                Ok(response) => match parse_plot_response(&response.text, task, request) {
                    Ok(parsed) => {
                        let confidence = response
                            .confidence
                            .filter(|c| c.is_finite())
                            .map(|c| c.clamp(0.0, 1.0))
                            .or(parsed.confidence)
                            .unwrap_or(AI_CONFIDENCE);
                        tracker.advance(GenerationState::Succeeded);
                        return CallOutcome::Success {
                            parsed,
                            model: response.model,
                            confidence,
                            stats,
                        };
                    }
                    Err(e) => GenerationError::ResponseParse(e),
                },
                Err(e) => {
                    if classify_gateway_error(&e).is_retryable() {
                        GenerationError::TransientGateway(e)
                    } else {
                        GenerationError::FatalGateway(e)
                    }
                }
            };

            let budget_left = stats.retries < retry.max_retries;
            let can_retry = match &failure {
                GenerationError::TransientGateway(_) => budget_left,
                GenerationError::ResponseParse(_) => {
                    budget_left && stats.parse_retries < retry.max_parse_retries
                }
                _ => false,
            };

            if !can_retry {
                tracker.advance(GenerationState::FallingBack);
                return CallOutcome::Fallback {
                    reason: failure,
                    stats,
                };
            }

            if matches!(failure, GenerationError::ResponseParse(_)) {
                stats.parse_retries += 1;
            }
            stats.retries += 1;
            let delay = retry.delay_for(stats.retries);
            tracker.advance(GenerationState::Retrying);

            tracing::warn!(
                attempt = stats.attempts,
                max_retries = retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                gateway = self.gateway.id(),
                "Gateway call failed, retrying"
            );

            self.sleeper.sleep(delay).await;
            stats.backoff += delay;
        }
    }
}

fn metadata(
    generation_id: &str,
    source: ResultSource,
    model_id: Option<String>,
    selection: &ModelSelection,
    stats: CallStats,
    fallback_reason: Option<String>,
    tracker: &StateTracker,
) -> GenerationMetadata {
    GenerationMetadata {
        generation_id: generation_id.to_string(),
        source,
        model_id,
        tier: Some(selection.tier.to_string()),
        attempts: stats.attempts,
        retries: stats.retries,
        total_backoff_ms: stats.backoff.as_millis() as u64,
        fallback_reason,
        state_trace: tracker.trace_strings(),
    }
}

/// Deterministic result for a task; metadata is filled in by the caller
fn template_result(
    request: &PlotGenerationRequest,
    task: TaskType,
    context: &ProjectContext,
) -> PlotGenerationResult {
    let (structure, suggestions, alternatives) = match task {
        TaskType::Structure => (
            Some(generate_template_plot(request, request.structure())),
            generate_default_suggestions(request, Some(context)),
            generate_template_alternatives(request),
        ),
        TaskType::Suggestions => (
            None,
            generate_default_suggestions(request, Some(context)),
            Vec::new(),
        ),
        TaskType::Alternatives => (None, Vec::new(), generate_template_alternatives(request)),
    };

    PlotGenerationResult {
        structure,
        suggestions,
        alternatives,
        confidence: FALLBACK_CONFIDENCE,
        generated_at: Utc::now(),
        metadata: GenerationMetadata {
            generation_id: String::new(),
            source: ResultSource::Template,
            model_id: None,
            tier: None,
            attempts: 0,
            retries: 0,
            total_backoff_ms: 0,
            fallback_reason: None,
            state_trace: Vec::new(),
        },
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct GenerationOrchestratorBuilder {
    gateway: Arc<dyn TextGenerationGateway>,
    source: Option<Arc<dyn ProjectDataSource>>,
    retrieval: Option<Arc<dyn RetrievalService>>,
    store: Option<Arc<dyn ContextStore>>,
    catalog: ModelCatalog,
    sleeper: Option<Arc<dyn Sleeper>>,
    config: OrchestratorConfig,
}

impl GenerationOrchestratorBuilder {
    pub fn new(gateway: Arc<dyn TextGenerationGateway>) -> Self {
        Self {
            gateway,
            source: None,
            retrieval: None,
            store: None,
            catalog: ModelCatalog::default(),
            sleeper: None,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn source(mut self, source: Arc<dyn ProjectDataSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn retrieval(mut self, retrieval: Arc<dyn RetrievalService>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    pub fn store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn build(mut self) -> GenerationOrchestrator {
        self.config.retry = self.config.retry.bounded();
        GenerationOrchestrator {
            gateway: self.gateway,
            source: self
                .source
                .unwrap_or_else(|| Arc::new(InMemoryProjectSource::new())),
            retrieval: self.retrieval.unwrap_or_else(|| Arc::new(NoopRetrieval)),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(ContextCache::default())),
            selector: ModelSelector::new(self.catalog),
            sleeper: self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper)),
            config: self.config,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
