//! Context Injector
//!
//! Merges a `ProjectContext` into a system/user prompt pair. The rendered
//! context sits between `### PROJECT CONTEXT ###` and
//! `### END PROJECT CONTEXT ###` markers and is placed according to the
//! configured `InjectionPlacement`.
//!
//! Injection never fails. If the combined prompt exceeds the ceiling the
//! context is re-trimmed, then reduced to a summary, and finally left out.

use serde::{Deserialize, Serialize};

use super::extractor::trim_to_budget;
use super::model::{estimate_tokens, ProjectContext};

pub const CONTEXT_START_MARKER: &str = "### PROJECT CONTEXT ###";
pub const CONTEXT_END_MARKER: &str = "### END PROJECT CONTEXT ###";

/// Default ceiling for system + user prompt after injection
pub const DEFAULT_PROMPT_CEILING: u32 = 8_000;

// ============================================================================
// Options
// ============================================================================

/// Where the context block goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPlacement {
    /// Before the system prompt
    #[default]
    SystemPrepend,
    /// Before the user prompt
    UserPrefix,
    /// After the user prompt
    UserSuffix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InjectOptions {
    pub placement: InjectionPlacement,
    /// Hard ceiling for the combined prompts, in estimated tokens
    pub max_total_tokens: u32,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self {
            placement: InjectionPlacement::SystemPrepend,
            max_total_tokens: DEFAULT_PROMPT_CEILING,
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// How much of the context survived the ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionDegradation {
    None,
    /// Context was re-trimmed to fit
    Trimmed,
    /// Only premise, character names and themes were injected
    SummaryOnly,
    /// Original prompts were returned unchanged
    ContextOmitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedPrompts {
    pub system_prompt: String,
    pub user_prompt: String,
    pub placement: InjectionPlacement,
    /// Estimated tokens of the injected context block (0 if omitted)
    pub context_tokens: u32,
    pub degradation: InjectionDegradation,
}

// ============================================================================
// Injection
// ============================================================================

fn context_block(context: &ProjectContext) -> String {
    format!(
        "{}\n{}\n{}",
        CONTEXT_START_MARKER,
        context.render(),
        CONTEXT_END_MARKER
    )
}

fn join(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{}\n\n{}", first, second),
    }
}

fn place(
    block: &str,
    base_prompt: &str,
    system_prompt: &str,
    placement: InjectionPlacement,
) -> (String, String) {
    match placement {
        InjectionPlacement::SystemPrepend => (join(block, system_prompt), base_prompt.to_string()),
        InjectionPlacement::UserPrefix => (system_prompt.to_string(), join(block, base_prompt)),
        InjectionPlacement::UserSuffix => (system_prompt.to_string(), join(base_prompt, block)),
    }
}

fn try_inject(
    context: &ProjectContext,
    base_prompt: &str,
    system_prompt: &str,
    options: &InjectOptions,
    degradation: InjectionDegradation,
) -> Option<InjectedPrompts> {
    let block = context_block(context);
    let (system, user) = place(&block, base_prompt, system_prompt, options.placement);
    let total = estimate_tokens(&system) + estimate_tokens(&user);
    if total > options.max_total_tokens {
        return None;
    }
    Some(InjectedPrompts {
        system_prompt: system,
        user_prompt: user,
        placement: options.placement,
        context_tokens: estimate_tokens(&block),
        degradation,
    })
}

fn unmodified(
    base_prompt: &str,
    system_prompt: &str,
    options: &InjectOptions,
    degradation: InjectionDegradation,
) -> InjectedPrompts {
    InjectedPrompts {
        system_prompt: system_prompt.to_string(),
        user_prompt: base_prompt.to_string(),
        placement: options.placement,
        context_tokens: 0,
        degradation,
    }
}

/// Merge context into the prompts, degrading rather than failing
pub fn inject(
    context: &ProjectContext,
    base_prompt: &str,
    system_prompt: &str,
    options: &InjectOptions,
) -> InjectedPrompts {
    if context.is_empty() {
        return unmodified(base_prompt, system_prompt, options, InjectionDegradation::None);
    }

    if let Some(prompts) =
        try_inject(context, base_prompt, system_prompt, options, InjectionDegradation::None)
    {
        return prompts;
    }

    // Room left for the block after the prompts, markers and separators
    let overhead = estimate_tokens(base_prompt)
        + estimate_tokens(system_prompt)
        + estimate_tokens(CONTEXT_START_MARKER)
        + estimate_tokens(CONTEXT_END_MARKER)
        + 2;
    let remaining = options.max_total_tokens.saturating_sub(overhead);

    if remaining > 0 {
        let trimmed = trim_to_budget(context, remaining);
        if let Some(prompts) = try_inject(
            &trimmed,
            base_prompt,
            system_prompt,
            options,
            InjectionDegradation::Trimmed,
        ) {
            log::info!(
                "Context for project {} re-trimmed to ~{} tokens to fit the prompt ceiling",
                context.project_id,
                prompts.context_tokens
            );
            return prompts;
        }
    }

    let summary = context.summary_only();
    if let Some(prompts) = try_inject(
        &summary,
        base_prompt,
        system_prompt,
        options,
        InjectionDegradation::SummaryOnly,
    ) {
        log::warn!(
            "Injected summary-only context for project {}",
            context.project_id
        );
        return prompts;
    }

    log::warn!(
        "Context for project {} omitted: prompts exceed the {} token ceiling",
        context.project_id,
        options.max_total_tokens
    );
    unmodified(
        base_prompt,
        system_prompt,
        options,
        InjectionDegradation::ContextOmitted,
    )
}

// ============================================================================
// Tests
// ============================================================================
