//! Project Context Module
//!
//! Everything between raw project data and an enriched prompt:
//!
//! - `model`: raw data, `ProjectContext` and token estimation
//! - `extractor`: idea parsing and budget trimming
//! - `cache`: TTL + content-hash cache behind `ContextStore`
//! - `injector`: prompt placement with graceful degradation
//! - `retrieval` / `source`: contracts for external collaborators

pub mod cache;
pub mod error;
pub mod extractor;
pub mod injector;
pub mod model;
pub mod retrieval;
pub mod source;

pub use cache::{CacheConfig, CacheStats, ContextCache, ContextStore, NoopContextStore};
pub use error::{ContextError, RetrievalError};
pub use extractor::{
    extract, extract_with_retrieval, parse_idea, trim_to_budget, ExtractOptions, ParsedIdea,
};
pub use injector::{
    inject, InjectOptions, InjectedPrompts, InjectionDegradation, InjectionPlacement,
};
pub use model::{
    estimate_tokens, ChapterSummary, CharacterSummary, ContextSection,
    EntityMention, ProjectContext, RawProjectData, SupplementalPassage, TimelineEvent, WorldEntry,
};
pub use retrieval::{NoopRetrieval, RetrievalService, SearchHit};
pub use source::{InMemoryProjectSource, ProjectDataSource};
