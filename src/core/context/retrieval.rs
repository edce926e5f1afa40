//! Retrieval Service Contract
//!
//! The search index that supplies supplemental passages lives outside this
//! crate. Only the call shape is defined here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RetrievalError;
use super::model::SupplementalPassage;

/// A single search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Kind of document (chapter, note, character...)
    pub kind: String,
    pub id: String,
    pub snippet: String,
    pub score: f32,
}

impl From<SearchHit> for SupplementalPassage {
    fn from(hit: SearchHit) -> Self {
        SupplementalPassage {
            kind: hit.kind,
            id: hit.id,
            snippet: hit.snippet,
            score: hit.score,
        }
    }
}

/// External semantic/keyword search over project material
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn search(
        &self,
        query: &str,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, RetrievalError>;
}

/// Retrieval that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRetrieval;

#[async_trait]
impl RetrievalService for NoopRetrieval {
    async fn search(
        &self,
        _query: &str,
        _project_id: &str,
        _limit: usize,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        Ok(Vec::new())
    }
}
