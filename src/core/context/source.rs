//! Project Data Sources
//!
//! Persistence is owned elsewhere; the engine only needs to load a project's
//! raw data by id.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::{ContextError, Result};
use super::model::RawProjectData;

/// Loads raw project data by id
#[async_trait]
pub trait ProjectDataSource: Send + Sync {
    async fn load_project(&self, project_id: &str) -> Result<RawProjectData>;
}

/// Project data held in memory, keyed by project id
#[derive(Debug, Default)]
pub struct InMemoryProjectSource {
    projects: RwLock<HashMap<String, RawProjectData>>,
}

impl InMemoryProjectSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_project(mut self, project_id: impl Into<String>, data: RawProjectData) -> Self {
        self.projects.get_mut().insert(project_id.into(), data);
        self
    }

    /// Insert or replace a project
    pub async fn upsert(&self, project_id: impl Into<String>, data: RawProjectData) {
        self.projects.write().await.insert(project_id.into(), data);
    }

    pub async fn remove(&self, project_id: &str) -> Option<RawProjectData> {
        self.projects.write().await.remove(project_id)
    }

    /// Load a single project from a JSON file
    pub async fn from_json_file(
        project_id: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ContextError::Unavailable(format!("{}: {}", path.display(), e)))?;
        let data: RawProjectData = serde_json::from_str(&text)?;
        Ok(Self::new().with_project(project_id, data))
    }
}

#[async_trait]
impl ProjectDataSource for InMemoryProjectSource {
    async fn load_project(&self, project_id: &str) -> Result<RawProjectData> {
        self.projects
            .read()
            .await
            .get(project_id)
            .cloned()
            .ok_or_else(|| ContextError::NotFound(project_id.to_string()))
    }
}
