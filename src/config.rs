use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::context::{
    extractor::{DEFAULT_MAX_CONTEXT_TOKENS, DEFAULT_SEARCH_LIMIT},
    injector::DEFAULT_PROMPT_CEILING,
    CacheConfig, ExtractOptions, InjectOptions, InjectionPlacement,
};
use crate::core::generation::{OrchestratorConfig, RetryConfig};
use crate::core::llm::ModelCatalog;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub context: ContextSettings,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub models: ModelCatalog,
    pub gateway: GatewaySettings,
    pub logging: LoggingConfig,
}

/// Context extraction and prompt injection limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Token budget for the rendered project context.
    pub max_tokens: u32,
    /// Passages requested from the retrieval service.
    pub search_limit: usize,
    /// Ceiling for system + user prompt combined.
    pub prompt_ceiling: u32,
    pub placement: InjectionPlacement,
}

/// HTTP provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Override the provider base URL (OpenAI-compatible).
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Logging output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Override the log directory.
    pub directory: Option<PathBuf>,
    pub file: bool,
    pub stdout: bool,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            search_limit: DEFAULT_SEARCH_LIMIT,
            prompt_ceiling: DEFAULT_PROMPT_CEILING,
            placement: InjectionPlacement::default(),
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: "PLOTWEAVER_API_KEY".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
            file: true,
            stdout: false,
        }
    }
}

impl GatewaySettings {
    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl LoggingConfig {
    /// Resolved log directory (override or XDG data dir).
    pub fn log_dir(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("plotweaver").join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs"))
        })
    }
}

impl EngineConfig {
    /// Load configuration from `~/.config/plotweaver/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if !config_path.exists() {
            log::debug!("No config file at {}, using defaults", config_path.display());
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => {
                log::info!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Settings consumed by `GenerationOrchestrator`.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            extract: ExtractOptions::default()
                .with_max_tokens(self.context.max_tokens)
                .with_search_limit(self.context.search_limit),
            inject: InjectOptions {
                placement: self.context.placement,
                max_total_tokens: self.context.prompt_ceiling,
            },
            retry: self.retry.clone(),
            temperature: self.gateway.temperature,
            max_tokens: self.gateway.max_tokens,
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("plotweaver").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
