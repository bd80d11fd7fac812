//! Configuration loading, validation, and management for the socialcare
//! assistant.
//!
//! Loads configuration from `~/.socialcare/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.socialcare/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the answer generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Answer generator configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Context retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Counseling manual configuration
    #[serde(default)]
    pub manual: ManualConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("store", &self.store)
            .field("retrieval", &self.retrieval)
            .field("manual", &self.manual)
            .finish()
    }
}

/// Which answer generator backs the assistant.
///
/// Exactly one generator is active at a time; switching is done here,
/// not by falling through a ladder of models at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Gemini over HTTP
    #[default]
    Gemini,
    /// Canned replies, for demos and tests without network access
    Scripted,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Scripted => "scripted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default = "default_model")]
    pub model: String,

    /// Override the API base URL (mainly for tests against a local server)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Fixed reply for the scripted generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripted_reply: Option<String>,
}

fn default_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            scripted_reply: None,
        }
    }
}

/// Which persistence backend holds the knowledge base between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Jsonl,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Jsonl => "jsonl",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database or file path; defaults to a file under the config directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// How many manual fragments to pack into the prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Character budget for the packed context
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_top_k() -> usize {
    5
}
fn default_max_context_chars() -> usize {
    1500
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualConfig {
    /// Path to the counseling manual text file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.socialcare/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `SOCIALCARE_API_KEY` (highest priority)
    /// - `GEMINI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = Self::config_dir();
        let config_path = config_dir.join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("SOCIALCARE_API_KEY")
                .ok()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok());
        }

        // Allow env var to override the generator
        if let Ok(provider) = std::env::var("SOCIALCARE_PROVIDER") {
            match provider.as_str() {
                "gemini" => config.provider.kind = ProviderKind::Gemini,
                "scripted" => config.provider.kind = ProviderKind::Scripted,
                other => tracing::warn!(
                    "Unknown SOCIALCARE_PROVIDER value {other:?}, keeping configured provider"
                ),
            }
        }

        // Allow env var to override the model
        if let Ok(model) = std::env::var("SOCIALCARE_MODEL") {
            config.provider.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".socialcare")
    }

    /// Resolve the knowledge store path, applying the per-backend default.
    pub fn store_path(&self) -> PathBuf {
        match &self.store.path {
            Some(path) => path.clone(),
            None => {
                let file = match self.store.backend {
                    StoreBackend::Jsonl => "knowledge.jsonl",
                    _ => "knowledge.db",
                };
                Self::config_dir().join(file)
            }
        }
    }

    /// Resolve the counseling manual path.
    pub fn manual_path(&self) -> PathBuf {
        match &self.manual.path {
            Some(path) => path.clone(),
            None => Self::config_dir().join("manual.txt"),
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if self.retrieval.max_context_chars == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_context_chars must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            store: StoreConfig::default(),
            retrieval: RetrievalConfig::default(),
            manual: ManualConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
