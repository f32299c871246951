//! Configuration loading, validation, and management for Vecta.
//!
//! Loads configuration from `~/.vecta/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vecta_core::{AnalysisType, LoadPolicy, SelectionPolicy};

/// The root configuration structure.
///
/// Maps directly to `~/.vecta/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backing data files
    #[serde(default)]
    pub data: DataConfig,

    /// Context assembly defaults
    #[serde(default)]
    pub assembly: AssemblyConfig,

    /// Embedding-based guideline retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory the data files are resolved against.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_examples_file")]
    pub examples_file: PathBuf,

    #[serde(default = "default_guidelines_file")]
    pub guidelines_file: PathBuf,

    /// "skip_invalid" or "strict"
    #[serde(default)]
    pub load_policy: LoadPolicy,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_examples_file() -> PathBuf {
    PathBuf::from("few_shot_examples.json")
}
fn default_guidelines_file() -> PathBuf {
    PathBuf::from("guidelines").join("neurology_guidelines.json")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            examples_file: default_examples_file(),
            guidelines_file: default_guidelines_file(),
            load_policy: LoadPolicy::default(),
        }
    }
}

impl DataConfig {
    pub fn examples_path(&self) -> PathBuf {
        resolve(&self.dir, &self.examples_file)
    }

    pub fn guidelines_path(&self) -> PathBuf {
        resolve(&self.dir, &self.guidelines_file)
    }
}

/// Selection mode as written in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Ordered,
    Sampled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    #[serde(default = "default_num_examples")]
    pub num_examples: usize,

    #[serde(default = "default_true")]
    pub include_guidelines: bool,

    /// Maximum characters of guideline text in a context block
    #[serde(default = "default_guideline_char_budget")]
    pub guideline_char_budget: usize,

    /// Analysis type used when a request names none
    #[serde(default)]
    pub analysis_type: AnalysisType,

    #[serde(default)]
    pub selection: SelectionMode,

    /// Seed for reproducible sampling; ignored in ordered mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_seed: Option<u64>,
}

fn default_num_examples() -> usize {
    2
}
fn default_guideline_char_budget() -> usize {
    1200
}
fn default_true() -> bool {
    true
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            num_examples: default_num_examples(),
            include_guidelines: true,
            guideline_char_budget: default_guideline_char_budget(),
            analysis_type: AnalysisType::default(),
            selection: SelectionMode::default(),
            sample_seed: None,
        }
    }
}

impl AssemblyConfig {
    pub fn selection_policy(&self) -> SelectionPolicy {
        match self.selection {
            SelectionMode::Ordered => SelectionPolicy::Ordered,
            SelectionMode::Sampled => SelectionPolicy::Sampled {
                seed: self.sample_seed,
            },
        }
    }
}

/// Which embedding implementation backs the retrieval index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    /// Offline feature-hashing embedder
    #[default]
    Hashing,
    /// Ollama `/api/embeddings` endpoint
    Ollama,
    /// No embedder: retrieval is always unavailable
    None,
}

impl std::str::FromStr for EmbedderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "ollama" => Ok(Self::Ollama),
            "none" => Ok(Self::None),
            other => Err(ConfigError::ValidationError(format!(
                "unknown embedder '{other}' (expected hashing, ollama or none)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub embedder: EmbedderKind,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Where the embedding table is cached; relative paths resolve
    /// against `data.dir`. Unset means no persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_path: Option<PathBuf>,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub min_score: f32,

    /// Restrict retrieval to the detected condition when it is known
    #[serde(default = "default_true")]
    pub filter_by_condition: bool,
}

fn default_embedding_model() -> String {
    "all-minilm".into()
}
fn default_dimension() -> usize {
    384
}
fn default_api_url() -> String {
    "http://localhost:11434".into()
}
fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            embedder: EmbedderKind::default(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            api_url: default_api_url(),
            persist_path: None,
            top_k: default_top_k(),
            min_score: 0.0,
            filter_by_condition: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.vecta/config.toml).
    ///
    /// Environment variables override file values:
    /// - `VECTA_DATA_DIR`
    /// - `VECTA_RETRIEVAL` (true/false)
    /// - `VECTA_EMBEDDER` (hashing/ollama/none)
    /// - `VECTA_LOG`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
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

    /// Apply overrides from a key lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("VECTA_DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }

        if let Some(flag) = lookup("VECTA_RETRIEVAL") {
            self.retrieval.enabled = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "VECTA_RETRIEVAL must be true or false, got '{other}'"
                    )));
                }
            };
        }

        if let Some(kind) = lookup("VECTA_EMBEDDER") {
            self.retrieval.embedder = kind.parse()?;
        }

        if let Some(level) = lookup("VECTA_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vecta")
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Resolved persistence path of the retrieval index, if any.
    pub fn index_persist_path(&self) -> Option<PathBuf> {
        self.retrieval
            .persist_path
            .as_ref()
            .map(|p| resolve(&self.data.dir, p))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.assembly.guideline_char_budget == 0 {
            return Err(ConfigError::ValidationError(
                "assembly.guideline_char_budget must be > 0".into(),
            ));
        }

        if self.retrieval.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.dimension must be > 0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }

        if !(-1.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(ConfigError::ValidationError(
                "retrieval.min_score must be between -1.0 and 1.0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
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
