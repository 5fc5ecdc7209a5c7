//! Layered configuration for the pipeline.
//!
//! Settings resolve in order: built-in defaults, then
//! `.folio/settings.toml` (found by walking ancestors of the current
//! directory), then environment variable overrides.
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `FOLIO_` and use double
//! underscores to separate nested levels:
//! - `FOLIO_CHUNKING__CHUNK_SIZE=256` sets `chunking.chunk_size`
//! - `FOLIO_GENERATION__PROTOCOL=refine` sets `generation.protocol`
//! - `FOLIO_RETRIEVAL__TOP_K=3` sets `retrieval.top_k`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::answer::GenerationProtocol;
use crate::document::tokens::ENCODINGS;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Chunking stage settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Query-time retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Answer generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Log filtering, overridden by RUST_LOG when set
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChunkingConfig {
    /// Token budget per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Token budget for sentences carried into the next chunk
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// tiktoken encoding used for token counting
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    /// How retrieved chunks are composed into one answer
    #[serde(default)]
    pub protocol: GenerationProtocol,

    /// Chat model requested from the provider
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Sampling temperature for generation calls
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap per generation call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout per generation call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Model used for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all targets
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `pipeline = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_chunk_size() -> usize {
    500
}
fn default_overlap() -> usize {
    50
}
fn default_tokenizer() -> String {
    "cl100k_base".to_string()
}
fn default_top_k() -> usize {
    5
}
fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    512
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            embedding: EmbeddingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            tokenizer: default_tokenizer(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            protocol: GenerationProtocol::default(),
            model: default_generation_model(),
            api_base: default_api_base(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path =
            Self::find_config().unwrap_or_else(|| PathBuf::from(".folio/settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still applying defaults
    /// underneath and environment variables on top
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Layer in environment variables with FOLIO_ prefix
            // Use double underscore (__) to separate nested levels
            // Single underscore (_) remains as is within field names
            .merge(
                Env::prefixed("FOLIO_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Find the nearest settings file by looking for a .folio directory,
    /// searching from the current directory up to root
    pub fn find_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".folio");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = if let Some(path) = Self::find_config() {
            path
        } else {
            PathBuf::from(".folio/settings.toml")
        };

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'folio init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file at `.folio/settings.toml`
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(".folio/settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let existed = config_path.exists();
        let settings = Settings::default();
        settings.save(&config_path)?;

        if existed {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Reject settings no stage could run under. Called by the pipeline
    /// before any artifact is written.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.chunking.chunk_size == 0 {
            return Err(PipelineError::Configuration(
                "chunking.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(PipelineError::Configuration(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }
        if !ENCODINGS.contains(&self.chunking.tokenizer.as_str()) {
            return Err(PipelineError::Configuration(format!(
                "unknown tokenizer '{}' (expected one of: {})",
                self.chunking.tokenizer,
                ENCODINGS.join(", ")
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(PipelineError::Configuration(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.generation.max_tokens == 0 {
            return Err(PipelineError::Configuration(
                "generation.max_tokens must be at least 1".to_string(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(PipelineError::Configuration(
                "generation.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
