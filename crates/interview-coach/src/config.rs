//! Configuration for the interview coach

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "COACH_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Language-model backend (ollama or openai)
    pub backend: LlmBackend,
    /// Server configuration
    pub server: ServerConfig,
    /// Ollama configuration (backend = ollama)
    pub ollama: OllamaConfig,
    /// OpenAI-compatible configuration (backend = openai)
    pub openai: OpenAiConfig,
    /// Slide retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Slide chunking configuration
    pub chunking: ChunkingConfig,
    /// Persistence configuration
    pub storage: StorageConfig,
    /// Interview script configuration
    pub interview: InterviewConfig,
}

impl CoachConfig {
    /// Load configuration
    ///
    /// Reads the TOML file at `path`, or at `$COACH_CONFIG` when no path is
    /// given. With neither, defaults are used. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse TOML text
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::Config(msg.to_string()));

        if self.chunking.chunk_size == 0 {
            return invalid("chunking.chunk_size must be positive");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return invalid("chunking.chunk_overlap must be smaller than chunking.chunk_size");
        }
        if self.retrieval.enabled && self.retrieval.top_k == 0 {
            return invalid("retrieval.top_k must be positive when retrieval is enabled");
        }
        if self.server.max_upload_size == 0 {
            return invalid("server.max_upload_size must be positive");
        }
        if self.server.session_sweep_secs == 0 {
            return invalid("server.session_sweep_secs must be positive");
        }
        if self.server.ended_session_grace_secs > self.server.session_idle_secs {
            return invalid("server.ended_session_grace_secs must not exceed server.session_idle_secs");
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if self.openai.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                if !key.trim().is_empty() {
                    self.openai.api_key = Some(key);
                }
            }
        }
    }

    /// Model identifier of the active backend
    pub fn active_model(&self) -> &str {
        match self.backend {
            LlmBackend::Ollama => &self.ollama.model,
            LlmBackend::OpenAi => &self.openai.model,
        }
    }
}

/// Language-model backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI chat completions API (or a compatible server)
    OpenAi,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum slide upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
    /// Seconds a graded or reviewed session stays available after its last use
    pub ended_session_grace_secs: u64,
    /// Seconds an untouched session is kept before it is discarded
    pub session_idle_secs: u64,
    /// Seconds between session eviction sweeps
    pub session_sweep_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
            ended_session_grace_secs: 10 * 60,
            session_idle_secs: 2 * 60 * 60,
            session_sweep_secs: 60,
        }
    }
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "phi3".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

/// OpenAI-compatible chat completions configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Chat model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

/// Slide retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Augment chat requests with slide passages
    pub enabled: bool,
    /// Number of passages to inject per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 4,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            min_chunk_size: 50,
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let database_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("interview-coach")
            .join("coach.db");

        Self { database_path }
    }
}

/// Interview script configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    /// File holding the interviewee's system context
    pub context_path: PathBuf,
    /// File holding the grading rubric
    pub rubric_path: PathBuf,
    /// Opening assistant message of every new session
    pub greeting: String,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            context_path: PathBuf::from("context.txt"),
            rubric_path: PathBuf::from("grading_criteria.txt"),
            greeting: default_greeting(),
        }
    }
}

fn default_greeting() -> String {
    "Hi, I'm here to help you with questions about the manufacturing process.".to_string()
}
