use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::{DomainError, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about \
the user's uploaded documents. Use the provided context to answer. If the context does not \
contain the answer, say that you don't know instead of making something up. Keep answers concise.";

/// Everything the service reads at startup: runtime settings plus prompt text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Reads YAML from `path`, falling back to built-in defaults when the file
    /// does not exist, then applies environment overrides and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let mut app = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| DomainError::internal(format!("{}: {e}", path.display())))?;
            Self::from_yaml(&raw)?
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        app.apply_env(|key| std::env::var(key).ok());
        app.validate()?;
        Ok(app)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(raw).map_err(|e| DomainError::validation(format!("invalid config: {e}")))
    }

    /// Environment variables win over file values.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let c = &mut self.config;
        if let Some(v) = var("SERVER_HOST") {
            c.server.host = v;
        }
        if let Some(port) = var("SERVER_PORT").and_then(|v| v.parse().ok()) {
            c.server.port = port;
        }
        if let Some(v) = var("REDIS_URL") {
            c.storage.redis_url = v;
        }
        if let Some(v) = var("QDRANT_URL") {
            c.storage.qdrant_url = v;
        }
        if let Some(v) = var("UPLOAD_DIR") {
            c.storage.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = var("LLM_MODEL") {
            c.llm.model = v;
        }
        if let Some(v) = var("EMBED_MODEL") {
            c.embedding.model = v;
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let rag = &self.config.rag;
        if rag.chunk_size == 0 || rag.chunk_overlap >= rag.chunk_size {
            return Err(DomainError::validation(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                rag.chunk_overlap, rag.chunk_size
            )));
        }
        if rag.top_k == 0 {
            return Err(DomainError::validation("rag.top_k must be at least 1"));
        }
        if self.config.llm.timeout_seconds == 0 {
            return Err(DomainError::validation("llm.timeout_seconds must be at least 1"));
        }
        if self.config.embedding.timeout_seconds == 0 {
            return Err(DomainError::validation(
                "embedding.timeout_seconds must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub storage: StorageConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Any `/chat/completions` endpoint speaking the OpenAI wire format.
    OpenaiCompatible,
    Openai,
    Anthropic,
    Gemini,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_base: String,
    pub api_key_env: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenaiCompatible,
            model: "llama-3.1-8b-instant".to_string(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.2,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    Openai,
    /// Local feature hashing; no network, deterministic.
    Hashing,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Openai,
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Drop retrieved chunks scoring below this. Unset keeps every top-k hit.
    pub min_score: Option<f32>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: 3,
            min_score: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    Qdrant,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub vector_backend: VectorBackend,
    pub qdrant_url: String,
    pub collection: String,
    pub conversation_backend: ConversationBackend,
    pub redis_url: String,
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            vector_backend: VectorBackend::Qdrant,
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "documents".to_string(),
            conversation_backend: ConversationBackend::Redis,
            redis_url: "redis://localhost:6379".to_string(),
            upload_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub rag: RagPrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}
