use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CatbaseError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub openai: OpenAiConfig,
    pub ollama: OllamaConfig,
    pub chunking: ChunkingConfig,
    pub arxiv: ArxivConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CATBASE_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CATBASE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            storage: StorageConfig::from_env_profiled(p),
            embedding: EmbeddingConfig::from_env_profiled(p),
            openai: OpenAiConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            chunking: ChunkingConfig::from_env_profiled(p),
            arxiv: ArxivConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CatbaseError> {
        self.chunking.validate()?;

        if self.embedding.batch_size == 0 {
            return Err(CatbaseError::Config("EMBEDDING_BATCH_SIZE must be > 0".into()));
        }
        match self.embedding.provider.as_str() {
            "ollama" => Ok(()),
            "openai" if self.openai.api_key.is_some() => Ok(()),
            "openai" => Err(CatbaseError::Config(
                "EMBEDDING_PROVIDER=openai requires OPENAI_API_KEY".into(),
            )),
            other => Err(CatbaseError::Config(format!(
                "unknown EMBEDDING_PROVIDER '{other}' (expected 'ollama' or 'openai')"
            ))),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  storage:     path={}", self.storage.storage_path.display());
        tracing::info!(
            "  embedding:   provider={}, model={}, dims={}",
            self.embedding.provider,
            self.embedding.embedding_model,
            self.embedding.dimensions
        );
        tracing::info!(
            "  openai:      base_url={}, key={}",
            self.openai.base_url,
            if self.openai.api_key.is_some() { "set" } else { "(none)" }
        );
        tracing::info!("  ollama:      url={}", self.ollama.url);
        tracing::info!(
            "  chunking:    size={}, overlap={}, window={}/{}",
            self.chunking.chunk_size,
            self.chunking.chunk_overlap,
            self.chunking.window_tokens,
            self.chunking.window_overlap
        );
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where persisted collections live.
    pub storage_path: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            storage_path: PathBuf::from(profiled_env_or(p, "STORAGE_PATH", "./catbase-data")),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama", "openai"
    pub provider: String,
    /// Which model computes vectors.
    pub embedding_model: String,
    pub dimensions: usize,
    pub batch_size: usize,
    pub cache_capacity: usize,
}

impl EmbeddingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let provider = profiled_env_or(p, "EMBEDDING_PROVIDER", "ollama").to_lowercase();
        let default_model = match provider.as_str() {
            "openai" => "text-embedding-3-small",
            _ => "nomic-embed-text",
        };
        let default_dims = match provider.as_str() {
            "openai" => 1536,
            _ => 768,
        };
        Self {
            embedding_model: profiled_env_or(p, "EMBEDDING_MODEL", default_model),
            dimensions: profiled_env_usize(p, "EMBEDDING_DIMENSIONS", default_dims),
            batch_size: profiled_env_usize(p, "EMBEDDING_BATCH_SIZE", 64),
            cache_capacity: profiled_env_usize(p, "EMBEDDING_CACHE_SIZE", 4096),
            provider,
        }
    }
}

// ── OpenAI ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
}

impl OpenAiConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            base_url: profiled_env_or(p, "OPENAI_BASE_URL", "https://api.openai.com"),
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
        }
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    /// Max tokens per structurally-split piece.
    pub chunk_size: usize,
    /// Token overlap between consecutive structural pieces.
    pub chunk_overlap: usize,
    /// Embedding model token window enforced by the sub-token pass.
    pub window_tokens: usize,
    /// Token overlap between consecutive windows.
    pub window_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3000,
            chunk_overlap: 500,
            window_tokens: 384,
            window_overlap: 50,
        }
    }
}

impl ChunkingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            chunk_size: profiled_env_usize(p, "CHUNK_SIZE", d.chunk_size),
            chunk_overlap: profiled_env_usize(p, "CHUNK_OVERLAP", d.chunk_overlap),
            window_tokens: profiled_env_usize(p, "CHUNK_WINDOW_TOKENS", d.window_tokens),
            window_overlap: profiled_env_usize(p, "CHUNK_WINDOW_OVERLAP", d.window_overlap),
        }
    }

    pub fn validate(&self) -> Result<(), CatbaseError> {
        if self.chunk_size == 0 || self.window_tokens == 0 {
            return Err(CatbaseError::Config(
                "CHUNK_SIZE and CHUNK_WINDOW_TOKENS must be > 0".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(CatbaseError::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.window_overlap >= self.window_tokens {
            return Err(CatbaseError::Config(format!(
                "CHUNK_WINDOW_OVERLAP ({}) must be smaller than CHUNK_WINDOW_TOKENS ({})",
                self.window_overlap, self.window_tokens
            )));
        }
        Ok(())
    }
}

// ── arXiv ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    pub api_url: String,
}

impl ArxivConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_url: profiled_env_or(p, "ARXIV_API_URL", "http://export.arxiv.org/api/query"),
        }
    }
}
