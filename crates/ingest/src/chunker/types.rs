//! Chunker configuration and error types.

use thiserror::Error;

use catbase_core::config::ChunkingConfig;

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ChunkError {
    /// A document reached identity assignment without an `entry_id`.
    #[error("document {document} has no entry_id")]
    MissingIdentifier { document: String },

    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),

    #[error("invalid chunker configuration: {0}")]
    Config(String),
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Structural split budget, measured in tokens by the length oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum tokens per structural piece (default: 3000).
    pub chunk_size: usize,
    /// Overlap tokens between adjacent structural pieces (default: 500).
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3000,
            chunk_overlap: 500,
        }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 {
            return Err(ChunkError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl From<&ChunkingConfig> for ChunkConfig {
    fn from(cfg: &ChunkingConfig) -> Self {
        Self {
            chunk_size: cfg.chunk_size,
            chunk_overlap: cfg.chunk_overlap,
        }
    }
}
