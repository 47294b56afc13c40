use thiserror::Error;

use catbase_ingest::{ChunkError, EmbeddingError};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid collection name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("collection already exists: {0}")]
    CollectionExists(String),

    #[error("record {id}: expected {expected}-dimensional embedding, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("corrupt record file: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("chunking failed: {0}")]
    Chunk(#[from] ChunkError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}
