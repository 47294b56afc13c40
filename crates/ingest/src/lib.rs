pub mod chunker;
pub mod embedding;
pub mod loader;

pub use chunker::{ChunkConfig, ChunkError, Chunker};
pub use embedding::{embedder_from_config, Embedder, EmbeddingBatcher, EmbeddingCache, EmbeddingError};
pub use loader::{ArxivClient, LoadError};
