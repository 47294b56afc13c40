//! Chunking and chunk-identity pipeline.
//!
//! Splits parent documents into overlapping, uniquely identified chunks
//! suitable for embedding: a structural pass (paragraph, line, word,
//! character) bounded by `chunk_size`, then a sentence-aware pass that
//! enforces the embedding model's token window, then `{parent}_chunk_{i}`
//! identity assignment.

mod helpers;
mod identity;
mod oracle;
mod orchestrator;
mod structural;
mod subtoken;
mod types;

pub use identity::assign_chunk_ids;
pub use oracle::{LengthOracle, TiktokenOracle, WhitespaceOracle};
pub use orchestrator::Chunker;
pub use structural::{split_structural, DEFAULT_SEPARATORS};
pub use subtoken::{SentenceWindowSplitter, SubTokenSplitter};
pub use types::{ChunkConfig, ChunkError};
