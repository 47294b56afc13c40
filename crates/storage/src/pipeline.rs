//! Chunk, embed and store a batch of parent documents.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use catbase_core::config::EmbeddingConfig;
use catbase_core::{parent_entry_id, Document};
use catbase_ingest::{ChunkError, Chunker, Embedder, EmbeddingBatcher, EmbeddingCache};

use crate::collection::{Collection, Record};
use crate::error::StorageError;
use crate::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexOptions {
    /// Chunks per embedding request.
    pub batch_size: usize,
    /// Embedding cache entries; 0 disables the cache.
    pub cache_capacity: usize,
    /// Chunk documents on the rayon pool.
    pub parallel: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            batch_size: 64,
            cache_capacity: 4096,
            parallel: true,
        }
    }
}

impl From<&EmbeddingConfig> for IndexOptions {
    fn from(cfg: &EmbeddingConfig) -> Self {
        Self {
            batch_size: cfg.batch_size,
            cache_capacity: cfg.cache_capacity,
            ..Self::default()
        }
    }
}

/// Outcome of one [`index_documents`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub collection: String,
    pub documents: usize,
    pub chunks: usize,
    /// Chunks embedded by the backend.
    pub embedded: usize,
    /// Chunks answered from the embedding cache.
    pub cached: usize,
    /// Stale chunks of re-indexed parents that were removed.
    pub pruned: usize,
    /// Records in the collection after the run.
    pub collection_count: usize,
}

/// Chunk `documents`, embed every chunk and upsert the records into the
/// collection `name` (created if absent), then flush it.
///
/// Chunking is all-or-nothing: if any document lacks an `entry_id`, nothing
/// is embedded or written.
///
/// Re-indexing a parent replaces its chunk set: chunks of that parent left
/// over from an earlier run (e.g. a higher `_chunk_{n}` after the text
/// shrank) are removed.
pub async fn index_documents(
    store: &VectorStore,
    name: &str,
    documents: &[Document],
    chunker: &Chunker,
    embedder: Arc<dyn Embedder>,
    options: &IndexOptions,
) -> Result<IndexReport, StorageError> {
    let chunks = if options.parallel {
        chunker.par_chunk_documents(documents)?
    } else {
        chunker.chunk_documents(documents)?
    };
    let chunk_count = chunks.len();

    let mut collection = store.get_or_create_collection(name, embedder.model())?;

    let mut batcher = EmbeddingBatcher::new(embedder, options.batch_size);
    if options.cache_capacity > 0 {
        batcher = batcher.with_cache(EmbeddingCache::new(options.cache_capacity));
    }

    let parents: HashSet<&str> = documents
        .iter()
        .filter_map(Document::entry_id)
        .map(parent_entry_id)
        .collect();
    let mut fresh: HashSet<String> = HashSet::with_capacity(chunk_count);

    let mut pending: Vec<(String, Document)> = Vec::with_capacity(options.batch_size);
    for chunk in chunks {
        let id = chunk
            .entry_id()
            .ok_or_else(|| ChunkError::MissingIdentifier {
                document: format!("chunk of collection {name}"),
            })?
            .to_string();
        let text = chunk.text.clone();
        fresh.insert(id.clone());
        pending.push((id.clone(), chunk));

        if let Some(embedded) = batcher.add(id, text).await? {
            store_batch(&mut collection, &mut pending, embedded)?;
        }
    }
    let embedded = batcher.flush().await?;
    store_batch(&mut collection, &mut pending, embedded)?;

    let pruned = collection
        .retain(|r| fresh.contains(&r.id) || !parents.contains(parent_entry_id(&r.id)));
    if pruned > 0 {
        debug!(collection = name, pruned, "removed stale chunks of re-indexed documents");
    }

    collection.flush()?;

    if let Some(stats) = batcher.cache().map(EmbeddingCache::stats) {
        debug!(
            hits = stats.hits,
            misses = stats.misses,
            "embedding cache hit rate {:.1}%",
            stats.hit_rate() * 100.0
        );
    }

    let report = IndexReport {
        collection: collection.name().to_string(),
        documents: documents.len(),
        chunks: chunk_count,
        embedded: batcher.embedded(),
        cached: batcher.cached(),
        pruned,
        collection_count: collection.count(),
    };
    info!(
        collection = %report.collection,
        documents = report.documents,
        chunks = report.chunks,
        cached = report.cached,
        "Indexed {} chunks into collection '{}' ({} records total)",
        report.chunks,
        report.collection,
        report.collection_count
    );
    Ok(report)
}

/// Pair buffered chunks with their embeddings (both in insertion order).
fn store_batch(
    collection: &mut Collection,
    pending: &mut Vec<(String, Document)>,
    embedded: Vec<(String, Vec<f32>)>,
) -> Result<(), StorageError> {
    if embedded.len() != pending.len() {
        return Err(StorageError::Embedding(
            catbase_ingest::EmbeddingError::CountMismatch {
                expected: pending.len(),
                actual: embedded.len(),
            },
        ));
    }

    let records: Vec<Record> = pending
        .drain(..)
        .zip(embedded)
        .map(|((id, chunk), (_, embedding))| Record::new(id, chunk, embedding))
        .collect();
    collection.upsert(records)?;
    Ok(())
}
