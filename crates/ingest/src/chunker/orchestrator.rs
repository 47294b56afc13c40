//! Document-level orchestration: structural split, sub-token split, identity.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use catbase_core::config::ChunkingConfig;
use catbase_core::{Document, FILE_NAME, TITLE};

use super::identity::assign_chunk_ids;
use super::oracle::{LengthOracle, TiktokenOracle};
use super::structural::split_structural;
use super::subtoken::{SentenceWindowSplitter, SubTokenSplitter};
use super::types::{ChunkConfig, ChunkError};

/// Turns parent documents into identified chunks. Immutable once built, so
/// one instance can serve a whole run (and several threads).
pub struct Chunker {
    config: ChunkConfig,
    oracle: Arc<dyn LengthOracle>,
    sub_splitter: Arc<dyn SubTokenSplitter>,
}

impl Chunker {
    pub fn new(
        config: ChunkConfig,
        oracle: Arc<dyn LengthOracle>,
        sub_splitter: Arc<dyn SubTokenSplitter>,
    ) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self {
            config,
            oracle,
            sub_splitter,
        })
    }

    /// Production chunker: `cl100k_base` token counts and a sentence window
    /// splitter sized from the config.
    pub fn from_config(cfg: &ChunkingConfig) -> Result<Self, ChunkError> {
        let oracle: Arc<dyn LengthOracle> = Arc::new(TiktokenOracle::cl100k_base()?);
        let sub_splitter = Arc::new(SentenceWindowSplitter::new(
            oracle.clone(),
            cfg.window_tokens,
            cfg.window_overlap,
        )?);
        Self::new(ChunkConfig::from(cfg), oracle, sub_splitter)
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    pub fn token_count(&self, text: &str) -> usize {
        self.oracle.token_count(text)
    }

    /// Structural split followed by a sub-token split of every piece, in order.
    pub fn create_text_chunks(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        let structural = split_structural(
            text,
            self.config.chunk_size,
            self.config.chunk_overlap,
            self.oracle.as_ref(),
        );

        let mut chunks = Vec::with_capacity(structural.len());
        for piece in &structural {
            chunks.extend(self.sub_splitter.split(piece)?);
        }
        Ok(chunks)
    }

    /// Chunk a single document. Fails if it has no `entry_id`.
    pub fn chunk_document(&self, doc: &Document) -> Result<Vec<Document>, ChunkError> {
        self.chunk_at(0, doc)
    }

    /// Chunk every document in order. All-or-nothing: the first failure is
    /// returned and no partial list escapes.
    pub fn chunk_documents(&self, documents: &[Document]) -> Result<Vec<Document>, ChunkError> {
        let mut chunked = Vec::new();
        for (index, doc) in documents.iter().enumerate() {
            chunked.extend(self.chunk_at(index, doc)?);
        }
        info!(
            documents = documents.len(),
            chunks = chunked.len(),
            "Chunked {} documents into {} chunks",
            documents.len(),
            chunked.len()
        );
        Ok(chunked)
    }

    /// Same output as [`Chunker::chunk_documents`], with documents processed
    /// on the rayon pool and re-assembled in input order.
    pub fn par_chunk_documents(&self, documents: &[Document]) -> Result<Vec<Document>, ChunkError> {
        let per_doc: Vec<Vec<Document>> = documents
            .par_iter()
            .enumerate()
            .map(|(index, doc)| self.chunk_at(index, doc))
            .collect::<Result<_, _>>()?;

        let chunked: Vec<Document> = per_doc.into_iter().flatten().collect();
        info!(
            documents = documents.len(),
            chunks = chunked.len(),
            "Chunked {} documents into {} chunks (parallel)",
            documents.len(),
            chunked.len()
        );
        Ok(chunked)
    }

    fn chunk_at(&self, index: usize, doc: &Document) -> Result<Vec<Document>, ChunkError> {
        let entry_id = doc
            .entry_id()
            .ok_or_else(|| ChunkError::MissingIdentifier {
                document: describe(index, doc),
            })?;

        let texts = self.create_text_chunks(&doc.text)?;
        debug!(entry_id, chunks = texts.len(), "chunked document");

        let chunks = texts
            .into_iter()
            .map(|text| Document {
                text,
                metadata: doc.metadata.clone(),
            })
            .collect();
        assign_chunk_ids(Some(entry_id), chunks)
    }
}

fn describe(index: usize, doc: &Document) -> String {
    match doc.get_str(FILE_NAME).or_else(|| doc.get_str(TITLE)) {
        Some(name) => format!("#{index} ({name})"),
        None => format!("#{index}"),
    }
}
