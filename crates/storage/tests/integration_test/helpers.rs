use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use catbase_core::{Document, ENTRY_ID, TITLE};
use catbase_ingest::chunker::{LengthOracle, SentenceWindowSplitter, WhitespaceOracle};
use catbase_ingest::{ChunkConfig, Chunker, Embedder, EmbeddingError};

/// Create a unique temp directory for each test.
pub fn test_data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("catbase-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Deterministic embedder: letter-frequency vectors, so similar texts
/// land close together.
pub struct LetterEmbedder {
    pub calls: AtomicUsize,
    pub texts: AtomicUsize,
}

pub const LETTER_DIMS: usize = 26;

impl LetterEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            texts: AtomicUsize::new(0),
        })
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

pub fn letter_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; LETTER_DIMS];
    for b in text.bytes().filter(u8::is_ascii_alphabetic) {
        v[(b.to_ascii_lowercase() - b'a') as usize] += 1.0;
    }
    v
}

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| letter_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        LETTER_DIMS
    }

    fn model(&self) -> &str {
        "letter-frequency"
    }
}

/// Word-counting chunker: `chunk_size` words per structural piece and a
/// 20-word sentence window.
pub fn word_chunker(chunk_size: usize) -> Chunker {
    let oracle: Arc<dyn LengthOracle> = Arc::new(WhitespaceOracle);
    let splitter = SentenceWindowSplitter::new(oracle.clone(), 20, 4).unwrap();
    Chunker::new(
        ChunkConfig {
            chunk_size,
            chunk_overlap: 0,
        },
        oracle,
        Arc::new(splitter),
    )
    .unwrap()
}

pub fn paper(entry_id: &str, title: &str, text: &str) -> Document {
    Document::new(text)
        .with_metadata(TITLE, title)
        .with_metadata(ENTRY_ID, entry_id)
}
