use std::sync::Arc;

use tracing::debug;

use super::cache::EmbeddingCache;
use super::traits::{check_embeddings, Embedder, EmbeddingError};

/// Collects `(entry_id, text)` pairs and flushes when the batch is full.
///
/// With a cache attached, texts already seen are answered from the cache
/// and only the misses reach the backend.
pub struct EmbeddingBatcher {
    buffer: Vec<(String, String)>,
    batch_size: usize,
    embedder: Arc<dyn Embedder>,
    cache: Option<EmbeddingCache>,
    embedded: usize,
    cached: usize,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            embedder,
            cache: None,
            embedded: 0,
            cached: 0,
        }
    }

    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Add a chunk to the batch. Returns embeddings if the batch is full (auto-flush).
    pub async fn add(
        &mut self,
        entry_id: String,
        text: String,
    ) -> Result<Option<Vec<(String, Vec<f32>)>>, EmbeddingError> {
        self.buffer.push((entry_id, text));
        if self.buffer.len() >= self.batch_size {
            Ok(Some(self.flush().await?))
        } else {
            Ok(None)
        }
    }

    /// Force-flush remaining items. Output follows insertion order.
    pub async fn flush(&mut self) -> Result<Vec<(String, Vec<f32>)>, EmbeddingError> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        let batch: Vec<(String, String)> = self.buffer.drain(..).collect();

        let mut slots: Vec<Option<Vec<f32>>> = match self.cache.as_mut() {
            Some(cache) => batch.iter().map(|(_, text)| cache.get(text)).collect(),
            None => vec![None; batch.len()],
        };

        let misses: Vec<usize> = (0..batch.len()).filter(|&i| slots[i].is_none()).collect();
        let hits = batch.len() - misses.len();

        if !misses.is_empty() {
            let texts: Vec<&str> = misses.iter().map(|&i| batch[i].1.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            check_embeddings(texts.len(), self.embedder.dimensions(), &embeddings)?;

            for (&i, embedding) in misses.iter().zip(embeddings) {
                if let Some(cache) = self.cache.as_mut() {
                    cache.put(&batch[i].1, embedding.clone());
                }
                slots[i] = Some(embedding);
            }
        }

        debug!(batch = batch.len(), cached = hits, "flushed embedding batch");
        self.embedded += misses.len();
        self.cached += hits;

        Ok(batch
            .into_iter()
            .zip(slots)
            .filter_map(|((id, _), emb)| emb.map(|e| (id, e)))
            .collect())
    }

    /// Number of items currently buffered.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Texts sent to the backend so far.
    pub fn embedded(&self) -> usize {
        self.embedded
    }

    /// Texts answered from the cache so far.
    pub fn cached(&self) -> usize {
        self.cached
    }

    pub fn cache(&self) -> Option<&EmbeddingCache> {
        self.cache.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEmbedder {
        call_count: AtomicUsize,
        texts_seen: AtomicUsize,
        dims: usize,
    }

    impl FakeEmbedder {
        fn new(dims: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                texts_seen: AtomicUsize::new(0),
                dims,
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.texts_seen.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32; self.dims])
                .collect())
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn model(&self) -> &str {
            "fake"
        }
    }

    #[tokio::test]
    async fn flush_on_batch_size() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 3);

        assert!(batcher.add("d_chunk_0".into(), "a".into()).await.unwrap().is_none());
        assert!(batcher.add("d_chunk_1".into(), "b".into()).await.unwrap().is_none());
        assert_eq!(batcher.pending(), 2);

        let embeddings = batcher
            .add("d_chunk_2".into(), "c".into())
            .await
            .unwrap()
            .expect("batch should flush");
        let ids: Vec<&str> = embeddings.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["d_chunk_0", "d_chunk_1", "d_chunk_2"]);
        assert_eq!(batcher.pending(), 0);
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn manual_flush() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 100);

        batcher.add("x".into(), "a".into()).await.unwrap();
        batcher.add("y".into(), "b".into()).await.unwrap();

        let result = batcher.flush().await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(batcher.pending(), 0);
        assert_eq!(batcher.embedded(), 2);
    }

    #[tokio::test]
    async fn flush_empty_is_noop() {
        let embedder = Arc::new(FakeEmbedder::new(4));
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 10);

        let result = batcher.flush().await.unwrap();
        assert!(result.is_empty());
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cached_texts_skip_the_backend() {
        let embedder = Arc::new(FakeEmbedder::new(2));
        let mut batcher =
            EmbeddingBatcher::new(embedder.clone(), 10).with_cache(EmbeddingCache::new(16));

        batcher.add("a_chunk_0".into(), "same".into()).await.unwrap();
        batcher.add("a_chunk_1".into(), "other".into()).await.unwrap();
        batcher.flush().await.unwrap();

        batcher.add("b_chunk_0".into(), "same".into()).await.unwrap();
        batcher.add("b_chunk_1".into(), "fresh".into()).await.unwrap();
        let out = batcher.flush().await.unwrap();

        assert_eq!(out[0], ("b_chunk_0".to_string(), vec![4.0, 4.0]));
        assert_eq!(out[1], ("b_chunk_1".to_string(), vec![5.0, 5.0]));
        assert_eq!(embedder.texts_seen.load(Ordering::SeqCst), 3);
        assert_eq!(batcher.embedded(), 3);
        assert_eq!(batcher.cached(), 1);
        assert_eq!(batcher.cache().map(EmbeddingCache::len), Some(3));
    }

    #[tokio::test]
    async fn fully_cached_batch_makes_no_call() {
        let embedder = Arc::new(FakeEmbedder::new(2));
        let mut cache = EmbeddingCache::new(4);
        cache.put("known", vec![9.0, 9.0]);
        let mut batcher = EmbeddingBatcher::new(embedder.clone(), 10).with_cache(cache);

        batcher.add("k".into(), "known".into()).await.unwrap();
        let out = batcher.flush().await.unwrap();
        assert_eq!(out, vec![("k".to_string(), vec![9.0, 9.0])]);
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 0);
    }
}
