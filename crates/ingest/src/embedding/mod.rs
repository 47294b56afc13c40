pub mod batcher;
pub mod cache;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use tracing::info;

use catbase_core::Config;

pub use batcher::EmbeddingBatcher;
pub use cache::{CacheStats, EmbeddingCache};
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};

/// Build the embedding backend named by `EMBEDDING_PROVIDER`.
pub fn embedder_from_config(config: &Config) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let emb = &config.embedding;
    match emb.provider.as_str() {
        "ollama" => {
            info!(
                "Embedding provider ready: ollama (model: {}, dims: {})",
                emb.embedding_model, emb.dimensions
            );
            Ok(Arc::new(OllamaEmbedder::new(
                config.ollama.url.clone(),
                emb.embedding_model.clone(),
                emb.dimensions,
            )))
        }
        "openai" => {
            let api_key = config.openai.api_key.clone().ok_or_else(|| {
                EmbeddingError::Config("EMBEDDING_PROVIDER=openai requires OPENAI_API_KEY".into())
            })?;
            info!(
                "Embedding provider ready: openai (model: {}, dims: {})",
                emb.embedding_model, emb.dimensions
            );
            Ok(Arc::new(OpenAiEmbedder::new(
                api_key,
                emb.embedding_model.clone(),
                config.openai.base_url.clone(),
                emb.dimensions,
            )))
        }
        other => Err(EmbeddingError::Config(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}
