//! Second-pass splitting that enforces the embedding model's token window.

use std::sync::Arc;

use super::helpers::{hard_split, merge_with_overlap, split_sentences, Measured};
use super::oracle::LengthOracle;
use super::types::ChunkError;

/// Splits a structural piece so that every output fits the embedding model.
pub trait SubTokenSplitter: Send + Sync {
    /// Ordered, non-empty pieces, each within the model's token window.
    fn split(&self, text: &str) -> Result<Vec<String>, ChunkError>;
}

/// Packs whole sentences into fixed token windows, overlapping consecutive
/// windows by trailing sentences.
pub struct SentenceWindowSplitter {
    oracle: Arc<dyn LengthOracle>,
    window_tokens: usize,
    overlap_tokens: usize,
}

impl SentenceWindowSplitter {
    /// Max sequence length of the sentence-transformers default model.
    pub const DEFAULT_WINDOW_TOKENS: usize = 384;
    pub const DEFAULT_OVERLAP_TOKENS: usize = 50;

    pub fn new(
        oracle: Arc<dyn LengthOracle>,
        window_tokens: usize,
        overlap_tokens: usize,
    ) -> Result<Self, ChunkError> {
        if window_tokens == 0 {
            return Err(ChunkError::Config("window_tokens must be > 0".into()));
        }
        if overlap_tokens >= window_tokens {
            return Err(ChunkError::Config(format!(
                "window overlap ({overlap_tokens}) must be smaller than window ({window_tokens})"
            )));
        }
        Ok(Self {
            oracle,
            window_tokens,
            overlap_tokens,
        })
    }

    pub fn with_defaults(oracle: Arc<dyn LengthOracle>) -> Self {
        Self {
            oracle,
            window_tokens: Self::DEFAULT_WINDOW_TOKENS,
            overlap_tokens: Self::DEFAULT_OVERLAP_TOKENS,
        }
    }

    pub fn window_tokens(&self) -> usize {
        self.window_tokens
    }
}

impl SubTokenSplitter for SentenceWindowSplitter {
    fn split(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        let oracle = self.oracle.as_ref();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        if oracle.token_count(trimmed) <= self.window_tokens {
            return Ok(vec![trimmed.to_string()]);
        }

        let mut units = Vec::new();
        for sentence in split_sentences(trimmed) {
            if oracle.token_count(&sentence) <= self.window_tokens {
                units.push(sentence);
            } else {
                units.extend(hard_split(&sentence, self.window_tokens, oracle));
            }
        }

        let measured: Vec<Measured<'_>> = units
            .iter()
            .map(|u| (u.as_str(), oracle.token_count(u)))
            .collect();
        let joiner_len = oracle.token_count(" ");

        let mut pieces = Vec::new();
        for window in merge_with_overlap(
            &measured,
            " ",
            joiner_len,
            self.window_tokens,
            self.overlap_tokens,
        ) {
            // Summed sentence counts can undershoot the joined count.
            if oracle.token_count(&window) <= self.window_tokens {
                pieces.push(window);
            } else {
                pieces.extend(hard_split(&window, self.window_tokens, oracle));
            }
        }
        Ok(pieces)
    }
}
