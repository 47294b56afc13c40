//! Token counting.

use tiktoken_rs::CoreBPE;

use super::types::ChunkError;

/// Counts tokens under a fixed encoding. Implementations must be pure and
/// must never fail on special-token text such as `<|endoftext|>`.
pub trait LengthOracle: Send + Sync {
    fn token_count(&self, text: &str) -> usize;

    /// Name of the encoding, for logs.
    fn encoding(&self) -> &str;
}

/// BPE token counts under an OpenAI encoding.
pub struct TiktokenOracle {
    bpe: CoreBPE,
    encoding: &'static str,
}

impl TiktokenOracle {
    pub fn cl100k_base() -> Result<Self, ChunkError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| ChunkError::Tokenizer(e.to_string()))?;
        Ok(Self {
            bpe,
            encoding: "cl100k_base",
        })
    }
}

impl LengthOracle for TiktokenOracle {
    fn token_count(&self, text: &str) -> usize {
        // encode_ordinary treats special-token text as literal bytes.
        self.bpe.encode_ordinary(text).len()
    }

    fn encoding(&self) -> &str {
        self.encoding
    }
}

/// Approximate token count via whitespace splitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceOracle;

impl LengthOracle for WhitespaceOracle {
    fn token_count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn encoding(&self) -> &str {
        "whitespace"
    }
}
