//! Deterministic chunk identifiers.

use tracing::debug;

use catbase_core::{chunk_entry_id, parent_entry_id, Document, ENTRY_ID};

use super::types::ChunkError;

/// Rewrite each chunk's `entry_id` to `{base}_chunk_{i}`, where `base` is
/// `parent_id` with any `_chunk_{n}` suffixes stripped and `i` is the
/// chunk's position.
///
/// Chunks are consumed; every output owns its own metadata map.
pub fn assign_chunk_ids(
    parent_id: Option<&str>,
    chunks: Vec<Document>,
) -> Result<Vec<Document>, ChunkError> {
    let parent_id = parent_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ChunkError::MissingIdentifier {
            document: "(chunk parent)".to_string(),
        })?;

    let base = parent_entry_id(parent_id);
    if base.len() != parent_id.len() {
        debug!(parent_id, base, "rebasing already-chunked entry id");
    }

    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(i, mut chunk)| {
            chunk
                .metadata
                .insert(ENTRY_ID.to_string(), chunk_entry_id(base, i).into());
            chunk
        })
        .collect())
}
