pub mod collection;
pub mod error;
pub mod inspect;
pub mod pipeline;
pub mod records;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub use collection::{Collection, CollectionMeta, QueryHit, Record};
pub use error::StorageError;
pub use inspect::{inspect_collection, CollectionSummary};
pub use pipeline::{index_documents, IndexOptions, IndexReport};

const COLLECTIONS_DIR: &str = "collections";

/// Handle to the on-disk collection store rooted at `storage_path`.
///
/// Layout: `{storage_path}/collections/{name}/{meta.json,records.dat}`.
#[derive(Debug, Clone)]
pub struct VectorStore {
    root: PathBuf,
}

impl VectorStore {
    /// Open (creating if needed) the store at `storage_path`.
    pub fn open(storage_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = storage_path.as_ref().to_path_buf();
        fs::create_dir_all(root.join(COLLECTIONS_DIR))?;
        info!(path = %root.display(), "opened vector store");
        Ok(Self { root })
    }

    pub fn from_config(config: &catbase_core::Config) -> Result<Self, StorageError> {
        Self::open(&config.storage.storage_path)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, name: &str) -> PathBuf {
        self.root.join(COLLECTIONS_DIR).join(name)
    }

    pub fn collection_exists(&self, name: &str) -> bool {
        validate_collection_name(name).is_ok()
            && self.collection_dir(name).join(collection::META_FILE).is_file()
    }

    pub fn create_collection(&self, name: &str, embedding_model: &str) -> Result<Collection, StorageError> {
        validate_collection_name(name)?;
        if self.collection_exists(name) {
            return Err(StorageError::CollectionExists(name.to_string()));
        }
        Collection::create(self.collection_dir(name), name, embedding_model)
    }

    pub fn get_collection(&self, name: &str) -> Result<Collection, StorageError> {
        validate_collection_name(name)?;
        if !self.collection_exists(name) {
            return Err(StorageError::CollectionNotFound(name.to_string()));
        }
        Collection::open(self.collection_dir(name))
    }

    /// Open `name`, creating it for `embedding_model` if absent. An existing
    /// collection keeps the model it was created with.
    pub fn get_or_create_collection(
        &self,
        name: &str,
        embedding_model: &str,
    ) -> Result<Collection, StorageError> {
        if !self.collection_exists(name) {
            return self.create_collection(name, embedding_model);
        }
        let collection = self.get_collection(name)?;
        if collection.embedding_model() != embedding_model {
            warn!(
                collection = name,
                stored = collection.embedding_model(),
                requested = embedding_model,
                "collection was built with a different embedding model"
            );
        }
        Ok(collection)
    }

    /// Names of every collection, sorted.
    pub fn list_collections(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(self.root.join(COLLECTIONS_DIR))
            .min_depth(1)
            .max_depth(1)
        {
            let entry = entry.map_err(|e| StorageError::Io(e.into()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.collection_exists(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete_collection(&self, name: &str) -> Result<(), StorageError> {
        validate_collection_name(name)?;
        if !self.collection_exists(name) {
            return Err(StorageError::CollectionNotFound(name.to_string()));
        }
        fs::remove_dir_all(self.collection_dir(name))?;
        info!(collection = name, "deleted collection");
        Ok(())
    }
}

/// 3-63 chars of `[A-Za-z0-9._-]`, alphanumeric at both ends, no `..`.
pub fn validate_collection_name(name: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if !(3..=63).contains(&name.len()) {
        return Err(invalid("must be 3-63 characters long"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
    {
        return Err(invalid("only ASCII letters, digits, '.', '_' and '-' are allowed"));
    }
    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return Err(invalid("must start and end with a letter or digit"));
    }
    if name.contains("..") {
        return Err(invalid("must not contain '..'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names() {
        let longest = "a".repeat(63);
        let too_long = "a".repeat(64);
        for ok in ["abc", "catalysis-2024", "my_papers.v2", longest.as_str()] {
            assert!(validate_collection_name(ok).is_ok(), "{ok} should be valid");
        }
        for bad in ["ab", "", "-abc", "abc_", "has space", "a..b", "ünï", too_long.as_str()] {
            assert!(
                matches!(validate_collection_name(bad), Err(StorageError::InvalidName { .. })),
                "{bad} should be invalid"
            );
        }
    }
}
