use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use catbase_core::{Document, Metadata};

use crate::error::StorageError;
use crate::records::{read_records, RecordWriter};

pub const META_FILE: &str = "meta.json";

/// One embedded chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// The chunk text.
    pub document: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

impl Record {
    pub fn new(id: impl Into<String>, chunk: Document, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            document: chunk.text,
            metadata: chunk.metadata,
            embedding,
        }
    }
}

/// Collection metadata stored as meta.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub name: String,
    pub embedding_model: String,
    /// Fixed by the first stored vector.
    pub dimensions: Option<usize>,
    pub record_count: usize,
    pub compression: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A scored query result.
#[derive(Debug, Clone, Copy)]
pub struct QueryHit<'a> {
    pub record: &'a Record,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// A named, persistent set of records, loaded fully into memory.
///
/// Changes live in memory until [`Collection::flush`]. Keep a single handle
/// per collection; two handles flushing the same directory overwrite each
/// other.
pub struct Collection {
    dir: PathBuf,
    meta: CollectionMeta,
    records: IndexMap<String, Record>,
    dirty: bool,
}

impl Collection {
    pub(crate) fn create(dir: PathBuf, name: &str, embedding_model: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir)?;
        let now = Utc::now();
        let mut collection = Self {
            dir,
            meta: CollectionMeta {
                name: name.to_string(),
                embedding_model: embedding_model.to_string(),
                dimensions: None,
                record_count: 0,
                compression: "zstd".to_string(),
                created_at: now,
                updated_at: now,
            },
            records: IndexMap::new(),
            dirty: true,
        };
        collection.flush()?;
        info!(collection = name, embedding_model, "created collection");
        Ok(collection)
    }

    pub(crate) fn open(dir: PathBuf) -> Result<Self, StorageError> {
        let meta = read_meta(&dir)?;
        let records: IndexMap<String, Record> = read_records(&dir)?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        if records.len() != meta.record_count {
            tracing::warn!(
                collection = %meta.name,
                expected = meta.record_count,
                found = records.len(),
                "record count differs from meta.json"
            );
        }
        debug!(collection = %meta.name, records = records.len(), "opened collection");

        Ok(Self {
            dir,
            meta,
            records,
            dirty: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn embedding_model(&self) -> &str {
        &self.meta.embedding_model
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.meta.dimensions
    }

    pub fn meta(&self) -> &CollectionMeta {
        &self.meta
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Insert or replace records by id. A replaced record keeps its original
    /// position. Either every record is accepted or none is.
    pub fn upsert(&mut self, records: Vec<Record>) -> Result<usize, StorageError> {
        let mut dims = self.meta.dimensions;
        for record in &records {
            let actual = record.embedding.len();
            match dims {
                Some(expected) if expected != actual => {
                    return Err(StorageError::DimensionMismatch {
                        id: record.id.clone(),
                        expected,
                        actual,
                    });
                }
                None if actual == 0 => {
                    return Err(StorageError::DimensionMismatch {
                        id: record.id.clone(),
                        expected: 1,
                        actual,
                    });
                }
                None => dims = Some(actual),
                Some(_) => {}
            }
        }

        let count = records.len();
        for record in records {
            self.records.insert(record.id.clone(), record);
        }
        if count > 0 {
            self.meta.dimensions = dims;
            self.dirty = true;
        }
        Ok(count)
    }

    /// Keep only the records matching `keep`, preserving order. Returns the
    /// number removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Record) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| keep(record));
        let removed = before - self.records.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first `limit` records in insertion order.
    pub fn peek(&self, limit: usize) -> Vec<&Record> {
        self.records.values().take(limit).collect()
    }

    /// Every record id in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// The `n` records most similar to `embedding` by cosine similarity,
    /// best first. Ties keep insertion order.
    pub fn query(&self, embedding: &[f32], n: usize) -> Result<Vec<QueryHit<'_>>, StorageError> {
        if let Some(expected) = self.meta.dimensions {
            if embedding.len() != expected {
                return Err(StorageError::DimensionMismatch {
                    id: "(query)".to_string(),
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let mut hits: Vec<QueryHit<'_>> = self
            .records
            .values()
            .map(|record| QueryHit {
                record,
                score: cosine_similarity(embedding, &record.embedding),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(n);
        Ok(hits)
    }

    /// Persist pending changes. No-op when nothing changed.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }

        let mut writer = RecordWriter::create(&self.dir)?;
        for record in self.records.values() {
            writer.append(record)?;
        }
        let stats = writer.finish()?;

        self.meta.record_count = stats.record_count;
        self.meta.updated_at = Utc::now();
        write_meta(&self.dir, &self.meta)?;
        self.dirty = false;

        info!(
            "Collection {} flushed: {} records, {} bytes ({} raw)",
            self.meta.name, stats.record_count, stats.size_bytes, stats.raw_bytes
        );
        Ok(())
    }

    /// Flush and release the handle.
    pub fn close(mut self) -> Result<(), StorageError> {
        self.flush()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

pub(crate) fn read_meta(dir: &Path) -> Result<CollectionMeta, StorageError> {
    let content = fs::read_to_string(dir.join(META_FILE))?;
    serde_json::from_str(&content).map_err(|e| StorageError::Serialize(e.to_string()))
}

fn write_meta(dir: &Path, meta: &CollectionMeta) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(meta).map_err(|e| StorageError::Serialize(e.to_string()))?;
    let tmp = dir.join(format!("{META_FILE}.tmp"));
    fs::write(&tmp, json)?;
    fs::rename(&tmp, dir.join(META_FILE))?;
    Ok(())
}
