use std::collections::HashSet;
use std::fmt;

use indexmap::IndexSet;

use catbase_core::{parent_entry_id, Metadata, TITLE};

use crate::collection::Collection;

const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub id: String,
    pub preview: String,
    pub metadata: Metadata,
}

/// What `catbase inspect` prints about a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSummary {
    pub name: String,
    pub count: usize,
    /// Distinct parent documents behind the stored chunks.
    pub parent_count: usize,
    pub embedding_model: String,
    pub dimensions: Option<usize>,
    /// Union of metadata keys, in first-seen order.
    pub metadata_keys: Vec<String>,
    pub sample: Vec<SampleRecord>,
}

pub fn inspect_collection(collection: &Collection, sample: usize) -> CollectionSummary {
    let parents: HashSet<&str> = collection.ids().map(parent_entry_id).collect();

    let mut keys: IndexSet<&str> = IndexSet::new();
    for record in collection.records() {
        keys.extend(record.metadata.keys().map(String::as_str));
    }

    let sample = collection
        .peek(sample)
        .into_iter()
        .map(|r| SampleRecord {
            id: r.id.clone(),
            preview: preview(&r.document),
            metadata: r.metadata.clone(),
        })
        .collect();

    CollectionSummary {
        name: collection.name().to_string(),
        count: collection.count(),
        parent_count: parents.len(),
        embedding_model: collection.embedding_model().to_string(),
        dimensions: collection.dimensions(),
        metadata_keys: keys.into_iter().map(str::to_string).collect(),
        sample,
    }
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

impl fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Collection:      {}", self.name)?;
        writeln!(f, "Chunks:          {}", self.count)?;
        writeln!(f, "Documents:       {}", self.parent_count)?;
        match self.dimensions {
            Some(d) => writeln!(f, "Embedding model: {} ({d} dims)", self.embedding_model)?,
            None => writeln!(f, "Embedding model: {}", self.embedding_model)?,
        }
        writeln!(f, "Metadata keys:   {}", self.metadata_keys.join(", "))?;
        for record in &self.sample {
            writeln!(f, "----------------------------------------")?;
            writeln!(f, "{}", record.id)?;
            if let Some(title) = record.metadata.get(TITLE) {
                writeln!(f, "  Title: {title}")?;
            }
            writeln!(f, "  {}", record.preview)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Record;
    use crate::VectorStore;
    use catbase_core::{Document, ENTRY_ID};

    #[test]
    fn counts_parents_across_all_records() {
        let dir = std::env::temp_dir().join(format!("catbase-inspect-{}", uuid::Uuid::new_v4()));
        let store = VectorStore::open(&dir).unwrap();
        let mut c = store.create_collection("inspect-me", "m").unwrap();

        let records = ["p1_chunk_0", "p1_chunk_1", "p2_chunk_0", "p3_chunk_0"]
            .into_iter()
            .map(|id| {
                let doc = Document::new(format!("text  of\n{id}"))
                    .with_metadata(ENTRY_ID, id)
                    .with_metadata(TITLE, "A title");
                Record::new(id, doc, vec![1.0, 0.0])
            })
            .collect();
        c.upsert(records).unwrap();

        let summary = inspect_collection(&c, 2);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.parent_count, 3);
        assert_eq!(summary.dimensions, Some(2));
        assert_eq!(summary.metadata_keys, vec![ENTRY_ID, TITLE]);
        assert_eq!(summary.sample.len(), 2);
        assert_eq!(summary.sample[0].preview, "text of p1_chunk_0");

        let printed = summary.to_string();
        assert!(printed.contains("Documents:       3"));
        assert!(printed.contains("Title: A title"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "word ".repeat(100);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
    }
}
