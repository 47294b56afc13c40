use std::collections::HashSet;

use catbase_core::{Document, ENTRY_ID, TITLE};
use catbase_storage::{index_documents, inspect_collection, IndexOptions, StorageError, VectorStore};

use crate::helpers::{letter_vector, paper, test_data_dir, word_chunker, LetterEmbedder, LETTER_DIMS};

fn corpus() -> Vec<Document> {
    vec![
        paper(
            "http://arxiv.org/abs/2101.00001v1",
            "Zeolites",
            "Zeolite frameworks trap small molecules.\n\nPore size controls selectivity.\n\nAcid sites drive cracking.",
        ),
        paper("local-abc123", "Enzymes", "Enzymes lower activation energy."),
    ]
}

#[tokio::test]
async fn test_index_and_inspect() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    let embedder = LetterEmbedder::new();
    let options = IndexOptions {
        batch_size: 2,
        ..IndexOptions::default()
    };

    let report = index_documents(&store, "papers", &corpus(), &word_chunker(6), embedder.clone(), &options)
        .await
        .unwrap();

    assert_eq!(report.collection, "papers");
    assert_eq!(report.documents, 2);
    assert_eq!(report.chunks, 4);
    assert_eq!(report.embedded + report.cached, 4);
    assert_eq!(report.collection_count, 4);

    let c = store.get_collection("papers").unwrap();
    assert_eq!(c.embedding_model(), "letter-frequency");
    assert_eq!(c.dimensions(), Some(LETTER_DIMS));
    let ids: Vec<&str> = c.ids().collect();
    assert_eq!(
        ids,
        vec![
            "http://arxiv.org/abs/2101.00001v1_chunk_0",
            "http://arxiv.org/abs/2101.00001v1_chunk_1",
            "http://arxiv.org/abs/2101.00001v1_chunk_2",
            "local-abc123_chunk_0",
        ]
    );
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());

    let first = c.get("http://arxiv.org/abs/2101.00001v1_chunk_1").unwrap();
    assert_eq!(first.document, "Pore size controls selectivity.");
    assert_eq!(first.metadata.get(TITLE).and_then(|v| v.as_str()), Some("Zeolites"));
    assert_eq!(
        first.metadata.get(ENTRY_ID).and_then(|v| v.as_str()),
        Some("http://arxiv.org/abs/2101.00001v1_chunk_1")
    );

    let summary = inspect_collection(&c, 3);
    assert_eq!(summary.count, 4);
    assert_eq!(summary.parent_count, 2);
    assert_eq!(summary.sample.len(), 3);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_reindex_replaces_records() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    let chunker = word_chunker(6);
    let options = IndexOptions::default();

    index_documents(&store, "papers", &corpus(), &chunker, LetterEmbedder::new(), &options)
        .await
        .unwrap();
    let again = index_documents(&store, "papers", &corpus(), &chunker, LetterEmbedder::new(), &options)
        .await
        .unwrap();

    assert_eq!(again.chunks, 4);
    assert_eq!(again.collection_count, 4, "same ids must overwrite, not append");
    assert_eq!(again.pruned, 0);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_reindex_with_fewer_chunks_prunes_stale_ones() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    let chunker = word_chunker(6);
    let options = IndexOptions::default();

    index_documents(&store, "papers", &corpus(), &chunker, LetterEmbedder::new(), &options)
        .await
        .unwrap();

    let shrunk = vec![paper(
        "http://arxiv.org/abs/2101.00001v1",
        "Zeolites",
        "Zeolite frameworks trap small molecules.",
    )];
    let report = index_documents(&store, "papers", &shrunk, &chunker, LetterEmbedder::new(), &options)
        .await
        .unwrap();

    assert_eq!(report.chunks, 1);
    assert_eq!(report.pruned, 2);
    assert_eq!(report.collection_count, 2);

    let c = store.get_collection("papers").unwrap();
    assert_eq!(
        c.ids().collect::<Vec<_>>(),
        vec!["http://arxiv.org/abs/2101.00001v1_chunk_0", "local-abc123_chunk_0"]
    );
    assert_eq!(inspect_collection(&c, 0).parent_count, 2);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_duplicate_chunks_hit_cache() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    let embedder = LetterEmbedder::new();
    let docs = vec![
        paper("a", "A", "Shared boilerplate text."),
        paper("b", "B", "Shared boilerplate text."),
    ];
    let options = IndexOptions {
        batch_size: 1,
        ..IndexOptions::default()
    };

    let report = index_documents(&store, "dupes", &docs, &word_chunker(50), embedder.clone(), &options)
        .await
        .unwrap();

    assert_eq!(report.chunks, 2);
    assert_eq!(report.embedded, 1);
    assert_eq!(report.cached, 1);
    assert_eq!(embedder.texts_embedded(), 1);
    assert_eq!(report.collection_count, 2);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_missing_entry_id_writes_nothing() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    let embedder = LetterEmbedder::new();
    let mut docs = corpus();
    docs.push(Document::new("no identifier here").with_metadata(TITLE, "Orphan"));

    let result = index_documents(&store, "broken", &docs, &word_chunker(6), embedder.clone(), &IndexOptions::default()).await;

    assert!(matches!(result, Err(StorageError::Chunk(_))));
    assert!(!store.collection_exists("broken"));
    assert_eq!(embedder.texts_embedded(), 0);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_query_finds_nearest_chunk() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    index_documents(&store, "papers", &corpus(), &word_chunker(6), LetterEmbedder::new(), &IndexOptions::default())
        .await
        .unwrap();

    let c = store.get_collection("papers").unwrap();
    let hits = c.query(&letter_vector("Enzymes lower activation energy."), 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.id, "local-abc123_chunk_0");
    assert!(hits[0].score > 0.999);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[tokio::test]
async fn test_sequential_and_parallel_runs_agree() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    let chunker = word_chunker(6);

    for (name, parallel) in [("seq-run", false), ("par-run", true)] {
        let options = IndexOptions {
            parallel,
            ..IndexOptions::default()
        };
        index_documents(&store, name, &corpus(), &chunker, LetterEmbedder::new(), &options)
            .await
            .unwrap();
    }

    let seq = store.get_collection("seq-run").unwrap();
    let par = store.get_collection("par-run").unwrap();
    assert_eq!(seq.records().collect::<Vec<_>>(), par.records().collect::<Vec<_>>());

    std::fs::remove_dir_all(&data_dir).ok();
}
