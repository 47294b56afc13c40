use catbase_core::Document;
use catbase_storage::{Record, StorageError, VectorStore};

use crate::helpers::test_data_dir;

#[test]
fn test_collection_lifecycle() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();

    assert!(store.list_collections().unwrap().is_empty());

    store.create_collection("zeolites", "m").unwrap();
    store.create_collection("catalysis", "m").unwrap();
    assert!(store.collection_exists("zeolites"));
    assert_eq!(store.list_collections().unwrap(), vec!["catalysis", "zeolites"]);

    let dup = store.create_collection("zeolites", "m");
    assert!(matches!(dup, Err(StorageError::CollectionExists(_))));

    store.delete_collection("zeolites").unwrap();
    assert!(!store.collection_exists("zeolites"));
    assert_eq!(store.list_collections().unwrap(), vec!["catalysis"]);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[test]
fn test_missing_collection_errors() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();

    assert!(matches!(
        store.get_collection("nothing-here"),
        Err(StorageError::CollectionNotFound(_))
    ));
    assert!(matches!(
        store.delete_collection("nothing-here"),
        Err(StorageError::CollectionNotFound(_))
    ));

    std::fs::remove_dir_all(&data_dir).ok();
}

#[test]
fn test_invalid_names_rejected() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();

    for name in ["x", "../escape", "bad name", "-dash"] {
        assert!(
            matches!(store.create_collection(name, "m"), Err(StorageError::InvalidName { .. })),
            "{name} should be rejected"
        );
        assert!(!store.collection_exists(name));
    }
    assert!(store.list_collections().unwrap().is_empty());

    std::fs::remove_dir_all(&data_dir).ok();
}

#[test]
fn test_stray_directories_are_not_collections() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    std::fs::create_dir_all(data_dir.join("collections").join("no-meta")).unwrap();
    std::fs::write(data_dir.join("collections").join("file.txt"), "x").unwrap();

    assert!(store.list_collections().unwrap().is_empty());

    std::fs::remove_dir_all(&data_dir).ok();
}

#[test]
fn test_records_survive_reopen() {
    let data_dir = test_data_dir();
    {
        let store = VectorStore::open(&data_dir).unwrap();
        let mut c = store.get_or_create_collection("persisted", "model-a").unwrap();
        let records = (0..50)
            .map(|i| Record::new(format!("doc_chunk_{i}"), Document::new(format!("chunk {i}")), vec![i as f32, 1.0]))
            .collect();
        c.upsert(records).unwrap();
        c.close().unwrap();
    }

    let store = VectorStore::open(&data_dir).unwrap();
    let c = store.get_or_create_collection("persisted", "model-b").unwrap();
    assert_eq!(c.embedding_model(), "model-a", "existing model is kept");
    assert_eq!(c.count(), 50);
    assert_eq!(c.meta().record_count, 50);
    let ids: Vec<&str> = c.ids().take(3).collect();
    assert_eq!(ids, vec!["doc_chunk_0", "doc_chunk_1", "doc_chunk_2"]);
    assert_eq!(c.get("doc_chunk_49").map(|r| r.document.as_str()), Some("chunk 49"));
    assert_eq!(c.peek(5).len(), 5);

    std::fs::remove_dir_all(&data_dir).ok();
}

#[test]
fn test_unflushed_changes_are_not_persisted() {
    let data_dir = test_data_dir();
    let store = VectorStore::open(&data_dir).unwrap();
    {
        let mut c = store.create_collection("volatile", "m").unwrap();
        c.upsert(vec![Record::new("a", Document::new("a"), vec![1.0])]).unwrap();
    }
    assert_eq!(store.get_collection("volatile").unwrap().count(), 0);

    std::fs::remove_dir_all(&data_dir).ok();
}
