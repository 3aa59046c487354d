//! Vector index lifecycle: build, persist, load and query.

mod common;

use proptest::prelude::*;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use ragguard::adapters::embeddings::HashingEmbeddingProvider;
use ragguard::services::vector_index::storage::{read_manifest, MANIFEST_FILE};
use ragguard::services::vector_index::FlatIndex;
use ragguard::{DomainError, Document, VectorIndex};

use common::{corpus_documents, vector_index};

#[tokio::test]
async fn test_query_before_build_is_not_ready() {
    let index = vector_index();
    let err = index.query("anything", 3).await.unwrap_err();
    assert!(matches!(err, DomainError::IndexNotReady));
}

#[tokio::test]
async fn test_zero_top_k_is_invalid_argument() {
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();
    let err = index.query("sql", 0).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_empty_build_returns_empty_result() {
    let index = vector_index();
    index.build(vec![]).await.unwrap();

    assert!(index.is_ready().await);
    let result = index.query("x", 3).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_top_hit_and_metadata() {
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();

    let result = index.query("prevent SQL injection", 2).await.unwrap();
    assert_eq!(result.len(), 2);
    assert!(result.is_sorted_by_distance());

    let top = &result.hits[0];
    assert_eq!(top.rank, 0);
    assert_eq!(top.index, 2, "sql_injection.txt is the third corpus document");
    assert_eq!(top.document_id(), Some("sql_injection.txt#0"));
    assert_eq!(top.metadata.get("source").map(String::as_str), Some("sql_injection.txt"));
    assert!(top.text().contains("parameterized queries"));
    assert!(top.distance.is_finite() && top.distance >= 0.0);
}

#[tokio::test]
async fn test_top_k_larger_than_index() {
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();

    let result = index.query("energy", 50).await.unwrap();
    assert_eq!(result.len(), 5);
    assert!(result.is_sorted_by_distance());
}

#[tokio::test]
async fn test_persist_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let original = vector_index();
    original.build(corpus_documents()).await.unwrap();
    let generation = original.persist(dir.path()).await.unwrap();
    assert_eq!(generation, 1);

    let reloaded = vector_index();
    reloaded.load(dir.path()).await.unwrap();
    assert_eq!(reloaded.len().await, 5);
    assert_eq!(reloaded.generation().await, 1);

    for question in ["prevent SQL injection", "moon tides", "browser scripts", "glucose"] {
        let before = original.query(question, 3).await.unwrap();
        let after = reloaded.query(question, 3).await.unwrap();
        assert_eq!(before, after, "results differ for {question:?}");
    }
}

#[tokio::test]
async fn test_persist_switches_generation_and_removes_stale_files() {
    let dir = tempfile::tempdir().unwrap();
    let index = vector_index();

    index.build(corpus_documents()).await.unwrap();
    assert_eq!(index.persist(dir.path()).await.unwrap(), 1);

    index.build(corpus_documents()[..2].to_vec()).await.unwrap();
    assert_eq!(index.persist(dir.path()).await.unwrap(), 2);

    let manifest = read_manifest(dir.path()).unwrap().unwrap();
    assert_eq!(manifest.generation, 2);
    assert_eq!(manifest.count, 2);
    assert!(dir.path().join("vectors-2.bin").exists());
    assert!(dir.path().join("metadata-2.json").exists());
    assert!(!dir.path().join("vectors-1.bin").exists());
    assert!(!dir.path().join("metadata-1.json").exists());
    assert!(!dir.path().join(format!("{MANIFEST_FILE}.2.tmp")).exists());
}

#[tokio::test]
async fn test_timed_out_persist_cannot_overwrite_later_persist() {
    let dir = tempfile::tempdir().unwrap();
    let index = VectorIndex::new(
        Arc::new(HashingEmbeddingProvider::new(1024).unwrap()),
        Duration::from_nanos(1),
    );

    let large: Vec<Document> = (0..3000)
        .map(|i| Document::new(format!("d{i}"), format!("passage {i} about tides and glucose")))
        .collect();
    index.build(large).await.unwrap();
    match index.persist(dir.path()).await {
        Ok(_) | Err(DomainError::Timeout { .. }) => {}
        Err(other) => panic!("unexpected persist error: {other:?}"),
    }

    // Waits for the abandoned write before replacing the snapshot.
    index.build(corpus_documents()[..1].to_vec()).await.unwrap();
    match index.persist(dir.path()).await {
        Ok(_) | Err(DomainError::Timeout { .. }) => {}
        Err(other) => panic!("unexpected persist error: {other:?}"),
    }
    // Build takes the writer lock, so every write has finished once it returns.
    index.build(vec![]).await.unwrap();

    let reloaded = vector_index();
    reloaded.load(dir.path()).await.unwrap();
    assert_eq!(reloaded.generation().await, 2);
    assert_eq!(reloaded.len().await, 1);
    let manifest = read_manifest(dir.path()).unwrap().unwrap();
    assert_eq!(manifest.count, 1);
    assert!(!dir.path().join("vectors-1.bin").exists());
}

#[tokio::test]
async fn test_unreferenced_generation_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();
    index.persist(dir.path()).await.unwrap();

    // Data files of an interrupted persist, never named by the manifest.
    fs::write(dir.path().join("vectors-2.bin"), b"partial").unwrap();
    fs::write(dir.path().join("metadata-2.json"), b"[").unwrap();

    let reloaded = vector_index();
    reloaded.load(dir.path()).await.unwrap();
    assert_eq!(reloaded.generation().await, 1);
    assert_eq!(reloaded.len().await, 5);
}

#[tokio::test]
async fn test_persist_before_build_is_not_ready() {
    let dir = tempfile::tempdir().unwrap();
    let err = vector_index().persist(dir.path()).await.unwrap_err();
    assert!(matches!(err, DomainError::IndexNotReady));
}

#[tokio::test]
async fn test_load_missing_index_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = vector_index().load(&dir.path().join("nothing")).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_load_truncated_vectors_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();
    index.persist(dir.path()).await.unwrap();

    let vectors = dir.path().join("vectors-1.bin");
    let bytes = fs::read(&vectors).unwrap();
    fs::write(&vectors, &bytes[..bytes.len() - 4]).unwrap();

    let err = vector_index().load(dir.path()).await.unwrap_err();
    assert!(matches!(err, DomainError::CorruptIndex { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_load_count_mismatch_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();
    index.persist(dir.path()).await.unwrap();

    // Drop one metadata row so vectors and metadata disagree.
    let metadata = dir.path().join("metadata-1.json");
    let mut documents: Vec<Document> = serde_json::from_slice(&fs::read(&metadata).unwrap()).unwrap();
    documents.pop();
    fs::write(&metadata, serde_json::to_vec(&documents).unwrap()).unwrap();

    let err = vector_index().load(dir.path()).await.unwrap_err();
    assert!(matches!(err, DomainError::CorruptIndex { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_load_wrong_magic_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();
    index.persist(dir.path()).await.unwrap();

    let vectors = dir.path().join("vectors-1.bin");
    let mut bytes = fs::read(&vectors).unwrap();
    bytes[0..4].copy_from_slice(b"NOPE");
    fs::write(&vectors, bytes).unwrap();

    let err = vector_index().load(dir.path()).await.unwrap_err();
    assert!(matches!(err, DomainError::CorruptIndex { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_load_with_other_dimension_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();
    index.persist(dir.path()).await.unwrap();

    let narrow = VectorIndex::new(
        Arc::new(HashingEmbeddingProvider::new(16).unwrap()),
        Duration::from_secs(5),
    );
    let err = narrow.load(dir.path()).await.unwrap_err();
    assert!(matches!(err, DomainError::CorruptIndex { .. }));
    assert!(!narrow.is_ready().await, "a failed load must not replace the snapshot");
}

#[tokio::test]
async fn test_failed_load_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let index = vector_index();
    index.build(corpus_documents()).await.unwrap();

    assert!(index.load(dir.path()).await.is_err());
    assert_eq!(index.len().await, 5);
}

#[tokio::test]
async fn test_concurrent_queries_during_rebuild() {
    let index = Arc::new(vector_index());
    index.build(corpus_documents()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let index = Arc::clone(&index);
        handles.push(tokio::spawn(async move {
            if i % 4 == 0 {
                index.build(corpus_documents()).await.map(|()| 0)
            } else {
                index.query("SQL injection", 3).await.map(|r| r.len())
            }
        }));
    }
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome == 0 || outcome == 3);
    }
}

fn brute_force(index: &FlatIndex, query: &[f32]) -> Vec<(usize, f32)> {
    let mut all: Vec<(usize, f32)> = index
        .vectors()
        .chunks_exact(index.dimension())
        .enumerate()
        .map(|(i, row)| (i, ragguard::services::vector_index::flat::squared_l2(query, row)))
        .collect();
    all.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    all
}

proptest! {
    #[test]
    fn prop_search_is_bounded_sorted_and_exact(
        rows in prop::collection::vec(prop::collection::vec(-10.0_f32..10.0, 4), 0..40),
        query in prop::collection::vec(-10.0_f32..10.0, 4),
        top_k in 1_usize..12,
    ) {
        let documents = (0..rows.len()).map(|i| Document::new(i.to_string(), "t")).collect();
        let index = FlatIndex::new(4, rows.concat(), documents).unwrap();

        let hits = index.search(&query, top_k);
        prop_assert!(hits.len() <= top_k);
        prop_assert_eq!(hits.len(), top_k.min(rows.len()));
        prop_assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
        prop_assert!(hits.iter().all(|(_, d)| d.is_finite() && *d >= 0.0));

        let expected: Vec<(usize, f32)> = brute_force(&index, &query).into_iter().take(top_k).collect();
        prop_assert_eq!(hits, expected);
    }

    #[test]
    fn prop_query_ordering_over_text(
        texts in prop::collection::vec("[a-z]{1,8}( [a-z]{1,8}){0,6}", 1..20),
        question in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
        top_k in 1_usize..8,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let result = runtime.block_on(async {
            let index = vector_index();
            let documents = texts
                .iter()
                .enumerate()
                .map(|(i, t)| Document::new(format!("d{i}"), t.clone()))
                .collect();
            index.build(documents).await.unwrap();
            index.query(&question, top_k).await.unwrap()
        });

        prop_assert!(result.len() <= top_k);
        prop_assert!(result.is_sorted_by_distance());
        let ranks: Vec<usize> = result.iter().map(|h| h.rank).collect();
        prop_assert_eq!(ranks, (0..result.len()).collect::<Vec<_>>());
    }
}
