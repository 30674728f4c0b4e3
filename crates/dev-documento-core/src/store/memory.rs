//! In-memory [`VectorStore`] implementation for tests and ephemeral runs.
//!
//! Each corpus maps to an immutable [`Collection`] behind an `Arc`. Ingestion
//! builds a complete new collection and swaps it in under the write lock, so
//! searches always see one whole collection. Search is brute-force cosine
//! similarity.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::RagError;
use crate::models::{CollectionInfo, Corpus, EmbeddingRecord, SearchHit};

use super::{check_embedder, check_query_dims, describe_collection, top_k, VectorStore};

struct Collection {
    info: CollectionInfo,
    records: Vec<EmbeddingRecord>,
}

/// Volatile store; contents vanish when dropped.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Corpus, Arc<Collection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, corpus: Corpus) -> Option<Arc<Collection>> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&corpus)
            .cloned()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert_corpus(
        &self,
        corpus: Corpus,
        embedder: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<CollectionInfo, RagError> {
        let info = describe_collection(corpus, embedder, &records)?;
        let collection = Arc::new(Collection {
            info: info.clone(),
            records,
        });
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(corpus, collection);
        Ok(info)
    }

    async fn search(
        &self,
        corpus: Corpus,
        embedder: &str,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>, RagError> {
        let collection = self
            .collection(corpus)
            .ok_or(RagError::StoreNotFound(corpus))?;
        check_embedder(&collection.info, embedder)?;
        check_query_dims(&collection.info, query_vec)?;

        let ranked = top_k(
            query_vec,
            collection.records.iter().map(|r| r.vector.as_slice()),
            k,
        );
        Ok(ranked
            .into_iter()
            .map(|(i, score)| SearchHit {
                chunk: collection.records[i].chunk.clone(),
                score,
            })
            .collect())
    }

    async fn collection_info(&self, corpus: Corpus) -> Result<Option<CollectionInfo>, RagError> {
        Ok(self.collection(corpus).map(|c| c.info.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn record(corpus: Corpus, text: &str, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord::new(
            Chunk {
                text: text.to_string(),
                source_identifier: format!("{}.txt", text),
                offset: 0,
                chunk_index: 0,
                corpus,
            },
            vector,
        )
    }

    #[tokio::test]
    async fn test_search_unknown_corpus() {
        let store = InMemoryStore::new();
        let err = store.search(Corpus::Code, "mock", &[1.0], 3).await.unwrap_err();
        assert!(matches!(err, RagError::StoreNotFound(Corpus::Code)));
        assert!(store.collection_info(Corpus::Code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_search_ranked() {
        let store = InMemoryStore::new();
        let records = vec![
            record(Corpus::Code, "y", vec![0.0, 1.0]),
            record(Corpus::Code, "x", vec![1.0, 0.0]),
            record(Corpus::Code, "xy", vec![1.0, 1.0]),
        ];
        let info = store
            .upsert_corpus(Corpus::Code, "mock", records)
            .await
            .unwrap();
        assert_eq!(info.record_count, 3);
        assert_eq!(info.dims, 2);

        let hits = store.search(Corpus::Code, "mock", &[1.0, 0.0], 2).await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["x", "xy"]);
    }

    #[tokio::test]
    async fn test_k_larger_than_collection() {
        let store = InMemoryStore::new();
        store
            .upsert_corpus(Corpus::Code, "mock", vec![record(Corpus::Code, "a", vec![1.0])])
            .await
            .unwrap();
        let hits = store.search(Corpus::Code, "mock", &[1.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_isolates_corpora() {
        let store = InMemoryStore::new();
        store
            .upsert_corpus(
                Corpus::Code,
                "mock",
                vec![record(Corpus::Code, "old", vec![1.0, 0.0])],
            )
            .await
            .unwrap();
        store
            .upsert_corpus(
                Corpus::Practices,
                "mock",
                vec![record(Corpus::Practices, "rule", vec![1.0, 0.0])],
            )
            .await
            .unwrap();
        store
            .upsert_corpus(
                Corpus::Code,
                "mock",
                vec![record(Corpus::Code, "new", vec![1.0, 0.0])],
            )
            .await
            .unwrap();

        let code = store.search(Corpus::Code, "mock", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(code.len(), 1);
        assert_eq!(code[0].chunk.text, "new");

        let practices = store
            .search(Corpus::Practices, "mock", &[1.0, 0.0], 5)
            .await
            .unwrap();
        assert_eq!(practices[0].chunk.text, "rule");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_on_search() {
        let store = InMemoryStore::new();
        store
            .upsert_corpus(
                Corpus::Code,
                "mock",
                vec![record(Corpus::Code, "a", vec![1.0, 0.0, 0.0])],
            )
            .await
            .unwrap();
        let err = store.search(Corpus::Code, "mock", &[1.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_collection_searches_empty() {
        let store = InMemoryStore::new();
        let info = store
            .upsert_corpus(Corpus::Practices, "mock", Vec::new())
            .await
            .unwrap();
        assert_eq!(info.dims, 0);
        let hits = store.search(Corpus::Practices, "mock", &[0.5, 0.5], 4).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_other_embedder() {
        let store = InMemoryStore::new();
        store
            .upsert_corpus(Corpus::Code, "model-a", vec![record(Corpus::Code, "a", vec![1.0])])
            .await
            .unwrap();
        let err = store
            .search(Corpus::Code, "model-b", &[1.0], 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::EmbedderMismatch { ref ingested, ref current, .. }
                if ingested == "model-a" && current == "model-b"
        ));
    }

    fn batch(prefix: &str, n: usize) -> Vec<EmbeddingRecord> {
        (0..n)
            .map(|i| record(Corpus::Code, &format!("{}-{}", prefix, i), vec![1.0, 0.0]))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_search_during_reingest_sees_one_collection() {
        const OLD: usize = 30;
        const NEW: usize = 50;
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_corpus(Corpus::Code, "mock", batch("old", OLD))
            .await
            .unwrap();

        let reader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..200 {
                    let hits = store
                        .search(Corpus::Code, "mock", &[1.0, 0.0], 100)
                        .await
                        .unwrap();
                    let old = hits
                        .iter()
                        .filter(|h| h.chunk.text.starts_with("old-"))
                        .count();
                    seen.push((hits.len(), old));
                    tokio::task::yield_now().await;
                }
                seen
            })
        };

        for _ in 0..20 {
            store
                .upsert_corpus(Corpus::Code, "mock", batch("new", NEW))
                .await
                .unwrap();
            tokio::task::yield_now().await;
            store
                .upsert_corpus(Corpus::Code, "mock", batch("old", OLD))
                .await
                .unwrap();
            tokio::task::yield_now().await;
        }

        for (len, old) in reader.await.unwrap() {
            assert!(
                (len, old) == (OLD, OLD) || (len, old) == (NEW, 0),
                "mixed collection: {} hits, {} old",
                len,
                old
            );
        }
    }
}
