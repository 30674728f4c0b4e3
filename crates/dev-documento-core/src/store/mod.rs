//! Corpus-scoped vector store abstraction.
//!
//! The [`VectorStore`] trait defines the two operations the pipeline needs:
//! whole-corpus replacement at ingestion time and top-k similarity search
//! at query time. Backends: [`memory::InMemoryStore`] here, and the
//! persistent SQLite store in the app crate.
//!
//! Implementations must be `Send + Sync` to work with async runtimes, and
//! must make [`upsert_corpus`](VectorStore::upsert_corpus) atomic from a
//! concurrent reader's point of view.

pub mod memory;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::cosine_similarity;
use crate::error::RagError;
use crate::models::{CollectionInfo, Corpus, EmbeddingRecord, SearchHit};

/// Abstract storage backend holding one collection per [`Corpus`].
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_corpus`](VectorStore::upsert_corpus) | Replace a corpus collection |
/// | [`search`](VectorStore::search) | Top-k cosine similarity search |
/// | [`collection_info`](VectorStore::collection_info) | Ingestion metadata |
/// | [`close`](VectorStore::close) | Flush and release resources |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace (or create) the collection for `corpus` with `records`.
    ///
    /// Readers observe either the previous collection or the new one, never
    /// a partial write. All records must share one dimensionality.
    async fn upsert_corpus(
        &self,
        corpus: Corpus,
        embedder: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<CollectionInfo, RagError>;

    /// Return up to `k` records by descending cosine similarity, ties in
    /// insertion order.
    ///
    /// `embedder` names the model that produced `query_vec`. It is compared
    /// against the same collection snapshot that is scored, so a concurrent
    /// re-ingestion cannot slip between the check and the read.
    ///
    /// # Errors
    ///
    /// - [`RagError::StoreNotFound`] if `corpus` was never ingested.
    /// - [`RagError::EmbedderMismatch`] if it was ingested with another model.
    /// - [`RagError::DimensionMismatch`] if `query_vec` has the wrong length.
    async fn search(
        &self,
        corpus: Corpus,
        embedder: &str,
        query_vec: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>, RagError>;

    /// Metadata for an ingested corpus, `None` if never ingested.
    async fn collection_info(&self, corpus: Corpus) -> Result<Option<CollectionInfo>, RagError>;

    /// Release connections. Called once at shutdown.
    async fn close(&self) {}
}

/// Build the metadata row for a new collection, validating that every
/// record shares one dimensionality.
pub fn describe_collection(
    corpus: Corpus,
    embedder: &str,
    records: &[EmbeddingRecord],
) -> Result<CollectionInfo, RagError> {
    let dims = records.first().map(|r| r.vector.len()).unwrap_or(0);
    if let Some(bad) = records.iter().find(|r| r.vector.len() != dims) {
        return Err(RagError::DimensionMismatch {
            corpus,
            expected: dims,
            actual: bad.vector.len(),
        });
    }
    if let Some(stray) = records.iter().find(|r| r.chunk.corpus != corpus) {
        return Err(RagError::store(anyhow::anyhow!(
            "record from '{}' corpus cannot be stored in '{}'",
            stray.chunk.corpus,
            corpus
        )));
    }

    Ok(CollectionInfo {
        corpus,
        embedder: embedder.to_string(),
        dims,
        record_count: records.len(),
        fingerprint: fingerprint(records),
        ingested_at: chrono::Utc::now().timestamp(),
    })
}

/// SHA-256 over record texts and vector bytes, in order.
///
/// Two ingestion runs over unchanged inputs with the same embedder produce
/// the same fingerprint.
pub fn fingerprint(records: &[EmbeddingRecord]) -> String {
    let mut hasher = Sha256::new();
    for r in records {
        hasher.update(r.chunk.source_identifier.as_bytes());
        hasher.update((r.chunk.offset as u64).to_le_bytes());
        hasher.update(r.chunk.text.as_bytes());
        for v in &r.vector {
            hasher.update(v.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Reject a query made with a different embedder than the collection's.
pub fn check_embedder(info: &CollectionInfo, embedder: &str) -> Result<(), RagError> {
    if info.embedder != embedder {
        return Err(RagError::EmbedderMismatch {
            corpus: info.corpus,
            ingested: info.embedder.clone(),
            current: embedder.to_string(),
        });
    }
    Ok(())
}

/// Reject a query vector whose length differs from the collection's.
///
/// Empty collections (`dims == 0`) accept any query.
pub fn check_query_dims(info: &CollectionInfo, query_vec: &[f32]) -> Result<(), RagError> {
    if info.dims != 0 && info.dims != query_vec.len() {
        return Err(RagError::DimensionMismatch {
            corpus: info.corpus,
            expected: info.dims,
            actual: query_vec.len(),
        });
    }
    Ok(())
}

/// Score `vectors` against `query` and return the `k` best as
/// `(position, score)`, descending, ties in input order.
pub fn top_k<'a>(
    query: &[f32],
    vectors: impl IntoIterator<Item = &'a [f32]>,
    k: usize,
) -> Vec<(usize, f32)> {
    if k == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(usize, f32)> = vectors
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i, cosine_similarity(query, v)))
        .collect();
    // Stable sort keeps insertion order among equal scores.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);
    scored
}
