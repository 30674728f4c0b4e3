//! Retrieval helpers shared by the query paths.
//!
//! [`retrieve`] runs the top-k search for the embedder now in use; the
//! store rejects a corpus ingested with another one. [`join_context`] turns
//! hits into the block of text that fills a prompt placeholder.

use serde::{Deserialize, Serialize};

use crate::error::RagError;
use crate::models::{Corpus, SearchHit};
use crate::store::VectorStore;

/// Separator placed between retrieved chunk texts.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Number of hits pulled per request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalParams {
    /// Code hits for a documentation request.
    pub document_k: usize,
    /// Code hits for a review request.
    pub review_code_k: usize,
    /// Practice hits for a review request.
    pub review_practices_k: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            document_k: 3,
            review_code_k: 2,
            review_practices_k: 4,
        }
    }
}

/// Concatenate hit texts in rank order. No hits gives an empty string.
pub fn join_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Top-`k` hits for `query_vec` from `corpus`.
///
/// # Errors
///
/// - [`RagError::StoreNotFound`] if the corpus was never ingested.
/// - [`RagError::EmbedderMismatch`] if it was ingested with another embedder.
/// - [`RagError::DimensionMismatch`] if `query_vec` has the wrong length.
///
/// All three are decided by the store against the snapshot it scores.
pub async fn retrieve(
    store: &dyn VectorStore,
    embedder: &str,
    corpus: Corpus,
    query_vec: &[f32],
    k: usize,
) -> Result<Vec<SearchHit>, RagError> {
    store.search(corpus, embedder, query_vec, k).await
}
