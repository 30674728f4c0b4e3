//! Embedder trait and vector utilities.
//!
//! Defines the [`Embedder`] trait used by both the ingestion and the query
//! paths, plus pure helpers for vector serialization and similarity.
//!
//! Concrete embedders (fastembed, Ollama, OpenAI) live in the
//! `dev-documento` app crate. The same embedder configuration must be used
//! to ingest and to query a given store; stores record the embedder's
//! [`model_name`](Embedder::model_name) so mismatches are detected.

use async_trait::async_trait;

use crate::error::RagError;

/// Text → fixed-dimension vector.
///
/// Implementations are pass-throughs to an external model: no caching,
/// no retries. Failures surface as [`RagError::EmbeddingFailure`].
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier recorded in store metadata (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;

    /// Dimensionality of every vector this embedder produces.
    fn dims(&self) -> usize;

    /// Embed a batch of texts. The output has the same length and order as
    /// the input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::EmbeddingFailure("empty embedding response".to_string()))
    }
}

/// Check that a backend answered with one `dims`-long vector per input.
pub fn check_batch(
    expected_len: usize,
    dims: usize,
    vectors: &[Vec<f32>],
) -> Result<(), RagError> {
    if vectors.len() != expected_len {
        return Err(RagError::EmbeddingFailure(format!(
            "expected {} vectors, got {}",
            expected_len,
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        return Err(RagError::EmbeddingFailure(format!(
            "expected {}-d vectors, got {}-d",
            dims,
            bad.len()
        )));
    }
    Ok(())
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// # Example
///
/// ```rust
/// use dev_documento_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a BLOB produced by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or a
/// zero-magnitude vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
