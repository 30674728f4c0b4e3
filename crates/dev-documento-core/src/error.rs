//! Error taxonomy shared by ingestion, retrieval, and the HTTP layer.
//!
//! Partial ingestion is not an error: skipped files are reported
//! through `IngestReport::failures` in the application crate, not raised.

use crate::models::Corpus;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// The embedder was unreachable or returned unusable output.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// A query targeted a corpus that has never been ingested.
    #[error("no vector store has been ingested for corpus '{0}'")]
    StoreNotFound(Corpus),

    /// Zero documents were found or loaded; the store was not touched.
    #[error("ingestion failed: {0}")]
    IngestionFailed(String),

    /// A dependency failed to initialize at startup.
    #[error("service not ready: {0}")]
    NotReady(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("generative model timed out after {0}s")]
    ModelTimeout(u64),

    #[error("generative model failed: {0}")]
    ModelFailure(String),

    #[error(
        "dimension mismatch for corpus '{corpus}': store holds {expected}-d vectors, got {actual}-d"
    )]
    DimensionMismatch {
        corpus: Corpus,
        expected: usize,
        actual: usize,
    },

    #[error(
        "embedder mismatch for corpus '{corpus}': ingested with '{ingested}', querying with '{current}'"
    )]
    EmbedderMismatch {
        corpus: Corpus,
        ingested: String,
        current: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("prompt rendering failed: {0}")]
    Prompt(String),

    #[error("vector store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl RagError {
    /// Wrap a backend error (SQL, I/O) as [`RagError::Store`].
    pub fn store(err: impl Into<anyhow::Error>) -> Self {
        RagError::Store(err.into())
    }
}
