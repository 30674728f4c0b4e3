//! Core data models flowing through ingestion and retrieval.
//!
//! A [`Document`] is loaded from a source file, split into overlapping
//! [`Chunk`]s, embedded into [`EmbeddingRecord`]s, and persisted in a
//! corpus-scoped store. Queries come back as [`SearchHit`]s.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the two independent content partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corpus {
    /// Source code of the project being assisted.
    Code,
    /// Best-practice documents for the project's language.
    Practices,
}

impl Corpus {
    pub const ALL: [Corpus; 2] = [Corpus::Code, Corpus::Practices];

    pub fn as_str(&self) -> &'static str {
        match self {
            Corpus::Code => "code",
            Corpus::Practices => "practices",
        }
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Corpus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Corpus::Code),
            "practices" => Ok(Corpus::Practices),
            other => Err(format!(
                "unknown corpus '{}': expected 'code' or 'practices'",
                other
            )),
        }
    }
}

/// A loaded source file. Discarded once chunked.
#[derive(Debug, Clone)]
pub struct Document {
    pub source_identifier: String,
    pub raw_text: String,
    pub corpus: Corpus,
}

impl Document {
    pub fn new(source_identifier: impl Into<String>, raw_text: impl Into<String>, corpus: Corpus) -> Self {
        Self {
            source_identifier: source_identifier.into(),
            raw_text: raw_text.into(),
            corpus,
        }
    }
}

/// A contiguous, length-bounded slice of a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_identifier: String,
    /// Start position in the source text, in characters.
    pub offset: usize,
    /// Position of this chunk within its document, starting at 0.
    pub chunk_index: usize,
    pub corpus: Corpus,
}

/// A chunk paired with its embedding vector, as persisted in a store.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

impl EmbeddingRecord {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { vector, chunk }
    }
}

/// A retrieved chunk and its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Metadata describing one ingested corpus collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub corpus: Corpus,
    /// Identifier of the embedder used at ingestion time.
    pub embedder: String,
    /// Vector dimensionality shared by every record (0 for an empty collection).
    pub dims: usize,
    pub record_count: usize,
    /// SHA-256 over record texts and vectors, in insertion order.
    pub fingerprint: String,
    /// Unix timestamp (seconds) of the ingestion that produced this collection.
    pub ingested_at: i64,
}
