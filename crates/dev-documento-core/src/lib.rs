//! # dev-documento core
//!
//! Transport-free logic for the dev-documento assistant: data models,
//! overlapping text chunking, the embedder and generative-model traits,
//! the corpus-scoped vector store abstraction, prompt rendering, and
//! retrieval context assembly.
//!
//! This crate has no tokio, sqlx, HTTP, or filesystem dependencies. The
//! `dev-documento` application crate supplies concrete embedders, models,
//! and the persistent store.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod generation;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod store;

pub use error::RagError;
pub use models::{Chunk, CollectionInfo, Corpus, Document, EmbeddingRecord, SearchHit};
