//! Deterministic doubles for [`Embedder`] and [`Generator`].
//!
//! Available in unit tests and, for downstream crates, behind the `mock`
//! feature. Both count calls so tests can assert that a request was (or
//! was not) forwarded to the model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::Embedder;
use crate::error::RagError;
use crate::generation::Generator;

/// Hashed bag-of-words embedder.
///
/// Each lowercase alphanumeric token increments one bucket, so texts that
/// share vocabulary score higher under cosine similarity.
pub struct MockEmbedder {
    name: String,
    dims: usize,
    fail: bool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            name: "mock-embedder".to_string(),
            dims,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Every call returns [`RagError::EmbeddingFailure`].
    pub fn failing(dims: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(dims)
        }
    }

    /// Number of `embed_batch` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        if self.dims == 0 {
            return v;
        }
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bytes) % self.dims as u64) as usize;
            v[bucket] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RagError::EmbeddingFailure(
                "mock embedder configured to fail".to_string(),
            ));
        }
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

enum Behavior {
    Reply(String),
    Fail(String),
    Hang,
}

/// Generator that records prompts and replies from a script.
pub struct MockGenerator {
    behavior: Behavior,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Always answer `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(response.into()))
    }

    /// Always fail with [`RagError::ModelFailure`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    /// Never complete. Use to exercise caller-side timeouts.
    pub fn hanging() -> Self {
        Self::with_behavior(Behavior::Hang)
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn invoke(&self, prompt: &str) -> Result<String, RagError> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        match &self.behavior {
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::Fail(msg) => Err(RagError::ModelFailure(msg.clone())),
            Behavior::Hang => std::future::pending().await,
        }
    }
}
