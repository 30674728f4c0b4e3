//! Query orchestration: docstring generation and code review.
//!
//! Both requests follow the same path: validate the input, check that
//! every dependency is ready, embed the code once, retrieve context,
//! render the prompt, and call the model under a timeout. Model output is
//! returned unmodified.

use anyhow::Context;
use std::io::Read;
use std::path::Path;

use dev_documento_core::retrieval::{join_context, retrieve};
use dev_documento_core::{Corpus, RagError};

use crate::config::Config;
use crate::context::AppContext;

fn validate_code(code: &str) -> Result<(), RagError> {
    if code.trim().is_empty() {
        return Err(RagError::BadRequest(
            "'code' must be a non-empty string".to_string(),
        ));
    }
    Ok(())
}

async fn invoke_with_timeout(ctx: &AppContext, prompt: &str) -> Result<String, RagError> {
    let generator = ctx.generator.get()?;
    tokio::time::timeout(ctx.model_timeout, generator.invoke(prompt))
        .await
        .map_err(|_| RagError::ModelTimeout(ctx.model_timeout.as_secs()))?
}

/// Generate a docstring for `code`, grounded in the top code chunks.
pub async fn document_request(ctx: &AppContext, code: &str) -> Result<String, RagError> {
    validate_code(code)?;
    let embedder = ctx.embedder.get()?;
    let store = ctx.store.get()?;
    ctx.generator.get()?;

    let query = embedder.embed(code).await?;
    let hits = retrieve(
        store.as_ref(),
        embedder.model_name(),
        Corpus::Code,
        &query,
        ctx.retrieval.document_k,
    )
    .await?;
    tracing::debug!(hits = hits.len(), "document request context retrieved");

    let context = join_context(&hits);
    let prompt = ctx
        .documentation_prompt
        .render(&[("context", &context), ("code", code)])?;
    invoke_with_timeout(ctx, &prompt).await
}

/// Review `code` against the project's code and best-practice corpora.
///
/// An empty practices collection yields an empty `{practices}` section;
/// the model is still called.
pub async fn review_request(ctx: &AppContext, code: &str) -> Result<String, RagError> {
    validate_code(code)?;
    let embedder = ctx.embedder.get()?;
    let store = ctx.store.get()?;
    ctx.generator.get()?;

    let query = embedder.embed(code).await?;
    let (code_hits, practice_hits) = tokio::try_join!(
        retrieve(
            store.as_ref(),
            embedder.model_name(),
            Corpus::Code,
            &query,
            ctx.retrieval.review_code_k,
        ),
        retrieve(
            store.as_ref(),
            embedder.model_name(),
            Corpus::Practices,
            &query,
            ctx.retrieval.review_practices_k,
        ),
    )?;
    tracing::debug!(
        code_hits = code_hits.len(),
        practice_hits = practice_hits.len(),
        "review request context retrieved"
    );

    let context = join_context(&code_hits);
    let practices = join_context(&practice_hits);
    let prompt = ctx.review_prompt.render(&[
        ("practices", &practices),
        ("context", &context),
        ("code", code),
    ])?;
    invoke_with_timeout(ctx, &prompt).await
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read code from stdin")?;
            Ok(buf)
        }
    }
}

/// `devdoc document [FILE]`.
pub async fn run_document(config: &Config, file: Option<&Path>) -> anyhow::Result<()> {
    let code = read_input(file)?;
    validate_code(&code)?;
    let ctx = AppContext::initialize(config).await?;
    let result = document_request(&ctx, &code).await;
    ctx.shutdown().await;
    println!("{}", result?);
    Ok(())
}

/// `devdoc review [FILE]`.
pub async fn run_review(config: &Config, file: Option<&Path>) -> anyhow::Result<()> {
    let code = read_input(file)?;
    validate_code(&code)?;
    let ctx = AppContext::initialize(config).await?;
    let result = review_request(&ctx, &code).await;
    ctx.shutdown().await;
    println!("{}", result?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use dev_documento_core::embedding::Embedder;
    use dev_documento_core::mock::{MockEmbedder, MockGenerator};
    use dev_documento_core::store::memory::InMemoryStore;
    use dev_documento_core::store::VectorStore;
    use dev_documento_core::{Chunk, EmbeddingRecord};

    use crate::context::Dependency;

    async fn seed(store: &InMemoryStore, embedder: &MockEmbedder, corpus: Corpus, texts: &[&str]) {
        let mut records = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let chunk = Chunk {
                text: text.to_string(),
                source_identifier: format!("file{}", i),
                offset: 0,
                chunk_index: 0,
                corpus,
            };
            let vector = embedder.embed(text).await.unwrap();
            records.push(EmbeddingRecord::new(chunk, vector));
        }
        store
            .upsert_corpus(corpus, embedder.model_name(), records)
            .await
            .unwrap();
    }

    struct Fixture {
        embedder: Arc<MockEmbedder>,
        store: Arc<InMemoryStore>,
        generator: Arc<MockGenerator>,
    }

    impl Fixture {
        fn new(generator: MockGenerator) -> Self {
            Self {
                embedder: Arc::new(MockEmbedder::new(64)),
                store: Arc::new(InMemoryStore::new()),
                generator: Arc::new(generator),
            }
        }

        fn ctx(&self) -> AppContext {
            AppContext::from_parts(
                self.embedder.clone(),
                self.store.clone(),
                self.generator.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_empty_code_is_bad_request_without_calls() {
        let f = Fixture::new(MockGenerator::new("doc"));
        let ctx = f.ctx();
        for input in ["", "   \n\t"] {
            let err = document_request(&ctx, input).await.unwrap_err();
            assert!(matches!(err, RagError::BadRequest(_)));
            let err = review_request(&ctx, input).await.unwrap_err();
            assert!(matches!(err, RagError::BadRequest(_)));
        }
        assert_eq!(f.embedder.calls(), 0);
        assert_eq!(f.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_document_uses_top_three_code_chunks() {
        let f = Fixture::new(MockGenerator::new("\"\"\"Adds two numbers.\"\"\""));
        seed(
            &f.store,
            &f.embedder,
            Corpus::Code,
            &[
                "def add(a, b): return a + b",
                "def add_many(nums): return sum(nums)",
                "def subtract(a, b): return a - b",
                "class Config: pass",
                "import os",
            ],
        )
        .await;

        let out = document_request(&f.ctx(), "def add(a, b): return a+b")
            .await
            .unwrap();
        assert_eq!(out, "\"\"\"Adds two numbers.\"\"\"");

        let prompts = f.generator.prompts();
        assert_eq!(prompts.len(), 1);
        let prompt = &prompts[0];
        assert!(prompt.contains("CODE:\ndef add(a, b): return a+b\n"));
        assert!(prompt.contains("def add(a, b): return a + b"));
        assert_eq!(prompt.matches("\n---\n").count(), 2);
    }

    #[tokio::test]
    async fn test_review_with_empty_practices() {
        let f = Fixture::new(MockGenerator::new("## Review"));
        seed(&f.store, &f.embedder, Corpus::Code, &["def add(a, b): return a + b"]).await;
        seed(&f.store, &f.embedder, Corpus::Practices, &[]).await;

        let out = review_request(&f.ctx(), "def add(a, b): return a+b")
            .await
            .unwrap();
        assert_eq!(out, "## Review");
        let prompt = &f.generator.prompts()[0];
        assert!(prompt.contains("BEST PRACTICES:\n\n\nCODE CONTEXT:\ndef add(a, b): return a + b"));
    }

    #[tokio::test]
    async fn test_review_joins_each_corpus_separately() {
        let f = Fixture::new(MockGenerator::new("ok"));
        seed(&f.store, &f.embedder, Corpus::Code, &["def a(): pass", "def b(): pass", "def c(): pass"]).await;
        seed(
            &f.store,
            &f.embedder,
            Corpus::Practices,
            &["Use docstrings.", "Prefer pure functions.", "Name things well.", "Avoid globals.", "Test edge cases."],
        )
        .await;

        review_request(&f.ctx(), "def a(): pass").await.unwrap();
        let prompt = &f.generator.prompts()[0];
        let practices = prompt
            .split("BEST PRACTICES:\n")
            .nth(1)
            .and_then(|rest| rest.split("\n\nCODE CONTEXT:").next())
            .unwrap();
        assert_eq!(practices.matches("\n---\n").count(), 3);
        let context = prompt
            .split("CODE CONTEXT:\n")
            .nth(1)
            .and_then(|rest| rest.split("\n\nCODE TO REVIEW:").next())
            .unwrap();
        assert_eq!(context.matches("\n---\n").count(), 1);
    }

    #[tokio::test]
    async fn test_never_ingested_code_is_store_not_found() {
        let f = Fixture::new(MockGenerator::new("doc"));
        let err = document_request(&f.ctx(), "x = 1").await.unwrap_err();
        assert!(matches!(err, RagError::StoreNotFound(Corpus::Code)));
        assert_eq!(f.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_dependency_is_not_ready() {
        let f = Fixture::new(MockGenerator::new("doc"));
        let mut ctx = f.ctx();
        ctx.generator = Dependency::Unavailable("generative model unavailable: refused".to_string());
        let err = document_request(&ctx, "x = 1").await.unwrap_err();
        assert!(matches!(err, RagError::NotReady(_)));
        assert_eq!(f.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_embedder_mismatch() {
        let f = Fixture::new(MockGenerator::new("doc"));
        let other = MockEmbedder::new(64).with_name("other-embedder");
        seed(&f.store, &other, Corpus::Code, &["x = 1"]).await;
        let err = document_request(&f.ctx(), "x = 1").await.unwrap_err();
        assert!(matches!(err, RagError::EmbedderMismatch { .. }));
    }

    #[tokio::test]
    async fn test_model_timeout() {
        let f = Fixture::new(MockGenerator::hanging());
        seed(&f.store, &f.embedder, Corpus::Code, &["x = 1"]).await;
        let mut ctx = f.ctx();
        ctx.model_timeout = Duration::from_millis(50);
        let err = document_request(&ctx, "x = 1").await.unwrap_err();
        assert!(matches!(err, RagError::ModelTimeout(_)));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let f = Fixture::new(MockGenerator::failing("connection refused"));
        seed(&f.store, &f.embedder, Corpus::Code, &["x = 1"]).await;
        let err = document_request(&f.ctx(), "x = 1").await.unwrap_err();
        assert!(matches!(err, RagError::ModelFailure(_)));
    }
}
