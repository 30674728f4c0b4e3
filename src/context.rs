//! Shared, read-only application state.
//!
//! [`AppContext`] is built once at startup and handed to every request
//! handler. Startup never aborts because the embedder, store, or model
//! could not be initialized: each failure is logged and kept as a
//! [`Dependency::Unavailable`] so requests fail with
//! [`RagError::NotReady`] instead.

use std::sync::Arc;
use std::time::Duration;

use dev_documento_core::embedding::Embedder;
use dev_documento_core::generation::Generator;
use dev_documento_core::prompt::PromptTemplate;
use dev_documento_core::retrieval::RetrievalParams;
use dev_documento_core::store::VectorStore;
use dev_documento_core::RagError;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::llm::create_generator;
use crate::sqlite_store::SqliteStore;

/// A collaborator that either initialized or failed with a reason.
pub enum Dependency<T: ?Sized> {
    Ready(Arc<T>),
    Unavailable(String),
}

impl<T: ?Sized> Dependency<T> {
    fn from_result(name: &str, result: anyhow::Result<Arc<T>>) -> Self {
        match result {
            Ok(dep) => Dependency::Ready(dep),
            Err(e) => {
                tracing::warn!("{} unavailable: {:#}", name, e);
                Dependency::Unavailable(format!("{} unavailable: {:#}", name, e))
            }
        }
    }

    /// The dependency, or [`RagError::NotReady`].
    pub fn get(&self) -> Result<&Arc<T>, RagError> {
        match self {
            Dependency::Ready(dep) => Ok(dep),
            Dependency::Unavailable(reason) => Err(RagError::NotReady(reason.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Dependency::Ready(_))
    }
}

pub struct AppContext {
    pub embedder: Dependency<dyn Embedder>,
    pub store: Dependency<dyn VectorStore>,
    pub generator: Dependency<dyn Generator>,
    pub retrieval: RetrievalParams,
    pub documentation_prompt: PromptTemplate,
    pub review_prompt: PromptTemplate,
    pub model_timeout: Duration,
}

impl AppContext {
    /// Build every dependency from `config`.
    ///
    /// Only invalid prompt templates are fatal; collaborators that fail to
    /// come up are recorded as unavailable.
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        let documentation_prompt = config.prompts.documentation_template()?;
        let review_prompt = config.prompts.review_template()?;

        let embedder = Dependency::from_result("embedder", create_embedder(&config.embedding).await);
        let store = Dependency::from_result(
            "vector store",
            SqliteStore::open(&config.store.dir)
                .await
                .map(|s| Arc::new(s) as Arc<dyn VectorStore>),
        );
        let generator = Dependency::from_result("generative model", create_generator(&config.llm));

        Ok(Self {
            embedder,
            store,
            generator,
            retrieval: config.retrieval,
            documentation_prompt,
            review_prompt,
            model_timeout: Duration::from_secs(config.llm.timeout_secs),
        })
    }

    /// Assemble a context from ready collaborators, with default prompts,
    /// k values, and timeout.
    pub fn from_parts(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder: Dependency::Ready(embedder),
            store: Dependency::Ready(store),
            generator: Dependency::Ready(generator),
            retrieval: RetrievalParams::default(),
            documentation_prompt: PromptTemplate::documentation(),
            review_prompt: PromptTemplate::review(),
            model_timeout: Duration::from_secs(120),
        }
    }

    /// Close the store. Call once, after the last request.
    pub async fn shutdown(&self) {
        if let Dependency::Ready(store) = &self.store {
            store.close().await;
        }
    }
}
