//! Ingestion pipeline orchestration.
//!
//! Coordinates one batch run for a corpus: source walk → parallel load →
//! chunking → batched embedding → one whole-corpus store replacement.
//! Per-file problems are recorded in the report and skipped; a run that
//! finds or loads nothing fails without touching the store.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dev_documento_core::chunk::{split, ChunkConfig};
use dev_documento_core::embedding::{check_batch, Embedder};
use dev_documento_core::store::VectorStore;
use dev_documento_core::{CollectionInfo, Corpus, Document, EmbeddingRecord, RagError};

use crate::config::Config;
use crate::connector_fs::{DocumentSource, FsSource, SourceEntry, SourceFilter};
use crate::embedding::create_embedder;
use crate::extract::load_text;
use crate::sqlite_store::SqliteStore;

/// A file that was found but not ingested.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDocument {
    pub source_identifier: String,
    pub reason: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub corpus: Corpus,
    pub documents_found: usize,
    pub documents_loaded: usize,
    pub chunks_created: usize,
    pub failures: Vec<SkippedDocument>,
    pub collection: CollectionInfo,
}

/// Replace `corpus` in `store` with the chunks of every loadable document
/// in `source`.
///
/// # Errors
///
/// - [`RagError::IngestionFailed`] when zero documents are found or loaded.
/// - [`RagError::EmbeddingFailure`] if any batch fails; the store is untouched.
/// - [`RagError::InvalidConfig`] for a bad `chunking`.
pub async fn ingest(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    corpus: Corpus,
    source: Arc<dyn DocumentSource>,
    chunking: ChunkConfig,
    batch_size: usize,
) -> Result<IngestReport, RagError> {
    chunking.validate()?;
    let listing = list_documents(corpus, &source).await?;
    ingest_listing(store, embedder, corpus, source, listing, chunking, batch_size).await
}

/// Entries a source walk produced; walk errors are kept as skips.
struct Listing {
    entries: Vec<SourceEntry>,
    failures: Vec<SkippedDocument>,
}

/// Walk `source` on the blocking pool. Fails when nothing is found.
async fn list_documents(
    corpus: Corpus,
    source: &Arc<dyn DocumentSource>,
) -> Result<Listing, RagError> {
    let mut failures = Vec::new();

    let walked = {
        let source = Arc::clone(source);
        tokio::task::spawn_blocking(move || source.entries().collect::<Vec<_>>())
            .await
            .map_err(|e| RagError::IngestionFailed(format!("source walk aborted: {}", e)))?
    };

    let mut entries = Vec::with_capacity(walked.len());
    for item in walked {
        match item {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(source = %source.describe(), "walk error: {:#}", e);
                failures.push(SkippedDocument {
                    source_identifier: source.describe(),
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    if entries.is_empty() {
        return Err(RagError::IngestionFailed(format!(
            "no {} documents found in {}",
            corpus,
            source.describe()
        )));
    }
    Ok(Listing { entries, failures })
}

async fn ingest_listing(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    corpus: Corpus,
    source: Arc<dyn DocumentSource>,
    listing: Listing,
    chunking: ChunkConfig,
    batch_size: usize,
) -> Result<IngestReport, RagError> {
    let Listing {
        entries,
        mut failures,
    } = listing;
    let documents_found = entries.len();

    // Load in parallel on the blocking pool; awaiting in order keeps source order.
    let handles: Vec<_> = entries
        .into_iter()
        .map(|entry| {
            let source = Arc::clone(&source);
            let identifier = entry.identifier.clone();
            let handle = tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
                let bytes = source.read(&entry)?;
                Ok(load_text(bytes, entry.kind)?)
            });
            (identifier, handle)
        })
        .collect();

    let mut documents = Vec::with_capacity(handles.len());
    for (identifier, handle) in handles {
        let loaded = match handle.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("loader task failed: {}", e)),
        };
        match loaded {
            Ok(text) => documents.push(Document::new(identifier, text, corpus)),
            Err(e) => {
                tracing::warn!(file = %identifier, "skipping document: {:#}", e);
                failures.push(SkippedDocument {
                    source_identifier: identifier,
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    let documents_loaded = documents.len();
    if documents_loaded == 0 {
        return Err(RagError::IngestionFailed(format!(
            "none of the {} {} documents found in {} could be loaded",
            documents_found,
            corpus,
            source.describe()
        )));
    }

    let mut chunks = Vec::new();
    for doc in &documents {
        chunks.extend(split(doc, chunking)?);
    }
    drop(documents);
    let chunks_created = chunks.len();

    let mut records = Vec::with_capacity(chunks_created);
    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        check_batch(texts.len(), embedder.dims(), &vectors)?;
        records.extend(
            batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(chunk, vector)| EmbeddingRecord::new(chunk, vector)),
        );
    }

    let collection = store
        .upsert_corpus(corpus, embedder.model_name(), records)
        .await?;

    tracing::info!(
        corpus = %corpus,
        documents_found,
        documents_loaded,
        chunks_created,
        skipped = failures.len(),
        "ingestion complete"
    );

    Ok(IngestReport {
        corpus,
        documents_found,
        documents_loaded,
        chunks_created,
        failures,
        collection,
    })
}

/// Source for the `code` corpus. Empty overrides fall back to `[ingest.code]`.
pub fn code_source(
    config: &Config,
    project_path: Option<&Path>,
    extensions: &[String],
    ignore_dirs: &[String],
) -> Result<FsSource, RagError> {
    let code = &config.ingest.code;
    let root = project_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| code.path.clone());
    let extensions = if extensions.is_empty() {
        code.extensions.as_slice()
    } else {
        extensions
    };
    let ignore_dirs = if ignore_dirs.is_empty() {
        code.ignore_dirs.as_slice()
    } else {
        ignore_dirs
    };

    let filter = SourceFilter::new(extensions, ignore_dirs, &code.exclude_globs)
        .map_err(|e| RagError::InvalidConfig(format!("{:#}", e)))?;
    FsSource::new(root, filter, code.max_file_bytes)
        .map_err(|e| RagError::IngestionFailed(format!("{:#}", e)))
}

/// Source for the `practices` corpus: `custom_path`, or
/// `<ingest.practices.root>/<language>`.
pub fn practices_source(
    config: &Config,
    language: Option<&str>,
    custom_path: Option<&Path>,
) -> Result<FsSource, RagError> {
    let practices = &config.ingest.practices;
    let root: PathBuf = match custom_path {
        Some(path) => path.to_path_buf(),
        None => practices.language_dir(language.unwrap_or(practices.language.as_str())),
    };

    let filter = SourceFilter::new(&practices.extensions, &[], &practices.exclude_globs)
        .map_err(|e| RagError::InvalidConfig(format!("{:#}", e)))?;
    FsSource::new(root, filter, practices.max_file_bytes)
        .map_err(|e| RagError::IngestionFailed(format!("{:#}", e)))
}

/// Ingest the project source tree into the `code` corpus.
pub async fn ingest_code(
    config: &Config,
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    project_path: Option<&Path>,
    extensions: &[String],
    ignore_dirs: &[String],
) -> Result<IngestReport, RagError> {
    let source = code_source(config, project_path, extensions, ignore_dirs)?;
    ingest(
        store,
        embedder,
        Corpus::Code,
        Arc::new(source),
        config.chunking.code,
        config.embedding.batch_size,
    )
    .await
}

/// Ingest best-practice documents into the `practices` corpus.
pub async fn ingest_practices(
    config: &Config,
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    language: Option<&str>,
    custom_path: Option<&Path>,
) -> Result<IngestReport, RagError> {
    let source = practices_source(config, language, custom_path)?;
    ingest(
        store,
        embedder,
        Corpus::Practices,
        Arc::new(source),
        config.chunking.practices,
        config.embedding.batch_size,
    )
    .await
}

/// `devdoc ingest code`.
pub async fn run_ingest_code(
    config: &Config,
    project_path: Option<PathBuf>,
    extensions: Vec<String>,
    ignore_dirs: Vec<String>,
) -> anyhow::Result<()> {
    let source = code_source(config, project_path.as_deref(), &extensions, &ignore_dirs)?;
    run_with_store(config, Corpus::Code, source, config.chunking.code).await
}

/// `devdoc ingest practices`.
pub async fn run_ingest_practices(
    config: &Config,
    language: Option<String>,
    custom_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let source = practices_source(config, language.as_deref(), custom_path.as_deref())?;
    run_with_store(config, Corpus::Practices, source, config.chunking.practices).await
}

/// The source is walked before the embedder is built: an empty tree is
/// `IngestionFailed` even when embeddings are disabled.
async fn run_with_store(
    config: &Config,
    corpus: Corpus,
    source: FsSource,
    chunking: ChunkConfig,
) -> anyhow::Result<()> {
    chunking.validate()?;
    let source: Arc<dyn DocumentSource> = Arc::new(source);
    let listing = list_documents(corpus, &source).await?;

    let embedder = create_embedder(&config.embedding).await?;
    let store = SqliteStore::open(&config.store.dir).await?;

    let result = ingest_listing(
        &store,
        embedder.as_ref(),
        corpus,
        source,
        listing,
        chunking,
        config.embedding.batch_size,
    )
    .await;
    store.close().await;

    print_report(&result?);
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!("ingest {}", report.corpus);
    println!("  documents found: {}", report.documents_found);
    println!("  documents loaded: {}", report.documents_loaded);
    println!("  chunks created: {}", report.chunks_created);
    println!("  skipped: {}", report.failures.len());
    for skipped in &report.failures {
        println!("    {}: {}", skipped.source_identifier, skipped.reason);
    }
    println!(
        "  embedder: {} ({} dims)",
        report.collection.embedder, report.collection.dims
    );
    println!("  fingerprint: {}", report.collection.fingerprint);
    println!("ok");
}
