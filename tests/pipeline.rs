//! End-to-end library tests: ingest real directory trees into the SQLite
//! store, then answer requests through the orchestrator. The embedder and
//! model are deterministic doubles, so nothing here needs the network.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use dev_documento::config::Config;
use dev_documento::context::AppContext;
use dev_documento::sqlite_store::SqliteStore;
use dev_documento::{assist, ingest};
use dev_documento_core::embedding::Embedder;
use dev_documento_core::mock::{MockEmbedder, MockGenerator};
use dev_documento_core::store::VectorStore;
use dev_documento_core::{Corpus, RagError};

/// Minimal valid PDF whose text layer reads "guard clause tip".
fn minimal_pdf_with_phrase() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(b"4 0 obj << /Length 48 >> stream\nBT /F1 12 Tf 100 700 Td (guard clause tip) Tj ET\nendstream endobj\n");
    let o5 = out.len();
    out.extend_from_slice(b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n");
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

struct Workspace {
    _tmp: TempDir,
    config: Config,
}

impl Workspace {
    fn root(&self) -> &Path {
        self._tmp.path()
    }
}

fn setup_workspace() -> Workspace {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let project = root.join("project");
    fs::create_dir_all(project.join("pkg")).unwrap();
    fs::create_dir_all(project.join("venv/lib")).unwrap();
    fs::write(
        project.join("pkg/math_utils.py"),
        "def add(a, b):\n    return a + b\n\n\ndef scale(values, factor):\n    return [v * factor for v in values]\n",
    )
    .unwrap();
    fs::write(
        project.join("pkg/io_utils.py"),
        "def read_lines(path):\n    with open(path) as fh:\n        return fh.read().splitlines()\n",
    )
    .unwrap();
    fs::write(project.join("venv/lib/site.py"), "IGNORED = True\n").unwrap();
    fs::write(project.join("README.md"), "not python\n").unwrap();

    let practices = root.join("knowledge_base/python");
    fs::create_dir_all(&practices).unwrap();
    fs::write(
        practices.join("style.md"),
        "# Style\n\nWrite a docstring for every public function.\nKeep functions short and name them after what they return.\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.store.dir = root.join("vectorstores");
    config.ingest.code.path = project;
    config.ingest.practices.root = root.join("knowledge_base");

    Workspace { _tmp: tmp, config }
}

#[tokio::test]
async fn test_ingest_then_document_and_review() {
    let ws = setup_workspace();
    let embedder = Arc::new(MockEmbedder::new(64));
    let store = Arc::new(SqliteStore::open(&ws.config.store.dir).await.unwrap());

    let code = ingest::ingest_code(&ws.config, &*store, &*embedder, None, &[], &[])
        .await
        .unwrap();
    assert_eq!(code.documents_found, 2);
    assert_eq!(code.documents_loaded, 2);
    assert!(code.failures.is_empty());

    let practices =
        ingest::ingest_practices(&ws.config, &*store, &*embedder, None, None)
            .await
            .unwrap();
    assert_eq!(practices.documents_loaded, 1);

    let generator = Arc::new(MockGenerator::new("\"\"\"Add two numbers.\"\"\""));
    let ctx = AppContext::from_parts(embedder.clone(), store.clone(), generator.clone());

    let doc = assist::document_request(&ctx, "def add(a, b):\n    return a + b")
        .await
        .unwrap();
    assert_eq!(doc, "\"\"\"Add two numbers.\"\"\"");

    assist::review_request(&ctx, "def add(a, b):\n    return a + b")
        .await
        .unwrap();

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("def add(a, b):\n    return a + b\n\n\ndef scale"));
    assert!(prompts[1].contains("Write a docstring for every public function."));
    assert!(!prompts[0].contains("IGNORED"));

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_collection_persists_across_reopen() {
    let ws = setup_workspace();
    let embedder = MockEmbedder::new(64);

    let first = {
        let store = SqliteStore::open(&ws.config.store.dir).await.unwrap();
        let report = ingest::ingest_code(&ws.config, &store, &embedder, None, &[], &[])
            .await
            .unwrap();
        store.close().await;
        report.collection
    };

    let store = SqliteStore::open(&ws.config.store.dir).await.unwrap();
    let info = store.collection_info(Corpus::Code).await.unwrap().unwrap();
    assert_eq!(info.fingerprint, first.fingerprint);
    assert_eq!(info.record_count, first.record_count);
    assert_eq!(info.embedder, "mock-embedder");
    assert!(store.collection_info(Corpus::Practices).await.unwrap().is_none());
    store.close().await;
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let ws = setup_workspace();
    let embedder = MockEmbedder::new(64);
    let store = SqliteStore::open(&ws.config.store.dir).await.unwrap();

    let a = ingest::ingest_code(&ws.config, &store, &embedder, None, &[], &[])
        .await
        .unwrap();
    let query = embedder.embed("read lines from a file").await.unwrap();
    let hits_a = store.search(Corpus::Code, embedder.model_name(), &query, 3).await.unwrap();

    let b = ingest::ingest_code(&ws.config, &store, &embedder, None, &[], &[])
        .await
        .unwrap();
    let hits_b = store.search(Corpus::Code, embedder.model_name(), &query, 3).await.unwrap();

    assert_eq!(a.collection.fingerprint, b.collection.fingerprint);
    assert_eq!(a.collection.record_count, b.collection.record_count);
    let texts = |hits: &[dev_documento_core::SearchHit]| {
        hits.iter().map(|h| h.chunk.text.clone()).collect::<Vec<_>>()
    };
    assert_eq!(texts(&hits_a), texts(&hits_b));
    store.close().await;
}

#[tokio::test]
async fn test_invalid_utf8_file_is_skipped() {
    let ws = setup_workspace();
    fs::write(
        ws.config.ingest.code.path.join("pkg/latin1.py"),
        [0x23u8, 0x20, 0xe9, 0xe8, 0x0a],
    )
    .unwrap();

    let embedder = MockEmbedder::new(64);
    let store = SqliteStore::open(&ws.config.store.dir).await.unwrap();
    let report = ingest::ingest_code(&ws.config, &store, &embedder, None, &[], &[])
        .await
        .unwrap();

    assert_eq!(report.documents_found, 3);
    assert_eq!(report.documents_loaded, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source_identifier, "pkg/latin1.py");
    store.close().await;
}

#[tokio::test]
async fn test_practices_accept_pdf_and_markdown() {
    let ws = setup_workspace();
    fs::write(
        ws.root().join("knowledge_base/python/guide.pdf"),
        minimal_pdf_with_phrase(),
    )
    .unwrap();

    let embedder = MockEmbedder::new(64);
    let store = SqliteStore::open(&ws.config.store.dir).await.unwrap();
    let report = ingest::ingest_practices(&ws.config, &store, &embedder, Some("python"), None)
        .await
        .unwrap();

    assert_eq!(report.documents_found, 2);
    assert!(report.documents_loaded >= 1);
    assert_eq!(report.documents_loaded + report.failures.len(), 2);
    store.close().await;
}

#[tokio::test]
async fn test_empty_tree_fails_without_writing() {
    let ws = setup_workspace();
    let empty = ws.root().join("empty");
    fs::create_dir_all(empty.join("venv")).unwrap();
    fs::write(empty.join("venv/hidden.py"), "x = 1\n").unwrap();

    let embedder = MockEmbedder::new(64);
    let store = SqliteStore::open(&ws.config.store.dir).await.unwrap();
    let err = ingest::ingest_code(&ws.config, &store, &embedder, Some(empty.as_path()), &[], &[])
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::IngestionFailed(_)));
    assert!(store.collection_info(Corpus::Code).await.unwrap().is_none());
    assert_eq!(embedder.calls(), 0);
    store.close().await;
}

#[tokio::test]
async fn test_missing_practices_language_fails() {
    let ws = setup_workspace();
    let embedder = MockEmbedder::new(64);
    let store = SqliteStore::open(&ws.config.store.dir).await.unwrap();

    let err = ingest::ingest_practices(&ws.config, &store, &embedder, Some("haskell"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::IngestionFailed(_)));
    store.close().await;
}

#[tokio::test]
async fn test_document_before_ingest_is_store_not_found() {
    let ws = setup_workspace();
    let store = Arc::new(SqliteStore::open(&ws.config.store.dir).await.unwrap());
    let generator = Arc::new(MockGenerator::new("unused"));
    let ctx = AppContext::from_parts(
        Arc::new(MockEmbedder::new(64)),
        store,
        generator.clone(),
    );

    let err = assist::document_request(&ctx, "x = 1").await.unwrap_err();
    assert!(matches!(err, RagError::StoreNotFound(Corpus::Code)));
    assert_eq!(generator.calls(), 0);
    ctx.shutdown().await;
}
