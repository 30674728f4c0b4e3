//! Text extraction for loaded files.
//!
//! Sources hand over raw bytes plus a [`DocumentKind`]; this module returns
//! plain UTF-8 text or an [`ExtractError`]. Extraction never panics past
//! this boundary: the ingestion pipeline records the error and skips the
//! file.

use std::path::Path;

/// How a file's bytes become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Must decode as UTF-8.
    PlainText,
    /// Text layer extracted with `pdf-extract`.
    Pdf,
}

impl DocumentKind {
    /// Classify by file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => DocumentKind::Pdf,
            _ => DocumentKind::PlainText,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Decode `bytes` according to `kind`.
pub fn load_text(bytes: Vec<u8>, kind: DocumentKind) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::PlainText => Ok(String::from_utf8(bytes)?),
        DocumentKind::Pdf => extract_pdf(&bytes),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract can panic on malformed input.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("parser panicked".to_string())),
    }
}
