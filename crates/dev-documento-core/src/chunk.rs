//! Overlapping, boundary-aware text chunker.
//!
//! Splits a [`Document`]'s text into [`Chunk`]s of at most `chunk_size`
//! characters. Every chunk after the first starts exactly `overlap`
//! characters before the end of the previous one, so dropping the first
//! `overlap` characters of each later chunk and concatenating reconstructs
//! the original text.
//!
//! # Algorithm
//!
//! 1. If the remaining text fits in `chunk_size`, emit it as the last chunk.
//! 2. Otherwise look for a cut point inside the window, trying separators in
//!    order: paragraph break (`\n\n`), line break, sentence end (`. `), space.
//!    A cut is only accepted in the second half of the window and strictly
//!    past the overlap, so every step makes progress.
//! 3. Without any acceptable separator, hard-cut at `chunk_size`.
//! 4. The next chunk starts `overlap` characters before the cut.
//!
//! # Example
//!
//! ```rust
//! use dev_documento_core::chunk::{split, ChunkConfig};
//! use dev_documento_core::models::{Corpus, Document};
//!
//! let doc = Document::new("notes.txt", "a".repeat(2500), Corpus::Code);
//! let chunks: Vec<_> = split(&doc, ChunkConfig::new(1000, 200).unwrap()).unwrap().collect();
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[1].offset, 800);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RagError;
use crate::models::{Chunk, Document};

/// Preferred cut points, strongest first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Chunk sizing, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkConfig {
    /// Source files: larger chunks, wider overlap.
    pub const CODE: ChunkConfig = ChunkConfig {
        chunk_size: 1000,
        overlap: 200,
    };

    /// Best-practice documents.
    pub const PRACTICES: ChunkConfig = ChunkConfig {
        chunk_size: 800,
        overlap: 150,
    };

    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, RagError> {
        let config = Self {
            chunk_size,
            overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfig(
                "chunk_size must be > 0".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split a document into overlapping chunks.
///
/// Returns a lazy iterator; calling `split` again (or cloning the iterator)
/// restarts the sequence. Empty text yields no chunks.
///
/// # Errors
///
/// [`RagError::InvalidConfig`] if `overlap >= chunk_size` or `chunk_size == 0`.
pub fn split(document: &Document, config: ChunkConfig) -> Result<Chunks<'_>, RagError> {
    config.validate()?;

    let text = document.raw_text.as_str();
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());

    let next_start = if text.is_empty() { None } else { Some(0) };

    Ok(Chunks {
        document,
        config,
        boundaries,
        next_start,
        next_index: 0,
    })
}

/// Iterator over the chunks of one document. See [`split`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    document: &'a Document,
    config: ChunkConfig,
    /// Byte offset of every char boundary, ending with `text.len()`.
    boundaries: Vec<usize>,
    /// Char index where the next chunk begins; `None` once exhausted.
    next_start: Option<usize>,
    next_index: usize,
}

impl Chunks<'_> {
    fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Char index (exclusive) at which the chunk starting at `start` ends.
    fn find_cut(&self, start: usize) -> usize {
        let size = self.config.chunk_size;
        let hard = start + size;
        let floor = start + (self.config.overlap + 1).max(size / 2);
        let text = self.document.raw_text.as_str();

        for sep in SEPARATORS {
            let mut cut = hard;
            while cut >= floor {
                if text[..self.boundaries[cut]].ends_with(sep) {
                    return cut;
                }
                cut -= 1;
            }
        }
        hard
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start?;
        let len = self.char_len();

        let end = if len - start <= self.config.chunk_size {
            self.next_start = None;
            len
        } else {
            let cut = self.find_cut(start);
            self.next_start = Some(cut - self.config.overlap);
            cut
        };

        let text = &self.document.raw_text[self.boundaries[start]..self.boundaries[end]];
        let chunk = Chunk {
            text: text.to_string(),
            source_identifier: self.document.source_identifier.clone(),
            offset: start,
            chunk_index: self.next_index,
            corpus: self.document.corpus,
        };
        self.next_index += 1;
        Some(chunk)
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}
