//! Content chunking for breaking corpus pages into searchable windows.

mod window;

pub use window::WindowChunker;

use crate::config::KnowledgeBaseSettings;
use serde::{Deserialize, Serialize};

/// A window of text from one page of the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// File the chunk came from.
    pub source: String,
    /// 1-based page number within the source.
    pub page: u32,
    /// Character offset of the chunk within its page.
    pub offset: usize,
    /// Order of this chunk across the whole corpus.
    pub order: usize,
}

impl Chunk {
    /// Short citation, e.g. `kb.pdf p.3`.
    pub fn citation(&self) -> String {
        format!("{} p.{}", self.source, self.page)
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks of a page.
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Window size actually used (never zero).
    pub fn effective_size(&self) -> usize {
        self.chunk_size.max(1)
    }

    /// Overlap actually used; always smaller than the window so chunking progresses.
    pub fn effective_overlap(&self) -> usize {
        self.chunk_overlap.min(self.effective_size() - 1)
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 750,
            chunk_overlap: 100,
        }
    }
}

impl From<&KnowledgeBaseSettings> for ChunkingConfig {
    fn from(settings: &KnowledgeBaseSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }
}
