//! In-memory embedding index over corpus chunks.
//!
//! Built once from the chunked corpus and read-only afterwards. Queries rank
//! every stored chunk by cosine similarity against the query embedding.

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{ResolvError, Result};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A stored chunk with its embedding.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A query hit with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity (higher is nearer).
    pub score: f32,
}

/// Read-only similarity index.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<IndexEntry>,
}

impl EmbeddingIndex {
    /// Embed every chunk once and store the vectors in insertion order.
    ///
    /// An empty chunk list builds an empty index.
    #[instrument(skip(chunks, embedder), fields(chunks = chunks.len()))]
    pub async fn build(chunks: Vec<Chunk>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if chunks.is_empty() {
            warn!("Knowledge base has no documents; the index is empty");
            return Ok(Self {
                embedder,
                entries: Vec::new(),
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(ResolvError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        info!("Indexed {} chunks", entries.len());
        Ok(Self { embedder, entries })
    }

    /// Return up to `k` chunks nearest to `text`, nearest first.
    ///
    /// Equal scores keep insertion order.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;
        Ok(self.nearest(&query_embedding, k))
    }

    /// Rank stored entries against a precomputed query embedding.
    pub fn nearest(&self, query_embedding: &[f32], k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct source files in the index, in first-seen order.
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !sources.contains(&entry.chunk.source) {
                sources.push(entry.chunk.source.clone());
            }
        }
        sources
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
