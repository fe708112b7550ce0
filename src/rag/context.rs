//! Context retrieval for answers.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchHit, VectorIndex};
use std::sync::Arc;
use tracing::debug;

/// Embeds a question and retrieves the nearest chunks from an index.
pub struct ContextBuilder {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, top_k: 5 }
    }

    /// Set the number of chunks to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retrieve context for a question, nearest first.
    pub async fn build(&self, index: &VectorIndex, question: &str) -> Result<Vec<SearchHit>> {
        let query_embedding = self.embedder.embed(question).await?;
        let hits = index.search(&query_embedding, self.top_k)?;
        debug!("Retrieved {} of {} chunks", hits.len(), index.len());
        Ok(hits)
    }
}

/// Join chunk texts with newlines, in retrieval order.
pub fn format_context_for_prompt(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn hit(text: &str, offset: usize, distance: f32) -> SearchHit {
        SearchHit {
            chunk: Chunk::new(text, offset),
            distance,
            position: offset,
        }
    }

    #[test]
    fn test_format_context_for_prompt() {
        let hits = vec![hit("second chunk", 10, 0.1), hit("first chunk", 0, 0.4)];
        assert_eq!(format_context_for_prompt(&hits), "second chunk\nfirst chunk");
        assert_eq!(format_context_for_prompt(&[]), "");
    }
}
