//! Flat vector index with exact nearest-neighbour search.

use super::{cosine_distance, IndexedChunk, SearchHit};
use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{Result, VidaskError};
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, instrument};

/// Texts per embedding call while building.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Embedding calls in flight while building.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Immutable index of embedded chunks.
///
/// Distances are cosine distances, both for ranking and for reported scores. Equal
/// distances rank by insertion order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    dim: usize,
}

impl VectorIndex {
    /// Embed every chunk and index the results.
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        Self::build_batched(chunks, embedder, DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONCURRENT).await
    }

    /// Embed chunks in batches of `batch_size`, up to `max_concurrent` batches at a time.
    ///
    /// All or nothing: any embedding failure discards the whole build.
    #[instrument(skip(chunks, embedder), fields(chunks = chunks.len()))]
    pub async fn build_batched(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        batch_size: usize,
        max_concurrent: usize,
    ) -> Result<Self> {
        let batches: Vec<Vec<String>> = chunks
            .chunks(batch_size.max(1))
            .map(|batch| batch.iter().map(|c| c.text.clone()).collect())
            .collect();
        let requests: Vec<_> = batches
            .into_iter()
            .map(|batch| embed_checked(embedder, batch))
            .collect();

        let batches: Vec<Vec<Vec<f32>>> = futures::stream::iter(requests)
            .buffered(max_concurrent.max(1))
            .try_collect()
            .await?;

        let vectors = batches.into_iter().flatten().collect();
        let index = Self::from_embeddings(chunks, vectors)?;
        debug!("Built index with {} entries (dim={})", index.len(), index.dim);
        Ok(index)
    }

    /// Index chunks with precomputed vectors, one per chunk.
    pub fn from_embeddings(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(VidaskError::Embedding(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dim == 0 {
            return Err(VidaskError::Embedding("Empty embedding vector".to_string()));
        }
        if let Some(bad) = vectors.iter().position(|v| v.len() != dim) {
            return Err(VidaskError::Embedding(format!(
                "Vector {} has dimension {}, expected {}",
                bad,
                vectors[bad].len(),
                dim
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedChunk { chunk, vector })
            .collect();

        Ok(Self { entries, dim })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimension shared by every entry (0 for an empty index).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Indexed chunks in insertion order.
    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    /// The `k` chunks nearest to `query_vector`, nearest first.
    pub fn query(&self, query_vector: &[f32], k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .search(query_vector, k)?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect())
    }

    /// Like [`VectorIndex::query`], keeping distances and positions.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if self.entries.is_empty() {
            return Err(VidaskError::EmptyIndex);
        }
        if query_vector.len() != self.dim {
            return Err(VidaskError::Embedding(format!(
                "Query vector has dimension {}, index has {}",
                query_vector.len(),
                self.dim
            )));
        }

        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (cosine_distance(query_vector, &entry.vector), i))
            .collect();

        let by_distance_then_position =
            |a: &(f32, usize), b: &(f32, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_position);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_position);

        Ok(scored
            .into_iter()
            .map(|(distance, position)| SearchHit {
                chunk: self.entries[position].chunk.clone(),
                distance,
                position,
            })
            .collect())
    }
}

/// Embed one batch, folding every failure into `Embedding`.
async fn embed_checked(embedder: &dyn Embedder, batch: Vec<String>) -> Result<Vec<Vec<f32>>> {
    let vectors = embedder.embed_batch(&batch).await.map_err(|e| match e {
        VidaskError::Embedding(msg) => VidaskError::Embedding(msg),
        other => VidaskError::Embedding(other.to_string()),
    })?;
    if vectors.len() != batch.len() {
        return Err(VidaskError::Embedding(format!(
            "Expected {} embeddings, got {}",
            batch.len(),
            vectors.len()
        )));
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn three_entry_index() -> VectorIndex {
        VectorIndex::from_embeddings(
            vec![
                Chunk::new("north", 0),
                Chunk::new("east", 10),
                Chunk::new("north-east", 20),
            ],
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.7]],
        )
        .unwrap()
    }

    #[test]
    fn test_query_nearest_first() {
        let index = three_entry_index();
        let results = index.query(&[0.1, 1.0], 2).unwrap();
        let texts: Vec<&str> = results.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["north", "north-east"]);
    }

    #[test]
    fn test_query_k_larger_than_index() {
        let index = three_entry_index();
        let results = index.query(&[1.0, 0.1], 10).unwrap();
        let texts: Vec<&str> = results.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["east", "north-east", "north"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = VectorIndex::from_embeddings(
            vec![Chunk::new("a", 0), Chunk::new("b", 1), Chunk::new("c", 2), Chunk::new("d", 3)],
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0], vec![1.0, 0.0]],
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].chunk.text, "b");
        assert_eq!(hits[1].chunk.text, "c");
        assert_eq!(hits[1].position, 2);

        let all = index.query(&[1.0, 0.0], 4).unwrap();
        let texts: Vec<&str> = all.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_empty_index() {
        let index = VectorIndex::from_embeddings(Vec::new(), Vec::new()).unwrap();
        assert!(matches!(index.query(&[1.0], 1), Err(VidaskError::EmptyIndex)));
        assert!(index.query(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_checks() {
        let err = VectorIndex::from_embeddings(
            vec![Chunk::new("a", 0), Chunk::new("b", 1)],
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, VidaskError::Embedding(_)));

        let index = three_entry_index();
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 1),
            Err(VidaskError::Embedding(_))
        ));
    }

    struct AxisEmbedder {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if Some(text) == self.fail_on {
                return Err(VidaskError::TransientNetwork("connection reset".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    #[tokio::test]
    async fn test_build_preserves_chunk_order_across_batches() {
        let embedder = AxisEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: None,
        };
        let chunks: Vec<Chunk> = (0..7).map(|i| Chunk::new("x".repeat(i + 1), i)).collect();

        let index = VectorIndex::build_batched(chunks, &embedder, 2, 3).await.unwrap();

        assert_eq!(embedder.calls.load(AtomicOrdering::SeqCst), 4);
        assert_eq!(index.len(), 7);
        assert_eq!(index.dim(), 2);
        for (i, entry) in index.entries().iter().enumerate() {
            assert_eq!(entry.chunk.source_offset, i);
            assert_eq!(entry.vector[0], (i + 1) as f32);
        }
    }

    #[tokio::test]
    async fn test_build_is_all_or_nothing() {
        let embedder = AxisEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: Some("bad"),
        };
        let chunks = vec![Chunk::new("good", 0), Chunk::new("bad", 4), Chunk::new("fine", 7)];

        let err = VectorIndex::build_batched(chunks, &embedder, 1, 1).await.unwrap_err();
        assert!(matches!(err, VidaskError::Embedding(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_build_empty() {
        let embedder = AxisEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: None,
        };
        let index = VectorIndex::build(Vec::new(), &embedder).await.unwrap();
        assert!(index.is_empty());
        assert_eq!(embedder.calls.load(AtomicOrdering::SeqCst), 0);
    }
}
