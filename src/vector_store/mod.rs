//! In-memory vector index over transcript chunks.
//!
//! An index is built once from a set of chunks and is immutable afterwards, so it can be
//! shared behind an `Arc` and queried concurrently.

mod index;

pub use index::{VectorIndex, DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONCURRENT};

use crate::chunking::Chunk;
use serde::{Deserialize, Serialize};

/// A chunk stored together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A query match.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine distance to the query (lower is closer).
    pub distance: f32,
    /// Insertion position of the chunk in the index.
    pub position: usize,
}

impl SearchHit {
    /// Cosine similarity (higher is closer).
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
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

/// Cosine distance in `[0, 2]`. Zero vectors sit at distance 1 from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_distance_zero_vector() {
        assert!((cosine_distance(&[0.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < f32::EPSILON);
        assert!(cosine_distance(&[2.0, 0.0], &[1.0, 0.0]).abs() < 0.001);
    }
}
