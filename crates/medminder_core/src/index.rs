//! crates/medminder_core/src/index.rs
//!
//! An in-memory similarity index over embedded text chunks.
//!
//! The index is rebuilt from scratch on every upload and is never persisted;
//! it lives only as long as the session that created it.

use crate::ports::{PortError, PortResult};

/// Calculate cosine similarity between two embeddings.
/// Mismatched lengths and zero-magnitude vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        0.0
    } else {
        dot_product / (magnitude_a * magnitude_b)
    }
}

/// A chunk returned from a similarity search, best match first.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
}

/// A similarity-searchable set of text chunks derived from one uploaded
/// document.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl DocumentIndex {
    /// Builds an index from parallel lists of chunks and their embeddings.
    pub fn new(chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> PortResult<Self> {
        if chunks.is_empty() {
            return Err(PortError::InvalidInput(
                "Cannot build an index from zero chunks".to_string(),
            ));
        }
        if chunks.len() != vectors.len() {
            return Err(PortError::InvalidInput(format!(
                "Chunk/vector count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        Ok(Self { chunks, vectors })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the `k` chunks nearest to `query`, ordered by descending
    /// cosine similarity.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .zip(self.vectors.iter())
            .map(|(text, vector)| ScoredChunk {
                text: text.clone(),
                score: cosine_similarity(query, vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.5, 0.5, 0.7];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn mismatched_lengths_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn zero_magnitude_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn search_orders_by_similarity() {
        let chunks = vec!["north".to_string(), "east".to_string(), "northeast".to_string()];
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]];
        let index = DocumentIndex::new(chunks, vectors).unwrap();

        let results = index.search(&[1.0, 0.1], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "north");
        assert_eq!(results[1].text, "northeast");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn empty_index_is_rejected() {
        assert!(DocumentIndex::new(vec![], vec![]).is_err());
    }

    #[test]
    fn mismatched_counts_are_rejected() {
        let result = DocumentIndex::new(vec!["a".to_string()], vec![]);
        assert!(result.is_err());
    }
}
