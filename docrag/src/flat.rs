//! Exact (brute-force) nearest-neighbour index over dense vectors.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Distance function used by a [`FlatIndex`]. Smaller is always more similar.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// `1 - cosine similarity`; 1.0 when either vector is zero.
    Cosine,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// An append-only list of vectors searched exhaustively.
///
/// Position `i` is the `i`th vector added. Search results are
/// `(position, distance)` pairs in ascending distance; equal distances keep
/// insertion order, so the lower position wins ties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatIndex {
    metric: DistanceMetric,
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Create an empty index for vectors of `dimensions` components.
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self { metric, dimensions, vectors: Vec::new() }
    }

    /// Append vectors. Fails without modifying the index if any has the wrong size.
    pub fn add(&mut self, vectors: impl IntoIterator<Item = Vec<f32>>) -> Result<()> {
        let vectors: Vec<Vec<f32>> = vectors.into_iter().collect();
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }
        self.vectors.extend(vectors);
        Ok(())
    }

    /// Return up to `k` nearest positions to `query`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, self.metric.distance(vector, query)))
            .collect();

        // Stable sort keeps insertion order among equal distances.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true if no vectors are stored.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality of stored vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Check the invariants a deserialized index must satisfy.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        match self.vectors.iter().position(|v| v.len() != self.dimensions) {
            Some(i) => Err(format!(
                "vector {i} has {} components, index declares {}",
                self.vectors[i].len(),
                self.dimensions
            )),
            None => Ok(()),
        }
    }
}
