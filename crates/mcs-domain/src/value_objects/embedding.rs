//! Semantic embedding value objects

use serde::{Deserialize, Serialize};

/// Value Object: Semantic Text Embedding
///
/// A fixed-dimension vector representation of text content. Embeddings are
/// produced in batches that preserve input order, so vector `i` always maps
/// back to text `i`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    /// The embedding vector values
    pub vector: Vec<f32>,
    /// Name of the model that generated this embedding
    pub model: String,
    /// Dimensionality of the embedding vector
    pub dimensions: usize,
}

impl Embedding {
    /// Create an embedding; `dimensions` is derived from the vector
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        let dimensions = vector.len();
        Self {
            vector,
            model: model.into(),
            dimensions,
        }
    }

    /// Whether the vector matches the expected dimensionality
    pub fn has_dimensions(&self, expected: usize) -> bool {
        self.vector.len() == expected && self.dimensions == expected
    }
}
