#[cfg(test)]
mod tests;

use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored chunk as read back from the `documents` table
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ChunkRecord {
    pub id: i32,
    pub content: String,
    pub embedding: Vector,
}

impl ChunkRecord {
    #[inline]
    pub fn dimension(&self) -> usize {
        self.embedding.as_slice().len()
    }
}

/// A chunk waiting to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A retrieved chunk together with its distance to the query vector
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ScoredChunk {
    pub id: i32,
    pub content: String,
    pub distance: f64,
}

/// pgvector distance operator used to rank stored vectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
    InnerProduct,
}

impl DistanceMetric {
    /// The SQL operator pgvector uses for this metric
    #[inline]
    pub fn operator(self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "<=>",
            DistanceMetric::L2 => "<->",
            DistanceMetric::InnerProduct => "<#>",
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::L2 => write!(f, "l2"),
            DistanceMetric::InnerProduct => write!(f, "inner_product"),
        }
    }
}
