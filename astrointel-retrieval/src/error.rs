//! Error types for astrointel-retrieval

use thiserror::Error;

/// Errors that can occur in the retrieval pipeline
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Embedding model could not be loaded
    #[error("Model unavailable: {0}")]
    Model(String),

    /// Embedding computation failed for a given input
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector cache is unusable
    #[error("Cache error: {0}")]
    Cache(String),

    /// Similarity threshold outside of the cosine range
    #[error("Invalid threshold {0}: expected a finite value in [-1, 1]")]
    InvalidThreshold(f32),

    /// Vectors of different dimension were compared
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Knowledge base failed validation
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a .npy array failed
    #[error("NPY read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// Writing a .npy array failed
    #[error("NPY write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    /// Array shape error
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl RetrievalError {
    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a knowledge base error
    pub fn knowledge_base(msg: impl Into<String>) -> Self {
        Self::KnowledgeBase(msg.into())
    }

    /// True for failures of the embedding model itself
    pub fn is_model_failure(&self) -> bool {
        matches!(self, Self::Model(_) | Self::Embedding(_))
    }
}

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;
