//! Vector embedding engine
//!
//! High-level API for generating and memoising embeddings.

use super::onnx::{FastEmbedConfig, FastEmbedModel};
use super::Embedder;
use crate::error::{Result, RetrievalError};
use dashmap::DashMap;
use std::sync::Arc;

/// Default number of memoised query vectors
pub const DEFAULT_MEMO_CAPACITY: usize = 4096;

/// Vector embedding engine with caching
///
/// Wraps an [`Embedder`] with a DashMap cache for repeated queries.
pub struct VectorEngine {
    model: Arc<dyn Embedder>,
    cache: DashMap<String, Vec<f32>>,
    capacity: usize,
    dimension: usize,
}

impl VectorEngine {
    /// Create VectorEngine backed by fastembed
    ///
    /// Fails with [`RetrievalError::Model`] if the model cannot be loaded.
    pub fn new(config: FastEmbedConfig) -> Result<Self> {
        let model = FastEmbedModel::with_config(config)?;
        let engine = Self::from_embedder(Arc::new(model));

        log::info!(
            "VectorEngine ready ({}, {}d)",
            engine.model_id(),
            engine.dimension
        );

        Ok(engine)
    }

    /// Create VectorEngine around any embedder
    pub fn from_embedder(model: Arc<dyn Embedder>) -> Self {
        let dimension = model.dimension();
        Self {
            model,
            cache: DashMap::new(),
            capacity: DEFAULT_MEMO_CAPACITY,
            dimension,
        }
    }

    /// Bound the memo cache; zero disables memoisation
    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Generate embedding with caching
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_text(text)?;

        if let Some(cached) = self.cache.get(text) {
            return Ok(cached.clone());
        }

        let embedding = self.model.embed(text)?;
        self.check_dimension(&embedding)?;
        self.remember(text, &embedding);
        Ok(embedding)
    }

    /// Batch embed, order-preserving, bypassing the memo cache
    ///
    /// Used for passage sets, which are embedded once and then persisted.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        for text in texts {
            ensure_text(text)?;
        }

        let embeddings = self.model.embed_batch(texts)?;
        if embeddings.len() != texts.len() {
            return Err(RetrievalError::embedding(format!(
                "expected {} vectors, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }
        Ok(embeddings)
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Identifier of the underlying model
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    fn remember(&self, text: &str, embedding: &[f32]) {
        if self.capacity == 0 {
            return;
        }
        if self.cache.len() >= self.capacity {
            log::debug!("Query memo full ({} entries), clearing", self.cache.len());
            self.cache.clear();
        }
        self.cache.insert(text.to_string(), embedding.to_vec());
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(RetrievalError::embedding("cannot embed empty text"));
    }
    Ok(())
}

/// Calculate cosine similarity between two vectors
///
/// Returns 0.0 for vectors of different length or zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::KeywordEmbedder;

    fn engine() -> VectorEngine {
        VectorEngine::from_embedder(Arc::new(KeywordEmbedder::new()))
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = [1.0_f32, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = [1.0_f32, 0.0, 0.0];
        let b = [0.0_f32, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = [1.0_f32, 2.0, 3.0];
        let b = [-1.0_f32, -2.0, -3.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_embed_memoises_queries() {
        let engine = engine();
        let first = engine.embed("microgravity bacteria").unwrap();
        assert_eq!(engine.cache_size(), 1);
        let second = engine.embed("microgravity bacteria").unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.cache_size(), 1);
    }

    #[test]
    fn test_memo_is_bounded() {
        let engine = engine().with_memo_capacity(2);
        engine.embed("bone").unwrap();
        engine.embed("wheat").unwrap();
        engine.embed("radiation").unwrap();
        assert!(engine.cache_size() <= 2);

        let disabled = self::engine().with_memo_capacity(0);
        disabled.embed("bone").unwrap();
        assert_eq!(disabled.cache_size(), 0);
    }

    #[test]
    fn test_embed_rejects_blank_text() {
        let err = engine().embed("   ").unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }

    #[test]
    fn test_embed_batch_preserves_order() {
        let engine = engine();
        let batch = engine.embed_batch(&["bone", "wheat"]).unwrap();
        assert_eq!(batch[0], engine.embed("bone").unwrap());
        assert_eq!(batch[1], engine.embed("wheat").unwrap());
        assert!(engine.embed_batch(&[]).unwrap().is_empty());
    }
}
