//! Embedding module for semantic retrieval
//!
//! Uses fastembed (ONNX runtime) sentence-transformer models, all-MiniLM-L6-v2 by default.

mod discovery;
mod engine;
mod onnx;

pub use discovery::find_models_dir;
pub use engine::{cosine_similarity, VectorEngine, DEFAULT_MEMO_CAPACITY};
pub use onnx::{FastEmbedConfig, FastEmbedModel, ModelKind};

use crate::error::Result;

/// Text to vector mapping
///
/// Implementations must be deterministic for a given model: the same text
/// always yields the same vector, so cached passage vectors stay comparable
/// with freshly embedded queries.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input in input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| crate::RetrievalError::embedding("model returned no vector"))
    }

    /// Vector dimension produced by this model
    fn dimension(&self) -> usize;

    /// Identifier of the model, part of the vector cache fingerprint
    fn model_id(&self) -> &str;
}
