//! AstroIntel Retrieval
//!
//! Semantic context retrieval over a small, fixed knowledge base of short
//! passages. Passages and queries are embedded with a pretrained sentence
//! model, scored by cosine similarity, and the best passage is returned if
//! it clears a relevance threshold.
//!
//! ## Features
//!
//! - **Local embeddings** - fastembed ONNX models, all-MiniLM-L6-v2 by default
//! - **Persistent vector cache** - `.npy` array keyed by a model + passage fingerprint
//! - **Threshold matching** - out-of-domain queries yield `None` instead of noise
//!
//! ## Example
//!
//! ```ignore
//! use astrointel_retrieval::{ContextRetriever, KnowledgeBase, RetrieverConfig, VectorEngine};
//!
//! let engine = Arc::new(VectorEngine::new(Default::default())?);
//! let retriever = ContextRetriever::new(
//!     KnowledgeBase::space_biology(),
//!     engine,
//!     RetrieverConfig::default(),
//! )?;
//!
//! if let Some(context) = retriever.retrieve_context("does microgravity affect bacteria", 0.2)? {
//!     println!("{context}");
//! }
//! ```

pub mod cache;
pub mod embedding;
pub mod error;
pub mod passage;
pub mod retriever;
pub mod search;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use cache::{CacheMetadata, CacheStatus, VectorCache};
pub use embedding::{Embedder, FastEmbedConfig, FastEmbedModel, ModelKind, VectorEngine};
pub use error::{Result, RetrievalError};
pub use passage::{KnowledgeBase, Passage, PassageId};
pub use retriever::{ContextRetriever, RetrievedPassage, RetrieverConfig};
pub use search::{SearchConfig, DEFAULT_THRESHOLD};
