//! fastembed sentence-transformer embeddings
//!
//! Runs pretrained ONNX models locally. Weights are downloaded from
//! HuggingFace on first use into the discovered models directory.

use std::path::PathBuf;
use std::str::FromStr;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::discovery::find_models_dir;
use super::Embedder;
use crate::error::{Result, RetrievalError};

/// Supported sentence-embedding models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelKind {
    /// sentence-transformers/all-MiniLM-L6-v2 (384 dimensions)
    #[default]
    #[serde(rename = "all-MiniLM-L6-v2")]
    AllMiniLmL6V2,
    /// sentence-transformers/all-MiniLM-L12-v2 (384 dimensions)
    #[serde(rename = "all-MiniLM-L12-v2")]
    AllMiniLmL12V2,
    /// BAAI/bge-small-en-v1.5 (384 dimensions)
    #[serde(rename = "bge-small-en-v1.5")]
    BgeSmallEnV15,
}

impl ModelKind {
    /// Short model name, also used as the cache fingerprint model id
    pub fn id(&self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            Self::AllMiniLmL12V2 => "all-MiniLM-L12-v2",
            Self::BgeSmallEnV15 => "bge-small-en-v1.5",
        }
    }

    fn fastembed_model(&self) -> EmbeddingModel {
        match self {
            Self::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            Self::AllMiniLmL12V2 => EmbeddingModel::AllMiniLML12V2,
            Self::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelKind {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => Ok(Self::AllMiniLmL6V2),
            "all-minilm-l12-v2" | "sentence-transformers/all-minilm-l12-v2" => {
                Ok(Self::AllMiniLmL12V2)
            }
            "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => Ok(Self::BgeSmallEnV15),
            other => Err(RetrievalError::model(format!(
                "unknown embedding model '{}'",
                other
            ))),
        }
    }
}

/// fastembed configuration
#[derive(Debug, Clone)]
pub struct FastEmbedConfig {
    /// Which pretrained model to load
    pub model: ModelKind,
    /// Models directory override (see [`find_models_dir`])
    pub models_dir: Option<PathBuf>,
    /// Maximum sequence length in tokens (default: 256)
    pub max_length: usize,
    /// Batch size for encoding (default: 64)
    pub batch_size: usize,
    /// Print a progress bar while downloading weights
    pub show_download_progress: bool,
}

impl Default for FastEmbedConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            models_dir: None,
            max_length: 256,
            batch_size: 64,
            show_download_progress: false,
        }
    }
}

/// fastembed model wrapper
///
/// The ONNX session sits behind a mutex so concurrent callers are serialized
/// rather than relying on the runtime being reentrant.
pub struct FastEmbedModel {
    model: Mutex<TextEmbedding>,
    config: FastEmbedConfig,
    dimension: usize,
}

impl FastEmbedModel {
    /// Load the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self> {
        Self::with_config(FastEmbedConfig::default())
    }

    /// Load a model with custom configuration
    pub fn with_config(config: FastEmbedConfig) -> Result<Self> {
        let models_dir = find_models_dir(config.models_dir.as_deref());

        log::info!(
            "Loading {} from: {}",
            config.model,
            models_dir.display()
        );

        let options = InitOptions::new(config.model.fastembed_model())
            .with_cache_dir(models_dir)
            .with_max_length(config.max_length)
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(options)
            .map_err(|e| RetrievalError::model(format!("Failed to load {}: {}", config.model, e)))?;

        // Get dimension by encoding test string
        let probe = model
            .embed(vec!["test"], None)
            .map_err(|e| RetrievalError::model(format!("Failed to encode test string: {}", e)))?;
        let dimension = probe
            .first()
            .map(Vec::len)
            .filter(|d| *d > 0)
            .ok_or_else(|| RetrievalError::model("model produced an empty probe vector"))?;

        log::info!(
            "Loaded {} ({}d, max {} tokens)",
            config.model,
            dimension,
            config.max_length
        );

        Ok(Self {
            model: Mutex::new(model),
            config,
            dimension,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &FastEmbedConfig {
        &self.config
    }
}

impl Embedder for FastEmbedModel {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let embeddings = self
            .model
            .lock()
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| RetrievalError::embedding(format!("Failed to encode texts: {}", e)))?;

        if embeddings.len() != texts.len() {
            return Err(RetrievalError::embedding(format!(
                "model returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        self.config.model.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parse() {
        assert_eq!(
            "all-MiniLM-L6-v2".parse::<ModelKind>().unwrap(),
            ModelKind::AllMiniLmL6V2
        );
        assert_eq!(
            "BAAI/bge-small-en-v1.5".parse::<ModelKind>().unwrap(),
            ModelKind::BgeSmallEnV15
        );
        assert!("gpt-3.5-turbo".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_model_kind_display_round_trips() {
        for kind in [
            ModelKind::AllMiniLmL6V2,
            ModelKind::AllMiniLmL12V2,
            ModelKind::BgeSmallEnV15,
        ] {
            assert_eq!(kind.to_string().parse::<ModelKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_config_default() {
        let config = FastEmbedConfig::default();
        assert_eq!(config.model, ModelKind::AllMiniLmL6V2);
        assert_eq!(config.max_length, 256);
        assert!(config.models_dir.is_none());
    }

    #[test]
    #[ignore = "downloads all-MiniLM-L6-v2 from HuggingFace"]
    fn test_load_default_model() {
        let model = FastEmbedModel::new().unwrap();
        assert_eq!(model.dimension(), 384);
        let vectors = model.embed_batch(&["alpha", "beta"]).unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 384));
    }
}
