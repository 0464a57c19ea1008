//! Runtime configuration and bootstrap.
//!
//! Every setting is a CLI flag with an environment fallback.

use std::path::PathBuf;
use std::sync::Arc;

use astrointel_retrieval::cache::metadata_path;
use astrointel_retrieval::search::validate_threshold;
use astrointel_retrieval::{
    ContextRetriever, FastEmbedConfig, KnowledgeBase, ModelKind, RetrieverConfig, VectorEngine,
    DEFAULT_THRESHOLD,
};
use clap::Args;

use crate::error::CliResult;

fn parse_model(s: &str) -> Result<ModelKind, String> {
    s.parse().map_err(|e: astrointel_retrieval::RetrievalError| e.to_string())
}

/// Retrieval settings shared by all subcommands.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Path of the .npy vector cache
    #[arg(
        long,
        global = true,
        env = "ASTROINTEL_CACHE_PATH",
        default_value = "kb_embeddings.npy"
    )]
    pub cache_path: PathBuf,

    /// Minimum cosine similarity for a passage to count as a match
    #[arg(
        long,
        global = true,
        env = "ASTROINTEL_THRESHOLD",
        default_value_t = DEFAULT_THRESHOLD
    )]
    pub threshold: f32,

    /// JSON file of `{"id": .., "context": ..}` passages (built-in set if omitted)
    #[arg(long, global = true, env = "ASTROINTEL_KNOWLEDGE_BASE")]
    pub knowledge_base: Option<PathBuf>,

    /// Sentence embedding model
    #[arg(
        long,
        global = true,
        env = "ASTROINTEL_MODEL",
        default_value = "all-MiniLM-L6-v2",
        value_parser = parse_model
    )]
    pub model: ModelKind,

    /// Directory for downloaded model weights
    #[arg(long, global = true, env = "ASTROINTEL_MODELS_PATH")]
    pub models_dir: Option<PathBuf>,

    /// Trust any existing cache file without checking its fingerprint
    #[arg(long, global = true)]
    pub no_cache_validation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("kb_embeddings.npy"),
            threshold: DEFAULT_THRESHOLD,
            knowledge_base: None,
            model: ModelKind::default(),
            models_dir: None,
            no_cache_validation: false,
        }
    }
}

impl Settings {
    /// Load the configured knowledge base.
    pub fn load_knowledge_base(&self) -> CliResult<KnowledgeBase> {
        match &self.knowledge_base {
            Some(path) => Ok(KnowledgeBase::from_json_file(path)?),
            None => Ok(KnowledgeBase::space_biology()),
        }
    }

    pub fn retriever_config(&self) -> RetrieverConfig {
        RetrieverConfig {
            threshold: self.threshold,
            cache_path: self.cache_path.clone(),
            validate_cache: !self.no_cache_validation,
        }
    }

    pub fn embed_config(&self) -> FastEmbedConfig {
        FastEmbedConfig {
            model: self.model,
            models_dir: self.models_dir.clone(),
            ..FastEmbedConfig::default()
        }
    }

    /// Remove the vector cache and its sidecar so the next start rebuilds them.
    pub fn clear_cache(&self) -> CliResult<()> {
        for path in [self.cache_path.clone(), metadata_path(&self.cache_path)] {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::info!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Load the model and knowledge base and build the retriever.
    ///
    /// Runs on the blocking pool: model loading and passage embedding are CPU-bound.
    pub async fn bootstrap(&self) -> CliResult<Arc<ContextRetriever>> {
        // Fail before the model load, not after
        validate_threshold(self.threshold)?;

        let settings = self.clone();
        let retriever = tokio::task::spawn_blocking(move || -> CliResult<ContextRetriever> {
            let kb = settings.load_knowledge_base()?;
            tracing::info!("Knowledge base: {} passages", kb.len());

            let engine = Arc::new(VectorEngine::new(settings.embed_config())?);
            let retriever = ContextRetriever::new(kb, engine, settings.retriever_config())?;
            tracing::info!("Vector cache {:?}", retriever.cache_status());
            Ok(retriever)
        })
        .await??;

        Ok(Arc::new(retriever))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use astrointel_retrieval::{PassageId, RetrievalError};
    use clap::Parser;
    use std::io::Write;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn test_flag_defaults_match_default() {
        let parsed = TestCli::try_parse_from(["astrointel"]).unwrap().settings;
        let default = Settings::default();
        assert_eq!(parsed.cache_path, default.cache_path);
        assert_eq!(parsed.threshold, default.threshold);
        assert_eq!(parsed.model, default.model);
        assert!(!parsed.no_cache_validation);
    }

    #[test]
    fn test_flags_override() {
        let parsed = TestCli::try_parse_from([
            "astrointel",
            "--threshold",
            "0.35",
            "--model",
            "bge-small-en-v1.5",
            "--no-cache-validation",
        ])
        .unwrap()
        .settings;
        assert_eq!(parsed.threshold, 0.35);
        assert_eq!(parsed.model, ModelKind::BgeSmallEnV15);

        let config = parsed.retriever_config();
        assert_eq!(config.threshold, 0.35);
        assert!(!config.validate_cache);
        assert_eq!(parsed.embed_config().model, ModelKind::BgeSmallEnV15);
    }

    #[derive(Parser)]
    struct TestCliWithCommand {
        #[command(flatten)]
        settings: Settings,

        #[command(subcommand)]
        command: TestCommand,
    }

    #[derive(clap::Subcommand)]
    enum TestCommand {
        Ask { question: Vec<String> },
    }

    #[test]
    fn test_flags_accepted_after_subcommand() {
        let parsed = TestCliWithCommand::try_parse_from([
            "astrointel",
            "ask",
            "--threshold",
            "0.3",
            "--no-cache-validation",
            "does microgravity affect bacteria",
        ])
        .unwrap();
        assert_eq!(parsed.settings.threshold, 0.3);
        assert!(parsed.settings.no_cache_validation);
        let TestCommand::Ask { question } = parsed.command;
        assert_eq!(question, vec!["does microgravity affect bacteria"]);
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_threshold_before_loading_model() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            threshold: 1.5,
            cache_path: dir.path().join("kb.npy"),
            // Loading from here would fail with a model error instead
            models_dir: Some(dir.path().join("no-models")),
            ..Settings::default()
        };

        match settings.bootstrap().await {
            Err(CliError::Retrieval(RetrievalError::InvalidThreshold(t))) => assert_eq!(t, 1.5),
            Err(other) => panic!("Expected InvalidThreshold, got {other}"),
            Ok(_) => panic!("Expected InvalidThreshold"),
        }
        assert!(!settings.cache_path.exists());
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!(TestCli::try_parse_from(["astrointel", "--model", "word2vec"]).is_err());
    }

    #[test]
    fn test_load_knowledge_base_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 42, "context": "Tardigrades survive vacuum."}}]"#).unwrap();

        let settings = Settings {
            knowledge_base: Some(file.path().to_path_buf()),
            ..Settings::default()
        };
        let kb = settings.load_knowledge_base().unwrap();
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.passages()[0].id, PassageId(42));

        assert_eq!(Settings::default().load_knowledge_base().unwrap().len(), 6);
    }

    #[test]
    fn test_clear_cache_removes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            cache_path: dir.path().join("kb.npy"),
            ..Settings::default()
        };
        std::fs::write(&settings.cache_path, b"x").unwrap();
        std::fs::write(metadata_path(&settings.cache_path), b"{}").unwrap();

        settings.clear_cache().unwrap();
        assert!(!settings.cache_path.exists());
        assert!(!metadata_path(&settings.cache_path).exists());

        // Missing files are fine
        settings.clear_cache().unwrap();
    }
}
