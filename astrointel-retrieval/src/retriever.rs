//! Context retriever
//!
//! Owns the knowledge base and its vector cache and answers "which passage,
//! if any, best matches this query". State is read-only after construction,
//! so a single instance can be shared across threads behind an `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{self, CacheStatus, VectorCache};
use crate::embedding::VectorEngine;
use crate::error::Result;
use crate::passage::{KnowledgeBase, Passage, PassageId};
use crate::search::{self, SearchConfig, DEFAULT_THRESHOLD};

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Default minimum similarity (default: 0.2)
    pub threshold: f32,
    /// Location of the `.npy` vector cache
    pub cache_path: PathBuf,
    /// Check the cache sidecar against model and passages before trusting it
    pub validate_cache: bool,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            cache_path: PathBuf::from("kb_embeddings.npy"),
            validate_cache: true,
        }
    }
}

/// A passage selected for a query
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPassage<'a> {
    /// Position in the knowledge base
    pub index: usize,
    pub passage: &'a Passage,
    /// Cosine similarity to the query
    pub score: f32,
}

impl RetrievedPassage<'_> {
    pub fn id(&self) -> PassageId {
        self.passage.id
    }

    pub fn text(&self) -> &str {
        &self.passage.text
    }
}

/// Semantic retriever over a fixed knowledge base
pub struct ContextRetriever {
    kb: KnowledgeBase,
    cache: VectorCache,
    engine: Arc<VectorEngine>,
    config: RetrieverConfig,
    cache_status: CacheStatus,
}

impl ContextRetriever {
    /// Load or build the vector cache and become ready
    pub fn new(kb: KnowledgeBase, engine: Arc<VectorEngine>, config: RetrieverConfig) -> Result<Self> {
        search::validate_threshold(config.threshold)?;

        log::info!(
            "Initializing context retriever ({} passages, cache: {})",
            kb.len(),
            config.cache_path.display()
        );

        let (cache, cache_status) =
            cache::load_or_build(&config.cache_path, &kb, &engine, config.validate_cache)?;

        log::info!("Context retriever ready ({:?})", cache_status);

        Ok(Self {
            kb,
            cache,
            engine,
            config,
            cache_status,
        })
    }

    /// Text of the best passage, or `None` when its score is below `threshold`
    pub fn retrieve_context(&self, query: &str, threshold: f32) -> Result<Option<&str>> {
        Ok(self.retrieve(query, threshold)?.map(|m| m.passage.text.as_str()))
    }

    /// Same as [`retrieve_context`](Self::retrieve_context) with the configured threshold
    pub fn retrieve_default(&self, query: &str) -> Result<Option<&str>> {
        self.retrieve_context(query, self.config.threshold)
    }

    /// Best passage with its score
    ///
    /// Ties resolve to the lowest knowledge base index.
    pub fn retrieve(&self, query: &str, threshold: f32) -> Result<Option<RetrievedPassage<'_>>> {
        search::validate_threshold(threshold)?;
        let scores = self.scores(query)?;

        let Some((index, score)) = search::best_match(&scores) else {
            return Ok(None);
        };

        if score < threshold {
            log::debug!(
                "No match for {:?}: best score {:.3} below {:.3}",
                query,
                score,
                threshold
            );
            return Ok(None);
        }

        log::debug!("Matched {:?} to passage index {} ({:.3})", query, index, score);
        Ok(self.matched(index, score))
    }

    /// Passages reaching the threshold, best first
    pub fn search(&self, query: &str, config: &SearchConfig) -> Result<Vec<RetrievedPassage<'_>>> {
        search::validate_threshold(config.threshold)?;
        let scores = self.scores(query)?;

        Ok(search::rank(&scores, config.threshold, config.limit)
            .into_iter()
            .filter_map(|(index, score)| self.matched(index, score))
            .collect())
    }

    /// Cosine similarity of the query to every passage, index-aligned
    pub fn scores(&self, query: &str) -> Result<Vec<f32>> {
        let query_vector = self.engine.embed(query)?;
        Ok(search::score_all(&query_vector, self.cache.vectors()))
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn engine(&self) -> &Arc<VectorEngine> {
        &self.engine
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn cache(&self) -> &VectorCache {
        &self.cache
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }

    fn matched(&self, index: usize, score: f32) -> Option<RetrievedPassage<'_>> {
        self.kb.get(index).map(|passage| RetrievedPassage {
            index,
            passage,
            score,
        })
    }
}
