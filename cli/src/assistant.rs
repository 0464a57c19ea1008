//! Question answering pipeline.
//!
//! Canned answers first, then semantic retrieval, then a fixed fallback.
//! Retrieval is CPU-bound and runs on tokio's blocking pool.

use std::sync::Arc;

use astrointel_retrieval::{ContextRetriever, SearchConfig};
use chrono::Datelike;
use serde::Serialize;

use crate::error::{CliError, CliResult};
use crate::faq::{self, FaqTopic};

/// Reply when neither a canned answer nor a passage fits.
pub const FALLBACK_ANSWER: &str =
    "I'm sorry, my knowledge base doesn't seem to contain a specific fact about that topic.";

/// Outcome of a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// Canned answer
    Direct { text: String },
    /// Retrieved knowledge base passage
    Context {
        passage_id: u32,
        text: String,
        score: f32,
    },
    /// Nothing relevant found
    NoMatch { text: String },
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Direct { text } | Answer::Context { text, .. } | Answer::NoMatch { text } => {
                text
            }
        }
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub passage_id: u32,
    pub score: f32,
    pub text: String,
}

/// Answers questions against a shared retriever.
pub struct Assistant {
    retriever: Arc<ContextRetriever>,
    threshold: f32,
}

impl Assistant {
    /// Create an assistant using the retriever's configured threshold.
    pub fn new(retriever: Arc<ContextRetriever>) -> Self {
        let threshold = retriever.config().threshold;
        Self {
            retriever,
            threshold,
        }
    }

    /// Answer a free-text question.
    pub async fn ask(&self, question: &str) -> CliResult<Answer> {
        let query = faq::normalize(question);
        if query.is_empty() {
            return Err(CliError::EmptyQuestion);
        }

        if let Some(topic) = FaqTopic::detect(&query) {
            tracing::debug!("Direct answer for {:?}: {:?}", query, topic);
            let year = chrono::Local::now().year();
            return Ok(Answer::Direct {
                text: topic.answer(year),
            });
        }

        let retriever = Arc::clone(&self.retriever);
        let threshold = self.threshold;
        let found = tokio::task::spawn_blocking(move || -> CliResult<Option<Hit>> {
            let found = retriever.retrieve(&query, threshold)?;
            Ok(found.map(|m| Hit {
                passage_id: m.id().0,
                score: m.score,
                text: m.text().to_string(),
            }))
        })
        .await??;

        Ok(match found {
            Some(hit) => {
                tracing::info!("Answered from passage {} ({:.3})", hit.passage_id, hit.score);
                Answer::Context {
                    passage_id: hit.passage_id,
                    text: hit.text,
                    score: hit.score,
                }
            }
            None => {
                tracing::info!("No passage above threshold {:.2}", threshold);
                Answer::NoMatch {
                    text: FALLBACK_ANSWER.to_string(),
                }
            }
        })
    }

    /// Ranked passages for a query.
    pub async fn search(&self, query: &str, limit: usize) -> CliResult<Vec<Hit>> {
        let query = faq::normalize(query);
        if query.is_empty() {
            return Err(CliError::EmptyQuestion);
        }

        let retriever = Arc::clone(&self.retriever);
        let config = SearchConfig {
            limit,
            threshold: self.threshold,
        };
        let hits = tokio::task::spawn_blocking(move || -> CliResult<Vec<Hit>> {
            Ok(retriever
                .search(&query, &config)?
                .into_iter()
                .map(|m| Hit {
                    passage_id: m.id().0,
                    score: m.score,
                    text: m.text().to_string(),
                })
                .collect())
        })
        .await??;

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrointel_retrieval::{
        Embedder, KnowledgeBase, Passage, RetrieverConfig, VectorEngine,
    };

    /// Counts of three marker words.
    struct MarkerEmbedder;

    impl Embedder for MarkerEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> astrointel_retrieval::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    ["bone", "wheat", "vacuum"]
                        .iter()
                        .map(|w| t.matches(w).count() as f32)
                        .collect()
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            "marker"
        }
    }

    fn assistant(dir: &tempfile::TempDir) -> Assistant {
        let kb = KnowledgeBase::new(vec![
            Passage::new(1, "Bone loss is countered with exercise."),
            Passage::new(2, "Dwarf wheat grows in orbit."),
            Passage::new(3, "Spores survive the vacuum of space."),
        ])
        .unwrap();
        let engine = Arc::new(VectorEngine::from_embedder(Arc::new(MarkerEmbedder)));
        let config = RetrieverConfig {
            cache_path: dir.path().join("kb_embeddings.npy"),
            ..RetrieverConfig::default()
        };
        Assistant::new(Arc::new(ContextRetriever::new(kb, engine, config).unwrap()))
    }

    #[tokio::test]
    async fn test_canned_answer_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let answer = assistant(&dir).ask("  Hello ").await.unwrap();
        assert_eq!(
            answer,
            Answer::Direct {
                text: "Hello! How can I help you with space biology today?".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_retrieved_context() {
        let dir = tempfile::tempdir().unwrap();
        let answer = assistant(&dir).ask("Can WHEAT grow in space?").await.unwrap();
        match answer {
            Answer::Context {
                passage_id, text, ..
            } => {
                assert_eq!(passage_id, 2);
                assert_eq!(text, "Dwarf wheat grows in orbit.");
            }
            other => panic!("Expected context answer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        let answer = assistant(&dir).ask("how do I bake bread").await.unwrap();
        assert_eq!(answer.text(), FALLBACK_ANSWER);
        assert!(matches!(answer, Answer::NoMatch { .. }));
    }

    #[tokio::test]
    async fn test_empty_question_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = assistant(&dir).ask("   ").await.unwrap_err();
        assert!(matches!(err, CliError::EmptyQuestion));
    }

    #[tokio::test]
    async fn test_search_returns_ranked_hits() {
        let dir = tempfile::tempdir().unwrap();
        let hits = assistant(&dir).search("bone bone wheat", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].passage_id, 1);
        assert_eq!(hits[1].passage_id, 2);
    }

    #[test]
    fn test_answer_serializes_with_kind_tag() {
        let json = serde_json::to_value(Answer::NoMatch {
            text: "x".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "no_match");
        assert_eq!(json["text"], "x");
    }
}
