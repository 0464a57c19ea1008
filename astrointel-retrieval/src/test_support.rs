//! Deterministic offline embedder for tests
//!
//! Maps each text to keyword counts over a fixed space-biology vocabulary.
//! Texts sharing no vocabulary have zero vectors and therefore zero similarity.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::embedding::Embedder;
use crate::error::Result;

const VOCABULARY: &[&str] = &[
    "coli",
    "bacillus",
    "microb",
    "microgravity",
    "mutation",
    "growth",
    "iss",
    "bacteri",
    "antibiotic",
    "gene",
    "lettuce",
    "radish",
    "wheat",
    "astronaut",
    "nutrition",
    "bone",
    "gravity",
    "exercise",
    "calcium",
    "medication",
    "extremophile",
    "spore",
    "vacuum",
    "radiation",
    "astrobiology",
    "life",
    "universe",
    "chemistry",
    "astronomy",
];

pub struct KeywordEmbedder {
    model_id: String,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::with_model_id("keyword-v1")
    }

    pub fn with_model_id(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of texts embedded so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; VOCABULARY.len()];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()) {
            for (i, stem) in VOCABULARY.iter().enumerate() {
                if token.starts_with(stem) {
                    vector[i] += 1.0;
                }
            }
        }
        vector
    }
}

impl Embedder for KeywordEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
